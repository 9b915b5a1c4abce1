//! Error types for configuration loading, translation, and callbacks.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading a configuration or invoking its callbacks.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// Document compile error with a concrete location and excerpt.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number in the document.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("{message}")]
    /// Evaluation or typed-extraction error, optionally located.
    Validation {
        /// Optional path associated with the error.
        path: Option<PathBuf>,
        /// Optional 1-based line number in the document.
        line: Option<usize>,
        /// Optional 1-based column number.
        col: Option<usize>,
        /// Human-readable error message.
        message: String,
        /// Optional excerpt including a caret at the error location.
        excerpt: Option<String>,
    },
    #[error("{message}")]
    /// A document closure failed or returned the wrong shape at query time.
    Callback {
        /// Human-readable error message, already located and excerpted.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly message including location and an excerpt
    /// when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("read error at {}: {}", p.display(), message),
                None => format!("read error: {}", message),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => {
                let loc = match path {
                    Some(p) => format!("{}:{}:{}", p.display(), line, col),
                    None => format!("line {}, column {}", line, col),
                };
                format!("config parse error at {}\n{}\n{}", loc, message, excerpt)
            }
            Self::Validation {
                path,
                line,
                col,
                message,
                excerpt,
            } => {
                let loc = match (line, col) {
                    (Some(l), Some(c)) => format!("{}:{}", l, c),
                    (Some(l), None) => l.to_string(),
                    _ => String::new(),
                };
                let mut out = String::from("config error");
                if let Some(p) = path {
                    let _ignored = write!(out, " at {}", p.display());
                    if !loc.is_empty() {
                        let _ignored = write!(out, ":{}", loc);
                    }
                } else if !loc.is_empty() {
                    let _ignored = write!(out, " at {}", loc);
                }
                let _ignored = write!(out, "\n{}", message);
                if let Some(ex) = excerpt {
                    let _ignored = write!(out, "\n{}", ex);
                }
                out
            }
            Self::Callback { message } => message.clone(),
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
            Self::Callback { .. } => None,
        }
    }
}

/// Build a small 2–3 line excerpt with a caret at `(line_no, col_no)`.
pub(crate) fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}
