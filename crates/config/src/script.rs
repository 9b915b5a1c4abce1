//! Evaluation of configuration documents with the embedded script engine.
//!
//! A document is composed with two embedded prelude fragments: the type
//! vocabulary and the flattening pass. The composed script is compiled and
//! evaluated once; the resulting value is flattened with `deunionize`, its
//! two closures are captured, and the engine plus AST are retained so the
//! closures stay callable for the lifetime of the handle.

use std::{
    env,
    path::{Path, PathBuf},
    rc::Rc,
};

use rhai::{
    AST, CallFnOptions, Dynamic, Engine, EvalAltResult, FnPtr, Map, Position, Scope,
    module_resolvers::FileModuleResolver, serde::from_dynamic,
};
use tracing::{debug, info};

use crate::{
    callbacks::{ErrorDisplay, KeyboardConfig, KeyboardSelect},
    error::{Error, excerpt_at},
    raw::RawConfig,
};

/// Embedded type vocabulary prepended to every document.
pub(crate) const TYPES_PRELUDE: &str = include_str!("prelude/types.rhai");

/// Embedded flattening pass prepended to every document.
pub(crate) const DEUNIONIZE_PRELUDE: &str = include_str!("prelude/deunionize.rhai");

/// Environment variable carrying the type vocabulary text while a document
/// runs.
///
/// Documents can read it through the `env` helper; it is a seam for the
/// evaluator, not a user-facing setting.
pub const TYPES_ENV_VAR: &str = "SKIFF_TYPES";

/// Composed-script lines occupied by the two prelude fragments. Both
/// fragments end with a newline, so the document starts on the next line.
fn prelude_lines() -> usize {
    TYPES_PRELUDE.lines().count() + DEUNIONIZE_PRELUDE.lines().count()
}

/// A document evaluated down to its deunionized value tree and closures.
pub(crate) struct EvaluatedDocument {
    /// Typed, flattened configuration values.
    pub(crate) raw: RawConfig,
    /// Per-device keyboard selector captured from the document.
    pub(crate) keyboard: Box<dyn KeyboardSelect>,
    /// Error-display formatter captured from the document.
    pub(crate) error_display: Box<dyn ErrorDisplay>,
}

/// Evaluate `source`, flatten it, and capture its callback closures.
///
/// `path` is used for diagnostics and as the root for `import`
/// resolution.
pub(crate) fn evaluate(source: &str, path: Option<&Path>) -> Result<EvaluatedDocument, Error> {
    let mut engine = Engine::new();
    configure_engine(&mut engine, path);

    let composed = format!("{}{}{}", TYPES_PRELUDE, DEUNIONIZE_PRELUDE, source);

    // The type vocabulary is visible to the document while it runs.
    // SAFETY: loads run on the host's single control thread.
    unsafe { env::set_var(TYPES_ENV_VAR, TYPES_PRELUDE) };
    let evaluated = run_document(&engine, &composed, source, path);
    unsafe { env::remove_var(TYPES_ENV_VAR) };
    let (ast, mut flat) = evaluated?;

    let keyboard_fn = take_closure(&mut flat, "configure_keyboard", path)?;
    let display_fn = take_closure(&mut flat, "error_display", path)?;

    let raw: RawConfig =
        from_dynamic(&Dynamic::from_map(flat)).map_err(|err| eval_error(source, &err, path))?;
    raw.validate(path)?;

    debug!(
        target: "skiff_config::script",
        key_bindings = raw.key_bindings.len(),
        button_bindings = raw.button_bindings.len(),
        outputs = raw.outputs.len(),
        "document evaluated"
    );

    let runtime = Rc::new(ScriptRuntime {
        engine,
        ast,
        source: source.to_string(),
        path: path.map(Path::to_path_buf),
    });
    Ok(EvaluatedDocument {
        raw,
        keyboard: Box::new(ScriptKeyboardSelect {
            runtime: runtime.clone(),
            f: keyboard_fn,
        }),
        error_display: Box::new(ScriptErrorDisplay {
            runtime,
            f: display_fn,
        }),
    })
}

/// Compile the composed script, evaluate the document, and flatten it.
fn run_document(
    engine: &Engine,
    composed: &str,
    source: &str,
    path: Option<&Path>,
) -> Result<(AST, Map), Error> {
    let ast = engine.compile(composed).map_err(|err| {
        let err: EvalAltResult = err.into();
        parse_error(source, &err, path)
    })?;

    let mut scope = Scope::new();
    let value = engine
        .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
        .map_err(|err| eval_error(source, &err, path))?;

    // Global statements already ran; only the flattening function is
    // called here.
    let options = CallFnOptions::new().eval_ast(false);
    let flat = engine
        .call_fn_with_options::<Dynamic>(options, &mut scope, &ast, "deunionize", (value,))
        .map_err(|err| eval_error(source, &err, path))?;

    let map = flat.try_cast::<Map>().ok_or_else(|| Error::Validation {
        path: path.map(Path::to_path_buf),
        line: None,
        col: None,
        message: "configuration document must evaluate to a config record".to_string(),
        excerpt: None,
    })?;
    Ok((ast, map))
}

/// Configure the engine for document evaluation.
fn configure_engine(engine: &mut Engine, path: Option<&Path>) {
    engine.on_print(|text| info!(target: "skiff_config::script", "{}", text));
    engine.on_debug(|text, src, pos| {
        debug!(target: "skiff_config::script", "{} @ {:?}:{:?}", text, src, pos);
    });

    if let Some(dir) = path.and_then(Path::parent) {
        engine.set_module_resolver(FileModuleResolver::new_with_path(dir.to_path_buf()));
    }

    // Documents may read the published type vocabulary and other variables.
    engine.register_fn("env", |name: &str| -> String {
        env::var(name).unwrap_or_default()
    });

    // Depth limits guard the stack; evaluation time is deliberately
    // unbounded, a load either completes or the caller waits.
    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(128, 64);
}

/// Remove a closure-valued field from the flattened record.
fn take_closure(map: &mut Map, name: &str, path: Option<&Path>) -> Result<FnPtr, Error> {
    map.remove(name)
        .and_then(|value| value.try_cast::<FnPtr>())
        .ok_or_else(|| Error::Validation {
            path: path.map(Path::to_path_buf),
            line: None,
            col: None,
            message: format!("`{}` must be a function", name),
            excerpt: None,
        })
}

/// Convert a compile failure into a parse diagnostic with document
/// coordinates.
fn parse_error(source: &str, err: &EvalAltResult, path: Option<&Path>) -> Error {
    let (line, col) = document_position(err.position()).unwrap_or((1, 1));
    Error::Parse {
        path: path.map(Path::to_path_buf),
        line,
        col,
        message: err.to_string(),
        excerpt: excerpt_at(source, line, col),
    }
}

/// Convert an evaluation or extraction failure into a validation
/// diagnostic with document coordinates when available.
fn eval_error(source: &str, err: &EvalAltResult, path: Option<&Path>) -> Error {
    let (line, col, excerpt) = match document_position(err.position()) {
        Some((line, col)) => (Some(line), Some(col), Some(excerpt_at(source, line, col))),
        None => (None, None, None),
    };
    Error::Validation {
        path: path.map(Path::to_path_buf),
        line,
        col,
        message: err.to_string(),
        excerpt,
    }
}

/// Map a composed-script position back to document coordinates.
///
/// Returns `None` for unknown positions and for positions inside the
/// embedded preludes.
fn document_position(pos: Position) -> Option<(usize, usize)> {
    let line = pos.line()?;
    let col = pos.position().unwrap_or(1);
    let line = line.checked_sub(prelude_lines())?;
    if line == 0 {
        return None;
    }
    Some((line, col.max(1)))
}

/// Retained evaluator state that keeps document closures callable after
/// the load returns.
pub(crate) struct ScriptRuntime {
    /// Engine the document was evaluated with.
    engine: Engine,
    /// Composed AST containing the document's closures.
    ast: AST,
    /// Document source, for rendering failure excerpts.
    source: String,
    /// Document path, for failure messages.
    path: Option<PathBuf>,
}

impl ScriptRuntime {
    /// Invoke a captured closure.
    fn call(&self, fn_ptr: &FnPtr, args: impl rhai::FuncArgs) -> Result<Dynamic, Error> {
        fn_ptr
            .call::<Dynamic>(&self.engine, &self.ast, args)
            .map_err(|err| Error::Callback {
                message: self.describe(&err),
            })
    }

    /// Format a closure failure with document coordinates and an excerpt
    /// when available.
    fn describe(&self, err: &EvalAltResult) -> String {
        let loc = document_position(err.position());
        let message = match (&self.path, loc) {
            (Some(path), Some((line, col))) => format!(
                "config callback error at {}:{}:{}\n{}",
                path.display(),
                line,
                col,
                err
            ),
            (Some(path), None) => {
                format!("config callback error in {}\n{}", path.display(), err)
            }
            (None, Some((line, col))) => format!(
                "config callback error at line {}, column {}\n{}",
                line, col, err
            ),
            (None, None) => format!("config callback error\n{}", err),
        };
        match loc {
            Some((line, col)) => format!("{}\n{}", message, excerpt_at(&self.source, line, col)),
            None => message,
        }
    }
}

/// Keyboard selection backed by a document closure.
pub(crate) struct ScriptKeyboardSelect {
    /// Shared evaluator state.
    runtime: Rc<ScriptRuntime>,
    /// The `configure_keyboard` closure.
    f: FnPtr,
}

impl KeyboardSelect for ScriptKeyboardSelect {
    fn keyboard_config(&self, vendor: u32) -> Result<KeyboardConfig, Error> {
        let result = self.runtime.call(&self.f, (vendor as i64,))?;
        from_dynamic::<KeyboardConfig>(&result).map_err(|err| Error::Callback {
            message: format!("keyboard selector returned an invalid record: {}", err),
        })
    }
}

/// Error-display formatting backed by a document closure.
pub(crate) struct ScriptErrorDisplay {
    /// Shared evaluator state.
    runtime: Rc<ScriptRuntime>,
    /// The `error_display` closure.
    f: FnPtr,
}

impl ErrorDisplay for ScriptErrorDisplay {
    fn display_command(&self, message: &str) -> Result<String, Error> {
        let result = self.runtime.call(&self.f, (message.to_string(),))?;
        result
            .into_immutable_string()
            .map(|command| command.to_string())
            .map_err(|actual| Error::Callback {
                message: format!(
                    "error display formatter must return a string, got {}",
                    actual
                ),
            })
    }
}
