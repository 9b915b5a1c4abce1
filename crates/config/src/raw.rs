//! Deunionized configuration values extracted from an evaluated document.
//!
//! These are the serde targets for `from_dynamic`. The document's two
//! function-valued fields are captured separately by the evaluator module
//! before extraction, so they never appear here.

use std::path::Path;

use serde::Deserialize;

use crate::{error::Error, snapshot::Color};

/// Flattened key binding action: one field per alternative.
///
/// The flattening pass sets exactly one of them; a zero index field means
/// that alternative is absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawAction {
    pub execute: Option<String>,
    pub close: bool,
    pub config_reload: bool,
    pub focus_down: bool,
    pub focus_up: bool,
    pub focus_primary: bool,
    pub focus_output: u8,
    pub sink: bool,
    pub swap_down: bool,
    pub swap_up: bool,
    pub swap_primary: bool,
    pub swap_workspaces: bool,
    pub next_layout: bool,
    pub move_to: Option<String>,
    pub move_to_output: u8,
    pub switch_vt: u8,
    pub view: Option<String>,
}

/// Either a raw key code or a symbolic key name.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawKey {
    pub code: u32,
    pub sym: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawKeyBinding {
    pub mods: u32,
    pub key: RawKey,
    pub action: RawAction,
}

/// Flattened button action: one field per alternative.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawButtonAction {
    #[serde(rename = "move")]
    pub move_window: bool,
    pub resize: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawButtonBinding {
    pub mods: u32,
    pub button: u32,
    pub action: RawButtonAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawOutput {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub scale: f32,
}

/// The whole deunionized value tree of one document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    pub border_width: u32,
    pub active_border_color: Color,
    pub inactive_border_color: Color,
    pub outputs: Vec<RawOutput>,
    pub button_bindings: Vec<RawButtonBinding>,
    pub key_bindings: Vec<RawKeyBinding>,
}

impl RawConfig {
    /// Reject text that cannot cross the C boundary.
    pub(crate) fn validate(&self, path: Option<&Path>) -> Result<(), Error> {
        for output in &self.outputs {
            ensure_c_safe(&output.name, "output name", path)?;
        }
        for binding in &self.key_bindings {
            if let Some(sym) = &binding.key.sym {
                ensure_c_safe(sym, "key symbol", path)?;
            }
            let action = &binding.action;
            for text in [&action.execute, &action.move_to, &action.view] {
                if let Some(text) = text {
                    ensure_c_safe(text, "action target", path)?;
                }
            }
        }
        Ok(())
    }
}

fn ensure_c_safe(text: &str, what: &str, path: Option<&Path>) -> Result<(), Error> {
    if text.contains('\0') {
        return Err(Error::Validation {
            path: path.map(Path::to_path_buf),
            line: None,
            col: None,
            message: format!("{} must not contain a NUL byte", what),
            excerpt: None,
        });
    }
    Ok(())
}
