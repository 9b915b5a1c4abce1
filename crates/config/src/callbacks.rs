//! Callable handles owned by the registry for the lifetime of a config.
//!
//! The document's two function-valued fields are stored behind these
//! interfaces so nothing outside the evaluator module needs to know how a
//! closure is represented or invoked.

use serde::Deserialize;

use crate::error::Error;

/// Keyboard settings chosen by the document for one input device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyboardConfig {
    /// XKB layout name.
    pub layout: String,
}

/// Per-device keyboard selection, resolved by the loaded document.
pub trait KeyboardSelect {
    /// Choose the keyboard configuration for the device with `vendor` id.
    fn keyboard_config(&self, vendor: u32) -> Result<KeyboardConfig, Error>;
}

/// Error-message presentation, resolved by the loaded document.
pub trait ErrorDisplay {
    /// Produce the command line that displays `message` to the user.
    fn display_command(&self, message: &str) -> Result<String, Error>;
}
