//! Live configuration handles and the table that owns them.

use std::{collections::HashMap, fmt};

use crate::{
    callbacks::{ErrorDisplay, KeyboardConfig, KeyboardSelect},
    error::Error,
};

/// Opaque identity of one live configuration handle.
///
/// Tokens are minted by [`HandleRegistry::insert`] and stay valid until
/// explicitly released; callers hold only the token, never the callbacks.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleToken(u64);

impl fmt::Display for HandleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two callable handles kept alive for one loaded configuration.
struct HandleEntry {
    /// Per-device keyboard selector.
    keyboard: Box<dyn KeyboardSelect>,
    /// Error-display command formatter.
    error_display: Box<dyn ErrorDisplay>,
}

/// Table of live configuration handles.
///
/// Single-owner and unsynchronized: the host drives load, query, and
/// release from one control thread, and may keep several independent
/// registries if it wants isolated handle namespaces. Entries live until
/// explicitly released; there is no eviction and no capacity bound.
#[derive(Default)]
pub struct HandleRegistry {
    /// Last minted token value; tokens start at 1.
    next_token: u64,
    /// Live entries by token.
    entries: HashMap<HandleToken, HandleEntry>,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair of callable handles, minting a fresh token.
    pub fn insert(
        &mut self,
        keyboard: Box<dyn KeyboardSelect>,
        error_display: Box<dyn ErrorDisplay>,
    ) -> HandleToken {
        self.next_token += 1;
        let token = HandleToken(self.next_token);
        self.entries.insert(
            token,
            HandleEntry {
                keyboard,
                error_display,
            },
        );
        token
    }

    /// Resolve the keyboard configuration for a device vendor id.
    pub fn keyboard_config(
        &self,
        token: HandleToken,
        vendor: u32,
    ) -> Result<KeyboardConfig, Error> {
        self.entry(token)?.keyboard.keyboard_config(vendor)
    }

    /// Produce the command line that displays `message` to the user.
    pub fn error_display_command(
        &self,
        token: HandleToken,
        message: &str,
    ) -> Result<String, Error> {
        self.entry(token)?.error_display.display_command(message)
    }

    /// Drop the handle behind `token`; returns whether it was live.
    pub fn release(&mut self, token: HandleToken) -> bool {
        self.entries.remove(&token).is_some()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handles are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, token: HandleToken) -> Result<&HandleEntry, Error> {
        self.entries.get(&token).ok_or_else(|| Error::Callback {
            message: format!("no live configuration handle for token {}", token),
        })
    }
}
