//! Configuration loading for the skiff compositor.
//!
//! A configuration is a Rhai document evaluated together with an embedded
//! type vocabulary and a flattening pass, translated into a C-layout
//! snapshot, and registered under an opaque token for two later callback
//! queries: per-device keyboard layout and the error-display command.
//!
//! Snapshot memory and handle lifetime are independent and explicitly
//! released; [`LoadedConfig`] pairs them for hosts that want scoped
//! ownership, and [`ffi`] exposes the allocation-explicit C surface.
#![warn(unsafe_op_in_unsafe_fn)]

mod callbacks;
mod error;
pub mod ffi;
mod loader;
mod raw;
mod registry;
mod script;
mod signal;
mod snapshot;
mod translate;

#[cfg(test)]
mod test_ffi;
#[cfg(test)]
mod test_translate;

pub use callbacks::{ErrorDisplay, KeyboardConfig, KeyboardSelect};
pub use error::Error;
pub use loader::{
    LoadedConfig, SharedRegistry, autostart_path, default_config_path, load_from_path,
    load_from_str, resolve_config_path,
};
pub use registry::{HandleRegistry, HandleToken};
pub use script::TYPES_ENV_VAR;
pub use snapshot::{
    Action, ButtonAction, ButtonBinding, Color, ConfigSnapshot, KeyBinding, OutputConfig,
    release_snapshot, release_string,
};
