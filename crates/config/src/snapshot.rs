//! Foreign-memory-compatible configuration snapshot.
//!
//! Every pointer carried by these records is allocated by the translator
//! and owned by the snapshot until [`release_snapshot`]. The registry
//! handle named by [`ConfigSnapshot::token`] has its own, independent
//! lifetime and is released through the registry.

use std::{
    ffi::{CString, c_char},
    slice,
};

use serde::Deserialize;

use crate::registry::HandleToken;

/// An RGBA color, one byte per channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Position, scale, and identity of one configured output.
#[repr(C)]
#[derive(Debug)]
pub struct OutputConfig {
    /// Output name as reported by the backend; owned by the snapshot.
    pub name: *mut c_char,
    /// Horizontal position in layout coordinates.
    pub x: i32,
    /// Vertical position in layout coordinates.
    pub y: i32,
    /// Output scale factor.
    pub scale: f32,
}

/// The resolved action of a key binding: one tag plus its payload,
/// decided once during translation.
///
/// Text payloads are owned by the snapshot. Index payloads are never
/// zero; a binding cannot address output 0 or virtual terminal 0.
#[repr(C)]
#[derive(Debug)]
pub enum Action {
    /// Spawn a command through the shell.
    Execute(*mut c_char),
    /// Move the focused window to the named workspace.
    MoveTo(*mut c_char),
    /// Move the focused window to the n-th output.
    MoveToOutput(u8),
    /// Show the named workspace on the focused output.
    View(*mut c_char),
    /// Close the focused window.
    Close,
    /// Reload the configuration.
    ConfigReload,
    /// Move focus down the window stack.
    FocusDown,
    /// Move focus up the window stack.
    FocusUp,
    /// Focus the primary window.
    FocusPrimary,
    /// Focus the n-th output.
    FocusOutput(u8),
    /// Advance to the next layout.
    NextLayout,
    /// Sink a floating window back into the tiling order.
    Sink,
    /// Swap the focused window with its lower neighbor.
    SwapDown,
    /// Swap the focused window with its upper neighbor.
    SwapUp,
    /// Swap the focused window with the primary window.
    SwapPrimary,
    /// Swap the workspaces shown on the current and previous outputs.
    SwapWorkspaces,
    /// Switch to the n-th virtual terminal.
    SwitchVt(u8),
}

impl Action {
    /// Free any text carried by the payload.
    pub(crate) unsafe fn release(&mut self) {
        match self {
            Self::Execute(text) | Self::MoveTo(text) | Self::View(text) => unsafe {
                release_string(*text);
            },
            _ => {}
        }
    }
}

/// The resolved action of a pointer button binding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Interactively move the window under the cursor.
    Move,
    /// Interactively resize the window under the cursor.
    Resize,
}

/// One keyboard shortcut and its resolved action.
#[repr(C)]
#[derive(Debug)]
pub struct KeyBinding {
    /// Resolved action.
    pub action: Action,
    /// Modifier mask, matching `wlr_keyboard_modifier`.
    pub mods: u32,
    /// Raw key code; zero when `sym` names the key instead.
    pub code: u32,
    /// Symbolic key name, or null when `code` is set; owned by the snapshot.
    pub sym: *mut c_char,
}

/// One pointer button binding and its resolved action.
#[repr(C)]
#[derive(Debug)]
pub struct ButtonBinding {
    /// Resolved action.
    pub action: ButtonAction,
    /// Modifier mask, matching `wlr_keyboard_modifier`.
    pub mods: u32,
    /// Button code, matching the evdev `BTN_*` values.
    pub button: u32,
}

/// Flattened, caller-owned copy of one loaded configuration.
#[repr(C)]
#[derive(Debug)]
pub struct ConfigSnapshot {
    /// Registry token for callback queries; released independently of the
    /// snapshot memory.
    pub token: HandleToken,
    /// Window border width in pixels.
    pub border_width: u32,
    /// Border color of the focused window.
    pub active_border_color: Color,
    /// Border color of unfocused windows.
    pub inactive_border_color: Color,
    /// Key bindings; exactly `number_of_key_bindings` entries.
    pub key_bindings: *mut KeyBinding,
    /// Number of entries behind `key_bindings`.
    pub number_of_key_bindings: usize,
    /// Pointer button bindings; exactly `number_of_button_bindings` entries.
    pub button_bindings: *mut ButtonBinding,
    /// Number of entries behind `button_bindings`.
    pub number_of_button_bindings: usize,
    /// Output layout records; exactly `number_of_outputs` entries.
    pub outputs: *mut OutputConfig,
    /// Number of entries behind `outputs`.
    pub number_of_outputs: usize,
}


/// Copy `value` into a caller-owned C string.
///
/// Interior NUL bytes are rejected during raw validation; one reaching
/// this point means the snapshot would be built from unvalidated input.
pub(crate) fn c_string(value: &str) -> *mut c_char {
    #[cfg(test)]
    tally::STRINGS.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    match CString::new(value) {
        Ok(text) => text.into_raw(),
        Err(_) => panic!("interior NUL byte in configuration text"),
    }
}

/// Move a vector into a caller-owned array, returning pointer and length.
///
/// The allocation is sized exactly to the element count.
pub(crate) fn vec_into_raw<T>(values: Vec<T>) -> (*mut T, usize) {
    #[cfg(test)]
    tally::SLICES.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let boxed = values.into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed) as *mut T, len)
}

/// Free a string allocated for a snapshot. Null is ignored.
///
/// # Safety
///
/// `text` must be null or an unfreed pointer obtained from this crate's
/// snapshot allocations.
pub unsafe fn release_string(text: *mut c_char) {
    if text.is_null() {
        return;
    }
    #[cfg(test)]
    tally::STRINGS.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    drop(unsafe { CString::from_raw(text) });
}

/// Reclaim an array previously produced by [`vec_into_raw`].
unsafe fn take_slice<T>(ptr: *mut T, len: usize) -> Box<[T]> {
    #[cfg(test)]
    tally::SLICES.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    unsafe { Box::from_raw(slice::from_raw_parts_mut(ptr, len)) }
}

/// Free every text and array allocation owned by `snapshot`.
///
/// The registry entry named by `snapshot.token` is not touched; release it
/// separately through the registry. The snapshot's token may therefore
/// still be used for callback queries after this call.
///
/// # Safety
///
/// `snapshot` must come from a successful load and must not have been
/// released before; every pointer inside it is invalid afterwards.
pub unsafe fn release_snapshot(snapshot: &mut ConfigSnapshot) {
    unsafe {
        for binding in &mut *take_slice(snapshot.key_bindings, snapshot.number_of_key_bindings) {
            binding.action.release();
            release_string(binding.sym);
        }
        drop(take_slice(
            snapshot.button_bindings,
            snapshot.number_of_button_bindings,
        ));
        for output in &mut *take_slice(snapshot.outputs, snapshot.number_of_outputs) {
            release_string(output.name);
        }
    }
}
