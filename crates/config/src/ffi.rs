//! C boundary for compositor hosts.
//!
//! The registry is passed explicitly as an opaque pointer; the library
//! keeps no process-global state. Strings returned by these functions are
//! owned by the caller and freed with [`skiff_str_free`]. Queries against
//! a token that was never minted, or that was already released, are
//! undefined: the boundary assumes a disciplined single caller.

use std::{
    ffi::{CStr, CString, c_char},
    path::PathBuf,
    ptr,
};

use tracing::warn;

use crate::{
    loader,
    registry::{HandleRegistry, HandleToken},
    snapshot::{ConfigSnapshot, release_snapshot},
};

/// Keyboard settings returned through [`skiff_keyboard_config`].
#[repr(C)]
pub struct KeyboardConfigOut {
    /// XKB layout name; caller-owned.
    pub layout: *mut c_char,
}

/// Copy an owned string into caller-owned C memory.
fn into_c_string(text: String) -> *mut c_char {
    // Diagnostics never contain NUL bytes.
    match CString::new(text) {
        Ok(text) => text.into_raw(),
        Err(_) => panic!("NUL byte in boundary string"),
    }
}

/// Create a registry for subsequent load and query calls.
#[unsafe(no_mangle)]
pub extern "C" fn skiff_registry_new() -> *mut HandleRegistry {
    Box::into_raw(Box::new(HandleRegistry::new()))
}

/// Destroy a registry created by [`skiff_registry_new`].
///
/// # Safety
///
/// `registry` must come from [`skiff_registry_new`] and must not be used
/// afterwards. Live handles die with the registry.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_registry_free(registry: *mut HandleRegistry) {
    if !registry.is_null() {
        drop(unsafe { Box::from_raw(registry) });
    }
}

/// Load the configuration at `path` (or the default location when `path`
/// is null) into `result`.
///
/// Returns null on success. On failure a caller-owned diagnostic string is
/// returned, `result` is untouched, and no token is minted.
///
/// # Safety
///
/// `registry` must be live. `path` must be null or a NUL-terminated
/// string. `result` must point to writable memory for one
/// [`ConfigSnapshot`]; on success it must later be passed to
/// [`skiff_config_free`] exactly once, and its token to
/// [`skiff_config_release`], and it must not be modified in between.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_config_load(
    registry: *mut HandleRegistry,
    path: *const c_char,
    result: *mut ConfigSnapshot,
) -> *mut c_char {
    let registry = unsafe { &mut *registry };
    let explicit = if path.is_null() {
        None
    } else {
        let text = unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned();
        Some(PathBuf::from(text))
    };
    let resolved = loader::resolve_config_path(explicit.as_deref());
    match loader::load_from_path(&resolved, registry) {
        Ok(snapshot) => {
            unsafe { result.write(snapshot) };
            ptr::null_mut()
        }
        Err(err) => into_c_string(err.pretty()),
    }
}

/// Ask the handle's keyboard selector about the device with `vendor` id.
///
/// Fills `result` and returns null on success; on failure returns a
/// caller-owned diagnostic string and leaves `result` untouched.
///
/// # Safety
///
/// `registry` must be live and `token` must name a handle it minted that
/// has not been released. `result` must point to writable memory for one
/// [`KeyboardConfigOut`]; its `layout` is freed with [`skiff_str_free`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_keyboard_config(
    registry: *const HandleRegistry,
    token: HandleToken,
    vendor: u32,
    result: *mut KeyboardConfigOut,
) -> *mut c_char {
    let registry = unsafe { &*registry };
    match registry.keyboard_config(token, vendor) {
        Ok(config) => match CString::new(config.layout) {
            Ok(layout) => {
                unsafe {
                    result.write(KeyboardConfigOut {
                        layout: layout.into_raw(),
                    });
                }
                ptr::null_mut()
            }
            Err(_) => into_c_string("keyboard layout contains a NUL byte".to_string()),
        },
        Err(err) => into_c_string(err.pretty()),
    }
}

/// Produce the command line that displays `message` to the user.
///
/// Returns a caller-owned string, or null when the callback fails; the
/// failure is logged.
///
/// # Safety
///
/// `registry` must be live and `token` must name a handle it minted that
/// has not been released. `message` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_error_display_cmd(
    registry: *const HandleRegistry,
    token: HandleToken,
    message: *const c_char,
) -> *mut c_char {
    let registry = unsafe { &*registry };
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    match registry.error_display_command(token, &message) {
        Ok(command) => match CString::new(command) {
            Ok(command) => command.into_raw(),
            Err(_) => {
                warn!(
                    target: "skiff_config::ffi",
                    "error display command contains a NUL byte"
                );
                ptr::null_mut()
            }
        },
        Err(err) => {
            warn!(target: "skiff_config::ffi", "{}", err.pretty());
            ptr::null_mut()
        }
    }
}

/// Free every allocation owned by a loaded snapshot.
///
/// The snapshot's token stays live until [`skiff_config_release`].
///
/// # Safety
///
/// `config` must come from a successful [`skiff_config_load`] and must not
/// be used, or freed again, afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_config_free(config: *mut ConfigSnapshot) {
    unsafe { release_snapshot(&mut *config) };
}

/// Drop the handle behind `token`.
///
/// # Safety
///
/// `registry` must be live. Releasing the same token twice, or querying it
/// afterwards, is undefined.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_config_release(registry: *mut HandleRegistry, token: HandleToken) {
    unsafe { &mut *registry }.release(token);
}

/// Resolve the autostart script location.
///
/// Returns a caller-owned string.
#[unsafe(no_mangle)]
pub extern "C" fn skiff_autostart_path() -> *mut c_char {
    into_c_string(loader::autostart_path().to_string_lossy().into_owned())
}

/// Free a string returned by any `skiff_*` call. Null is ignored.
///
/// # Safety
///
/// `text` must be null or an unfreed string returned by this library's
/// boundary functions.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn skiff_str_free(text: *mut c_char) {
    if !text.is_null() {
        drop(unsafe { CString::from_raw(text) });
    }
}
