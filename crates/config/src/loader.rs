//! Load configuration documents and manage snapshot and handle lifetime.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::debug;

use crate::{
    callbacks::KeyboardConfig,
    error::Error,
    registry::{HandleRegistry, HandleToken},
    script, signal,
    snapshot::{ConfigSnapshot, release_snapshot},
    translate,
};

/// Registry shared between a host and the [`LoadedConfig`] guards it
/// loads. Single-threaded, like the registry itself.
pub type SharedRegistry = Rc<RefCell<HandleRegistry>>;

/// Preferred user config path (`<config dir>/skiff/config.rhai`).
///
/// Aborts when no user configuration directory exists; a host without one
/// is not a supported environment.
pub fn default_config_path() -> PathBuf {
    config_base().join("config.rhai")
}

/// Location of the autostart script (`<config dir>/skiff/autostart`).
///
/// Pure path computation; the file may or may not exist.
pub fn autostart_path() -> PathBuf {
    config_base().join("autostart")
}

fn config_base() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("skiff"),
        None => panic!("no user configuration directory available"),
    }
}

/// Resolve the effective config path: `explicit` when given, the default
/// location otherwise.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_config_path, Path::to_path_buf)
}

/// Load, flatten, and translate the document at `path`.
///
/// On success the returned snapshot owns foreign memory: pair it with
/// [`release_snapshot`], and release its token through the registry. On
/// failure nothing was allocated and the registry is untouched.
pub fn load_from_path(path: &Path, registry: &mut HandleRegistry) -> Result<ConfigSnapshot, Error> {
    signal::ignore_sigusr1();
    debug!(target: "skiff_config::loader", path = %path.display(), "loading configuration");
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let document = script::evaluate(&source, Some(path))?;
    Ok(translate::translate(document, registry))
}

/// Load a document from an in-memory string.
///
/// `path` is used for diagnostics and for resolving `import` statements.
pub fn load_from_str(
    source: &str,
    path: Option<&Path>,
    registry: &mut HandleRegistry,
) -> Result<ConfigSnapshot, Error> {
    signal::ignore_sigusr1();
    let document = script::evaluate(source, path)?;
    Ok(translate::translate(document, registry))
}

/// A loaded configuration whose snapshot and handle release together.
///
/// The core API keeps snapshot memory and handle lifetime independent;
/// this guard pairs them for hosts that want scoped ownership. Dropping
/// the guard frees the snapshot and evicts the handle.
pub struct LoadedConfig {
    /// The translated snapshot, owned by the guard.
    snapshot: ConfigSnapshot,
    /// Registry holding the snapshot's handle.
    registry: SharedRegistry,
}

impl LoadedConfig {
    /// Load from `path` (or the default location) into `registry`.
    pub fn load(path: Option<&Path>, registry: &SharedRegistry) -> Result<Self, Error> {
        let resolved = resolve_config_path(path);
        let snapshot = load_from_path(&resolved, &mut registry.borrow_mut())?;
        Ok(Self {
            snapshot,
            registry: registry.clone(),
        })
    }

    /// Load from an in-memory document.
    pub fn from_str_in(
        source: &str,
        path: Option<&Path>,
        registry: &SharedRegistry,
    ) -> Result<Self, Error> {
        let snapshot = load_from_str(source, path, &mut registry.borrow_mut())?;
        Ok(Self {
            snapshot,
            registry: registry.clone(),
        })
    }

    /// The translated snapshot.
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Token of the live handle behind this configuration.
    pub fn token(&self) -> HandleToken {
        self.snapshot.token
    }

    /// Query the per-device keyboard selector.
    pub fn keyboard_config(&self, vendor: u32) -> Result<KeyboardConfig, Error> {
        self.registry.borrow().keyboard_config(self.token(), vendor)
    }

    /// Query the error-display formatter.
    pub fn error_display_command(&self, message: &str) -> Result<String, Error> {
        self.registry
            .borrow()
            .error_display_command(self.token(), message)
    }
}

impl Drop for LoadedConfig {
    fn drop(&mut self) {
        let token = self.snapshot.token;
        // SAFETY: the guard owns the snapshot and drops exactly once.
        unsafe { release_snapshot(&mut self.snapshot) };
        self.registry.borrow_mut().release(token);
    }
}
