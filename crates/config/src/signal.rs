//! One-time process signal adjustment.

/// Ignore SIGUSR1 once per process.
///
/// Xwayland raises SIGUSR1 towards its parent to report readiness; the
/// inherited default disposition would terminate the compositor.
#[cfg(unix)]
pub(crate) fn ignore_sigusr1() {
    use std::sync::Once;

    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        // SAFETY: SIG_IGN installs no handler code and the adjustment runs
        // once, before any query traffic.
        unsafe {
            libc::signal(libc::SIGUSR1, libc::SIG_IGN);
        }
    });
}

#[cfg(not(unix))]
pub(crate) fn ignore_sigusr1() {}
