//! Desktop browser detection and launching.

use super::error::AuthError;

/// Opens URLs in the operator's browser.
pub trait BrowserLauncher: Send + Sync {
    /// Whether a desktop browser can be launched from this session.
    ///
    /// Probing never fails: any problem means "not available".
    fn is_available(&self) -> bool;

    fn open(&self, url: &str) -> Result<(), AuthError>;
}

/// Launches the platform's default browser.
///
/// On Linux and other Unix desktops a browser is assumed only when `xdg-open`
/// is on `PATH`; its absence usually means a headless or WSL session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn is_available(&self) -> bool {
        if cfg!(any(windows, target_os = "macos")) {
            return true;
        }
        match which::which("xdg-open") {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "found xdg-open");
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "xdg-open not found; assuming no desktop");
                false
            }
        }
    }

    fn open(&self, url: &str) -> Result<(), AuthError> {
        open::that(url)
            .map_err(|err| AuthError::Authorization(format!("cannot launch browser: {err}")))
    }
}
