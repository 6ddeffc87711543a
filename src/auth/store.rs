use std::fs;
use std::path::{Path, PathBuf};

use super::credentials::UserCredentials;
use super::error::AuthError;

/// Storage abstraction for the single persisted user credential record.
pub trait CredentialStore: Send + Sync {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<UserCredentials, AuthError>;
    /// Replace the stored record entirely.
    fn save(&self, creds: &UserCredentials) -> Result<(), AuthError>;
}

/// JSON file-backed credential store.
///
/// No locking is performed: concurrent writers race and the last save wins.
///
/// # Example
/// ```no_run
/// use cloudshell::auth::{CredentialStore, FileCredentialStore, UserCredentials};
///
/// let store = FileCredentialStore::new("/tmp/user_credentials.json");
/// store.save(&UserCredentials::default())?;
/// # Ok::<(), cloudshell::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_error(&self, err: impl ToString) -> AuthError {
        AuthError::Write {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<UserCredentials, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotFound(self.path.clone()))
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        serde_json::from_str(&raw).map_err(|err| AuthError::InvalidFile {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn save(&self, creds: &UserCredentials) -> Result<(), AuthError> {
        tracing::debug!(path = %self.path.display(), "saving user credentials");
        Self::ensure_parent(&self.path).map_err(|err| self.write_error(err))?;
        let serialized = serde_json::to_string_pretty(creds).map_err(|err| self.write_error(err))?;
        fs::write(&self.path, serialized).map_err(|err| self.write_error(err))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|err| self.write_error(err))?;
        }
        Ok(())
    }
}
