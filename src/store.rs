//! Durable persistence for the sandbox auth token.
//!
//! One opaque token under one fixed key. Token presence is the sole
//! authentication predicate; nothing inside the token is interpreted.
//! The store is instantiated once at startup and passed by reference
//! into the navigation guard and the request pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::{debug, warn};

/// Name of the single durable slot holding the token.
pub const AUTH_STORAGE_KEY: &str = "sandbox_auth_key";

/// Opaque credential string proving the user is logged in.
///
/// No structure, expiry, or claims are interpreted from the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token value, as sent in the `x-auth` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

/// Synchronous key/value persistence for the auth token.
///
/// Only explicit login/logout actions mutate the slot; the guard and
/// the pipeline read it but never write.
pub trait TokenStore: Send + Sync {
    /// Read the current token.
    ///
    /// Returns `None` when no token is stored or when the storage medium
    /// cannot be read — an unreadable store means "not logged in", never
    /// an error to the caller.
    fn get(&self) -> Option<AuthToken>;

    /// Persist a token (login).
    ///
    /// # Errors
    ///
    /// Returns an error when the storage medium rejects the write.
    fn set(&self, token: &AuthToken) -> anyhow::Result<()>;

    /// Remove the token (logout). Clearing an absent token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage medium rejects the removal.
    fn clear(&self) -> anyhow::Result<()>;
}

/// File-backed token store rooted at the client home directory.
///
/// The token lives in a single private file named [`AUTH_STORAGE_KEY`];
/// absence of the file is equivalent to "unauthenticated".
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store keeping its token file under `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(AUTH_STORAGE_KEY),
        }
    }

    /// Path of the underlying token file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<AuthToken> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(AuthToken::new(token))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "token storage unreadable, treating as logged out"
                );
                None
            }
        }
    }

    fn set(&self, token: &AuthToken) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, token.as_str())
            .with_context(|| format!("failed to write token to {}", self.path.display()))?;
        enforce_private_file_permissions(&self.path)?;
        debug!(path = %self.path.display(), "auth token stored");
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "auth token cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::anyhow!(
                "failed to remove token at {}: {e}",
                self.path.display()
            )),
        }
    }
}

/// Ensure the token file has private permissions when supported.
///
/// # Errors
///
/// Returns an error if permissions cannot be updated.
fn enforce_private_file_permissions(path: &Path) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// In-memory token store, substitutable for [`FileTokenStore`] in tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(AuthToken::new(token))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AuthToken> {
        // A poisoned slot reads as "no token", matching the fail-safe
        // contract of the file store.
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn set(&self, token: &AuthToken) -> anyhow::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("token slot poisoned"))?;
        *slot = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("token slot poisoned"))?;
        *slot = None;
        Ok(())
    }
}
