//! Collaborator seams: persistence and the admin API
//!
//! The raw Quayfile text is the sole persisted artifact. Documents and
//! container views are always derived from it, never stored. Both traits
//! are synchronous and carry no engine state, so concurrent edit sessions
//! can each hold their own implementations.

use crate::error::{PushError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence collaborator: reads and writes the raw configuration blob.
pub trait ConfigStore {
    /// Read the current raw configuration text.
    fn load(&self) -> Result<String>;

    /// Replace the stored configuration text.
    fn store(&self, raw: &str) -> Result<()>;
}

/// Administrative-API collaborator: hands a serialized configuration to the
/// running server. The server may reject it post-hoc for semantic reasons
/// the structural validator cannot detect; that rejection surfaces as
/// [`PushError::Rejected`] with the server's message intact.
pub trait AdminGateway {
    fn push_config(&self, raw: &str) -> std::result::Result<(), PushError>;
}

/// File-backed [`ConfigStore`].
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn store(&self, raw: &str) -> Result<()> {
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
