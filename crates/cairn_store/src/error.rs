//! Error types shared by every storage provider.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

use crate::key::{Key, KeyDomain};

/// Result type for provider operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during provider operations.
///
/// Both backends surface the same taxonomy: absent keys, dangling
/// references, and absent aliases all report as [`StoreError::NotFound`],
/// misconfiguration reports as [`StoreError::Config`], and everything else
/// passes through from the underlying engine, codec, or file system
/// untranslated.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key, alias, or reference target is absent.
    ///
    /// When the condition originated inside the embedded engine, the engine's
    /// own error is preserved as the chained `source`.
    #[error("not found: {key}")]
    NotFound {
        /// Display form of the key that failed to resolve.
        key: String,
        /// The backend condition this was classified from, if any.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The provider configuration is invalid or incomplete.
    #[error("configuration error: {message}")]
    Config {
        /// Description of what is misconfigured.
        message: String,
    },

    /// A key of the wrong domain was handed to this provider.
    ///
    /// The key domain is fixed when the provider is constructed.
    #[error("key domain mismatch: provider holds {expected} keys, got {found}")]
    KeyDomain {
        /// The domain the provider was constructed with.
        expected: KeyDomain,
        /// The domain of the offending key.
        found: KeyDomain,
    },

    /// An I/O error from the snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization or parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Value encoding for the embedded engine failed.
    #[error("value encode error: {0}")]
    Encode(#[from] ciborium::ser::Error<io::Error>),

    /// Value decoding from the embedded engine failed.
    #[error("value decode error: {0}")]
    Decode(#[from] ciborium::de::Error<io::Error>),

    /// The embedded engine failed to open or create its database.
    #[error("engine open error: {0}")]
    EngineOpen(#[from] redb::DatabaseError),

    /// The embedded engine failed to begin a transaction.
    #[error("engine transaction error: {0}")]
    EngineTransaction(#[from] redb::TransactionError),

    /// The embedded engine failed to open a table.
    #[error("engine table error: {0}")]
    EngineTable(#[from] redb::TableError),

    /// The embedded engine failed during a read or write.
    #[error("engine storage error: {0}")]
    EngineStorage(#[from] redb::StorageError),

    /// The embedded engine failed to commit a transaction.
    #[error("engine commit error: {0}")]
    EngineCommit(#[from] redb::CommitError),
}

impl StoreError {
    /// Builds the unified not-found condition for `key`.
    pub fn not_found(key: &Key) -> Self {
        Self::NotFound {
            key: key.to_string(),
            source: None,
        }
    }

    /// Builds the unified not-found condition, preserving the backend
    /// condition it was classified from.
    pub fn not_found_with_source(
        key: &Key,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::NotFound {
            key: key.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is the unified not-found condition,
    /// regardless of which backend produced it.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
