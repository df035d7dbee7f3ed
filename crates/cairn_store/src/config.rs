//! Backend configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the embedded engine backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory the engine keeps its database file in. Required unless
    /// `in_memory` is set.
    #[serde(default)]
    pub directory_path: Option<PathBuf>,

    /// Keep the whole database in memory, with no on-disk state.
    #[serde(default)]
    pub in_memory: bool,
}

impl EngineConfig {
    /// Configuration for a purely in-memory engine.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            directory_path: None,
            in_memory: true,
        }
    }

    /// Configuration for a durable engine rooted at `directory_path`.
    #[must_use]
    pub fn at_path(directory_path: impl Into<PathBuf>) -> Self {
        Self {
            directory_path: Some(directory_path.into()),
            in_memory: false,
        }
    }
}

/// Configuration for the snapshot file backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Path of the snapshot file. The extension selects the serialization
    /// format: `.json`, `.yaml`, or `.yml`.
    pub path: String,

    /// Inline snapshot content. When non-empty the provider parses this
    /// instead of the file at `path` and never writes to disk.
    #[serde(default)]
    pub content: String,
}

impl FileConfig {
    /// Configuration backed by the file at `path`.
    #[must_use]
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
        }
    }

    /// Configuration preloaded from inline content; disk writes disabled.
    #[must_use]
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            content: content.into(),
        }
    }
}

/// Top-level provider configuration.
///
/// At most one backend should be configured. When both are present the
/// engine backend wins; when neither is, selection fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValueConfig {
    /// Embedded engine backend configuration.
    #[serde(default)]
    pub engine: Option<EngineConfig>,

    /// Snapshot file backend configuration.
    #[serde(default)]
    pub file: Option<FileConfig>,
}
