//! Fixtures and cross-backend test helpers.

use cairn_store::{
    EngineConfig, EngineProvider, FileConfig, KeyDomain, KeyValueProvider,
    SnapshotProvider,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::TempDir;

/// A representative structured value for provider tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable user identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Whether the account is active.
    pub active: bool,
}

/// Builds a deterministic sample record for `id`.
#[must_use]
pub fn sample_user(id: u64) -> UserRecord {
    UserRecord {
        id,
        name: format!("user-{id}"),
        email: format!("user-{id}@example.test"),
        active: id % 2 == 0,
    }
}

/// Creates an in-memory engine provider for tests.
///
/// # Panics
///
/// Panics if the engine fails to open.
#[must_use]
pub fn engine_provider<V>(domain: KeyDomain) -> EngineProvider<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    EngineProvider::open(EngineConfig::in_memory(), domain)
        .expect("failed to open in-memory engine provider")
}

/// A snapshot provider over a temp file, with automatic cleanup.
pub struct TempSnapshot<V> {
    /// The provider under test.
    pub provider: SnapshotProvider<V>,
    /// Path of the backing file, for reopen scenarios.
    pub path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

/// Creates a snapshot provider over a fresh temp file with the given
/// extension (`"yaml"`, `"yml"`, or `"json"`).
///
/// # Panics
///
/// Panics if the temp directory or the provider cannot be created.
#[must_use]
pub fn snapshot_provider<V>(domain: KeyDomain, extension: &str) -> TempSnapshot<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    let temp_dir = TempDir::new().expect("failed to create temp directory");
    let path = temp_dir.path().join(format!("state.{extension}"));
    let provider = SnapshotProvider::open(
        FileConfig::at_path(path.to_string_lossy()),
        domain,
    )
    .expect("failed to open snapshot provider");

    TempSnapshot {
        provider,
        path,
        _temp_dir: temp_dir,
    }
}

/// Runs `test` once per backend: the in-memory engine, a YAML snapshot,
/// and a JSON snapshot. Each provider is shut down afterwards.
///
/// Contract tests written against this harness hold for every backend by
/// construction.
///
/// # Panics
///
/// Panics if a provider cannot be constructed or shut down.
pub fn each_provider<V>(domain: KeyDomain, test: impl Fn(&dyn KeyValueProvider<V>))
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let engine = engine_provider::<V>(domain);
    test(&engine);
    engine.shutdown().expect("engine shutdown failed");

    for extension in ["yaml", "json"] {
        let snapshot = snapshot_provider::<V>(domain, extension);
        test(&snapshot.provider);
        snapshot
            .provider
            .shutdown()
            .expect("snapshot shutdown failed");
    }
}
