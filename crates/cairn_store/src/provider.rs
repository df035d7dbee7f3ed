//! The backend-agnostic provider contract and backend selection.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::KeyValueConfig;
use crate::engine::EngineProvider;
use crate::error::{StoreError, StoreResult};
use crate::key::{Key, KeyDomain};
use crate::snapshot::SnapshotProvider;

/// A backend-agnostic key-value provider.
///
/// Implementations persist entries of `(Key, V)` plus a separate set of
/// references: single-hop aliases that resolve to a primary key. All
/// failure classification is uniform across backends - an absent key, an
/// absent alias, and a dangling reference all report
/// [`StoreError::NotFound`].
///
/// # Invariants
///
/// - `store` and `store_reference` silently overwrite (last write wins).
/// - References are never resolved transitively and may dangle; deleting an
///   entry does not delete references pointing at it.
/// - `for_each` visits every entry exactly once, in backend-defined order.
/// - No operation spans more than one backend transaction; sequences of
///   calls observe no cross-call atomicity.
///
/// # Implementors
///
/// - [`EngineProvider`] - durable embedded ordered-key engine
/// - [`SnapshotProvider`] - in-memory maps flushed wholesale to a file
pub trait KeyValueProvider<V>: Send + Sync {
    /// Prepares backend resources. Safe to call again before first use.
    fn setup(&self) -> StoreResult<()>;

    /// Releases backend resources and/or performs a final flush.
    fn shutdown(&self) -> StoreResult<()>;

    /// Inserts or silently overwrites the entry for `key`.
    fn store(&self, key: Key, value: V) -> StoreResult<()>;

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the key is absent.
    fn get(&self, key: &Key) -> StoreResult<V>;

    /// Deletes the entry for `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the key is absent.
    fn remove(&self, key: &Key) -> StoreResult<()>;

    /// Visits every entry once. A visitor returning `false` halts the scan
    /// immediately; early termination is not an error.
    ///
    /// The visitor must not call back into the provider.
    fn for_each(&self, visit: &mut dyn FnMut(Key, V) -> bool) -> StoreResult<()>;

    /// Returns the values for `keys`, in the same order.
    ///
    /// Lookups are sequential and independent; concurrent mutation between
    /// two keys of the same call is observable.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if any key is absent; no partial result is
    /// returned.
    fn get_multiple(&self, keys: &[Key]) -> StoreResult<Vec<V>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Stores alias -> target, silently overwriting an existing alias.
    /// `key` is not required to exist; dangling references are valid state.
    fn store_reference(&self, reference: Key, key: Key) -> StoreResult<()>;

    /// Deletes the alias `reference`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the alias is absent.
    fn remove_reference(&self, reference: &Key) -> StoreResult<()>;

    /// Resolves `reference` to its target key, then the target to a value.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the alias is absent, or if the alias
    /// exists but its target key does not. Both legs report identically.
    fn get_by_reference(&self, reference: &Key) -> StoreResult<V>;
}

/// Instantiates the provider selected by `config`.
///
/// The engine backend takes priority when both backends are configured;
/// this tie-break is deliberate but logged.
///
/// # Errors
///
/// [`StoreError::Config`] if no backend is configured, and any error the
/// selected backend's constructor reports.
pub fn provider_from_config<V>(
    config: KeyValueConfig,
    domain: KeyDomain,
) -> StoreResult<Box<dyn KeyValueProvider<V>>>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    match (config.engine, config.file) {
        (Some(engine), file) => {
            if file.is_some() {
                tracing::warn!(
                    "both engine and file backends configured; selecting the engine backend"
                );
            }
            Ok(Box::new(EngineProvider::open(engine, domain)?))
        }
        (None, Some(file)) => Ok(Box::new(SnapshotProvider::open(file, domain)?)),
        (None, None) => Err(StoreError::config("storage provider is not configured")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, FileConfig};

    #[test]
    fn no_backend_configured_fails() {
        let result = provider_from_config::<String>(KeyValueConfig::default(), KeyDomain::Text);
        assert!(matches!(result, Err(StoreError::Config { .. })));
    }

    #[test]
    fn engine_selected_when_configured() {
        let provider = provider_from_config::<String>(
            KeyValueConfig {
                engine: Some(EngineConfig::in_memory()),
                file: None,
            },
            KeyDomain::Text,
        )
        .unwrap();

        provider.store(Key::from("k"), "v".to_owned()).unwrap();
        assert_eq!(provider.get(&Key::from("k")).unwrap(), "v");
    }

    #[test]
    fn engine_wins_when_both_configured() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("state.yaml");

        let provider = provider_from_config::<String>(
            KeyValueConfig {
                engine: Some(EngineConfig::in_memory()),
                file: Some(FileConfig::at_path(snapshot_path.to_string_lossy())),
            },
            KeyDomain::Text,
        )
        .unwrap();

        provider.store(Key::from("k"), "v".to_owned()).unwrap();
        provider.shutdown().unwrap();

        // The snapshot backend was never instantiated, so its file was
        // never created.
        assert!(!snapshot_path.exists());
    }

    #[test]
    fn file_selected_when_only_file_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let provider = provider_from_config::<String>(
            KeyValueConfig {
                engine: None,
                file: Some(FileConfig::at_path(path.to_string_lossy())),
            },
            KeyDomain::Text,
        )
        .unwrap();

        provider.store(Key::from("k"), "v".to_owned()).unwrap();
        assert!(path.exists());
    }
}
