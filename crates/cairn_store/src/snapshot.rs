//! Provider backed by in-memory maps mirrored wholesale to a file.
//!
//! The whole dataset - one map of entries, one map of references - lives in
//! memory behind a single reader/writer lock. Every successful mutation
//! re-serializes both maps in full and overwrites the backing file while
//! still holding the write lock, so the file always reflects the state
//! after the most recently completed write. Each write costs the size of
//! the entire dataset; this backend is for small, low-churn data.
//!
//! The serialization format is fixed once, at construction: by extension
//! when loading from a path (`.json`, `.yaml`, `.yml`), or by
//! parse-and-fall-back when constructed from inline content. Inline
//! instances never touch the disk.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::FileConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::{Key, KeyDomain};
use crate::provider::KeyValueProvider;

/// The persisted snapshot layout.
///
/// Both maps are keyed by the canonical string encoding of the key
/// (integer keys appear as decimal text) and are omitted from the
/// serialized form when empty. Entries and references are disjoint
/// structures, so an alias may share its raw form with a data key without
/// conflict.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: DeserializeOwned"))]
struct Document<V> {
    #[serde(
        rename = "data",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    entries: BTreeMap<String, V>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    references: BTreeMap<String, String>,
}

impl<V> Default for Document<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

/// A provider holding the full dataset in memory, persisted by complete
/// file overwrite on every mutation.
///
/// One coarse lock serializes all access: readers share it, a writer
/// excludes everything for the duration of its flush.
pub struct SnapshotProvider<V> {
    cfg: FileConfig,
    format: Format,
    domain: KeyDomain,
    state: RwLock<Document<V>>,
}

impl<V> SnapshotProvider<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Opens the snapshot described by `cfg` for keys of `domain`.
    ///
    /// With inline content, the content is parsed as JSON first and as
    /// YAML on failure; whichever succeeds becomes the instance's format
    /// and disk writes are disabled. With a path, the extension selects
    /// the format and [`setup`](KeyValueProvider::setup) loads or creates
    /// the file.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] for an unsupported extension, a parse error
    /// for unusable inline content, or any I/O or parse error from setup.
    pub fn open(cfg: FileConfig, domain: KeyDomain) -> StoreResult<Self> {
        let (format, initial) = if cfg.content.is_empty() {
            (Self::format_from_path(&cfg.path)?, Document::default())
        } else {
            Self::parse_inline(&cfg.content)?
        };

        let provider = Self {
            cfg,
            format,
            domain,
            state: RwLock::new(initial),
        };
        provider.setup()?;

        tracing::debug!(format = ?provider.format, "snapshot provider opened");
        Ok(provider)
    }

    fn format_from_path(path: &str) -> StoreResult<Format> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            _ => Err(StoreError::config(
                "unsupported snapshot format: only .json, .yaml, and .yml are supported",
            )),
        }
    }

    fn parse_inline(content: &str) -> StoreResult<(Format, Document<V>)> {
        match serde_json::from_str(content) {
            Ok(document) => Ok((Format::Json, document)),
            Err(_) => {
                let document = serde_yaml::from_str(content)?;
                Ok((Format::Yaml, document))
            }
        }
    }

    fn inline(&self) -> bool {
        !self.cfg.content.is_empty()
    }

    /// Serializes the whole document and overwrites the backing file.
    /// Skipped for inline instances, which hold no file.
    fn persist(&self, document: &Document<V>) -> StoreResult<()> {
        if self.inline() {
            return Ok(());
        }

        let bytes = match self.format {
            Format::Json => serde_json::to_vec_pretty(document)?,
            Format::Yaml => serde_yaml::to_string(document)?.into_bytes(),
        };
        std::fs::write(&self.cfg.path, bytes)?;
        Ok(())
    }
}

impl<V> KeyValueProvider<V> for SnapshotProvider<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Loads the backing file into memory, creating it empty if missing.
    /// No-op for inline instances.
    fn setup(&self) -> StoreResult<()> {
        if self.inline() {
            return Ok(());
        }

        let mut state = self.state.write();
        let path = Path::new(&self.cfg.path);

        if !path.try_exists()? {
            std::fs::write(path, b"")?;
            return Ok(());
        }

        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            // A freshly created (or truncated) snapshot is the empty
            // document, not a parse error.
            return Ok(());
        }

        *state = match self.format {
            Format::Json => serde_json::from_str(&raw)?,
            Format::Yaml => serde_yaml::from_str(&raw)?,
        };

        Ok(())
    }

    /// One final full flush. The provider holds no other resource.
    fn shutdown(&self) -> StoreResult<()> {
        let state = self.state.write();
        self.persist(&state)
    }

    fn store(&self, key: Key, value: V) -> StoreResult<()> {
        self.domain.check(&key)?;
        let mut state = self.state.write();
        state.entries.insert(key.encoded(), value);
        self.persist(&state)
    }

    fn get(&self, key: &Key) -> StoreResult<V> {
        self.domain.check(key)?;
        let state = self.state.read();
        state
            .entries
            .get(&key.encoded())
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn remove(&self, key: &Key) -> StoreResult<()> {
        self.domain.check(key)?;
        let mut state = self.state.write();
        if state.entries.remove(&key.encoded()).is_none() {
            return Err(StoreError::not_found(key));
        }
        self.persist(&state)
    }

    fn for_each(&self, visit: &mut dyn FnMut(Key, V) -> bool) -> StoreResult<()> {
        let state = self.state.read();
        for (encoded, value) in &state.entries {
            let key = self.domain.decode_str(encoded)?;
            if !visit(key, value.clone()) {
                break;
            }
        }
        Ok(())
    }

    fn store_reference(&self, reference: Key, key: Key) -> StoreResult<()> {
        self.domain.check(&reference)?;
        self.domain.check(&key)?;
        let mut state = self.state.write();
        state.references.insert(reference.encoded(), key.encoded());
        self.persist(&state)
    }

    fn remove_reference(&self, reference: &Key) -> StoreResult<()> {
        self.domain.check(reference)?;
        let mut state = self.state.write();
        if state.references.remove(&reference.encoded()).is_none() {
            return Err(StoreError::not_found(reference));
        }
        self.persist(&state)
    }

    fn get_by_reference(&self, reference: &Key) -> StoreResult<V> {
        self.domain.check(reference)?;
        let state = self.state.read();

        let target = state
            .references
            .get(&reference.encoded())
            .ok_or_else(|| StoreError::not_found(reference))?;

        state
            .entries
            .get(target)
            .cloned()
            .ok_or_else(|| StoreError::not_found(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn yaml_provider(dir: &tempfile::TempDir) -> SnapshotProvider<String> {
        let path = dir.path().join("state.yaml");
        SnapshotProvider::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Text,
        )
        .unwrap()
    }

    #[test]
    fn unsupported_extension_fails() {
        let result = SnapshotProvider::<String>::open(
            FileConfig::at_path("state.toml"),
            KeyDomain::Text,
        );
        assert!(matches!(result, Err(StoreError::Config { .. })));
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yaml");

        let provider = SnapshotProvider::<String>::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Text,
        )
        .unwrap();

        assert!(path.exists());
        assert!(provider.get(&Key::from("anything")).unwrap_err().is_not_found());
    }

    #[test]
    fn empty_file_reopens_as_empty_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "").unwrap();

        let provider = SnapshotProvider::<String>::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Text,
        )
        .unwrap();
        let mut count = 0;
        provider
            .for_each(&mut |_, _| {
                count += 1;
                true
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn corrupt_file_fails_setup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = SnapshotProvider::<String>::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Text,
        );
        assert!(matches!(result, Err(StoreError::Json(_))));
    }

    #[test]
    fn inline_json_content() {
        let provider = SnapshotProvider::<String>::open(
            FileConfig::from_content(r#"{"data": {"k": "v"}}"#),
            KeyDomain::Text,
        )
        .unwrap();

        assert_eq!(provider.get(&Key::from("k")).unwrap(), "v");
        assert_eq!(provider.format, Format::Json);
    }

    #[test]
    fn inline_falls_back_to_yaml() {
        let provider = SnapshotProvider::<String>::open(
            FileConfig::from_content("data:\n  k: v\nreferences:\n  r: k\n"),
            KeyDomain::Text,
        )
        .unwrap();

        assert_eq!(provider.format, Format::Yaml);
        assert_eq!(provider.get_by_reference(&Key::from("r")).unwrap(), "v");
    }

    #[test]
    fn inline_unparseable_content_fails() {
        let result = SnapshotProvider::<String>::open(
            FileConfig::from_content(": not : valid : anything ["),
            KeyDomain::Text,
        );
        assert!(result.is_err());
    }

    #[test]
    fn inline_instances_never_write() {
        let mut cfg = FileConfig::from_content(r#"{"data": {"k": "v"}}"#);
        cfg.path = "/nonexistent/directory/state.json".into();

        let provider =
            SnapshotProvider::<String>::open(cfg, KeyDomain::Text).unwrap();
        // Would fail with an I/O error if a flush were attempted.
        provider.store(Key::from("k2"), "v2".into()).unwrap();
        provider.shutdown().unwrap();
    }

    #[test]
    fn dangling_reference_is_stored_but_unresolvable() {
        let dir = tempdir().unwrap();
        let provider = yaml_provider(&dir);

        provider
            .store_reference(Key::from("alias"), Key::from("missing"))
            .unwrap();
        let err = provider.get_by_reference(&Key::from("alias")).unwrap_err();
        assert!(err.is_not_found());

        // The reference itself persisted; pointing it at a real entry
        // later makes it resolvable.
        provider.store(Key::from("missing"), "found".into()).unwrap();
        assert_eq!(
            provider.get_by_reference(&Key::from("alias")).unwrap(),
            "found"
        );
    }

    #[test]
    fn empty_maps_are_omitted_from_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let provider = SnapshotProvider::<String>::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Text,
        )
        .unwrap();
        provider.store(Key::from("k"), "v".into()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"data\""));
        assert!(!raw.contains("references"));
    }

    #[test]
    fn index_keys_persist_as_decimal_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let provider = SnapshotProvider::<String>::open(
            FileConfig::at_path(path.to_string_lossy()),
            KeyDomain::Index,
        )
        .unwrap();
        provider.store(Key::from(42u64), "answer".into()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"42\""));
    }

    proptest! {
        // Flush-per-mutation means the file always round-trips to the
        // in-memory state, whatever that state is.
        #[test]
        fn persisted_state_round_trips(
            entries in proptest::collection::btree_map("[a-z]{1,8}", "[a-z]{0,8}", 0..8),
        ) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("state.yaml");
            let cfg = FileConfig::at_path(path.to_string_lossy());

            let provider =
                SnapshotProvider::<String>::open(cfg.clone(), KeyDomain::Text).unwrap();
            for (k, v) in &entries {
                provider.store(Key::from(k.as_str()), v.clone()).unwrap();
            }
            provider.shutdown().unwrap();

            let reopened =
                SnapshotProvider::<String>::open(cfg, KeyDomain::Text).unwrap();
            let mut seen = std::collections::BTreeMap::new();
            reopened
                .for_each(&mut |key, value| {
                    seen.insert(key.encoded(), value);
                    true
                })
                .unwrap();
            prop_assert_eq!(seen, entries);
        }
    }
}
