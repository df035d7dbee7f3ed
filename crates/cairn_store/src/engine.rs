//! Provider backed by an embedded ordered key-value engine (redb).
//!
//! Every operation runs as one independent engine transaction: reads are
//! snapshot-isolated, writes are atomic and serialized by the engine, and
//! nothing spans two calls. Keys go into the engine in their canonical text
//! encoding (decimal ASCII for integer keys), so raw database contents stay
//! inspectable; values are encoded as CBOR, a self-describing tagged binary
//! format that needs no external schema.
//!
//! Entries and references live in separate named engine tables. The engine's
//! table namespace is what keeps an alias whose encoded bytes equal a data
//! key's encoded bytes from clobbering it.

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::config::EngineConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::{Key, KeyDomain};
use crate::provider::KeyValueProvider;

type RawTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

const ENTRIES: RawTable = TableDefinition::new("entries");
const REFERENCES: RawTable = TableDefinition::new("references");

/// File name of the engine database inside the configured directory.
const ENGINE_FILE: &str = "store.redb";

/// A provider over the embedded ordered-key engine.
///
/// Durable when configured with a directory path, purely in-memory when
/// configured with `in_memory`. Iteration follows the engine's key order:
/// lexicographic over the encoded bytes, which for integer keys means
/// text order (`1`, `10`, `2`, ...), not numeric order.
pub struct EngineProvider<V> {
    db: Database,
    domain: KeyDomain,
    _value: PhantomData<fn() -> V>,
}

impl<V> EngineProvider<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Opens the engine described by `cfg` for keys of `domain`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] when `cfg` is not in-memory and has no
    /// directory path, or any engine error while opening the database.
    pub fn open(cfg: EngineConfig, domain: KeyDomain) -> StoreResult<Self> {
        let db = if cfg.in_memory {
            Database::builder().create_with_backend(InMemoryBackend::new())?
        } else {
            let dir = cfg.directory_path.as_deref().ok_or_else(|| {
                StoreError::config("directory path is required unless in_memory is set")
            })?;
            std::fs::create_dir_all(dir)?;
            Database::create(dir.join(ENGINE_FILE))?
        };

        let provider = Self {
            db,
            domain,
            _value: PhantomData,
        };
        provider.setup()?;

        tracing::debug!(in_memory = cfg.in_memory, "engine provider opened");
        Ok(provider)
    }

    fn encode_value(value: &V) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)?;
        Ok(buf)
    }

    fn decode_value(bytes: &[u8]) -> StoreResult<V> {
        Ok(ciborium::from_reader(bytes)?)
    }

    /// Reads one table under a fresh read transaction and resolves `key`.
    ///
    /// A table that was never created and an absent key are the same
    /// condition from the caller's point of view: not found. The engine's
    /// own error is kept as the chained cause where one exists.
    fn read_raw(
        &self,
        table: RawTable,
        key: &Key,
    ) -> StoreResult<Vec<u8>> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(table) {
            Ok(table) => table,
            Err(err @ TableError::TableDoesNotExist(_)) => {
                return Err(StoreError::not_found_with_source(key, err));
            }
            Err(err) => return Err(err.into()),
        };

        let guard = table
            .get(key.encode().as_slice())?
            .ok_or_else(|| StoreError::not_found(key))?;
        Ok(guard.value().to_vec())
    }

    fn write_raw(
        &self,
        table: RawTable,
        key: &Key,
        value: &[u8],
    ) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(key.encode().as_slice(), value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_raw(
        &self,
        table: RawTable,
        key: &Key,
    ) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(table)?;
            let removed = table.remove(key.encode().as_slice())?.is_some();
            removed
        };
        txn.commit()?;

        if removed {
            Ok(())
        } else {
            Err(StoreError::not_found(key))
        }
    }
}

impl<V> KeyValueProvider<V> for EngineProvider<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates the entry and reference tables. Idempotent.
    fn setup(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            txn.open_table(ENTRIES)?;
            txn.open_table(REFERENCES)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// The engine commits durably per transaction and releases its handle
    /// on drop, so there is nothing left to flush here.
    fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }

    fn store(&self, key: Key, value: V) -> StoreResult<()> {
        self.domain.check(&key)?;
        let encoded = Self::encode_value(&value)?;
        self.write_raw(ENTRIES, &key, &encoded)
    }

    fn get(&self, key: &Key) -> StoreResult<V> {
        self.domain.check(key)?;
        let bytes = self.read_raw(ENTRIES, key)?;
        Self::decode_value(&bytes)
    }

    fn remove(&self, key: &Key) -> StoreResult<()> {
        self.domain.check(key)?;
        self.remove_raw(ENTRIES, key)
    }

    fn for_each(&self, visit: &mut dyn FnMut(Key, V) -> bool) -> StoreResult<()> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(ENTRIES) {
            Ok(table) => table,
            // Nothing was ever stored; nothing to visit.
            Err(TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        for entry in table.iter()? {
            let (key_guard, value_guard) = entry?;
            let key = self.domain.decode_bytes(key_guard.value())?;
            let value = Self::decode_value(value_guard.value())?;
            if !visit(key, value) {
                break;
            }
        }

        Ok(())
    }

    fn store_reference(&self, reference: Key, key: Key) -> StoreResult<()> {
        self.domain.check(&reference)?;
        self.domain.check(&key)?;
        self.write_raw(REFERENCES, &reference, &key.encode())
    }

    fn remove_reference(&self, reference: &Key) -> StoreResult<()> {
        self.domain.check(reference)?;
        self.remove_raw(REFERENCES, reference)
    }

    fn get_by_reference(&self, reference: &Key) -> StoreResult<V> {
        self.domain.check(reference)?;
        let target_bytes = self.read_raw(REFERENCES, reference)?;
        let target = self.domain.decode_bytes(&target_bytes)?;
        // Second, independent transaction: the alias and its target are
        // not resolved under one snapshot.
        self.get(&target)
    }
}
