//! # Cairn Store
//!
//! Backend-agnostic key-value providers.
//!
//! Callers pick a key domain (text identifiers or unsigned integers) and a
//! serde-serializable value type, then obtain a [`KeyValueProvider`] from
//! configuration. Two interchangeable backends implement the contract:
//!
//! - [`EngineProvider`] - a durable embedded ordered-key engine (redb);
//!   every operation is one snapshot-isolated engine transaction.
//! - [`SnapshotProvider`] - the whole dataset in memory behind one lock,
//!   mirrored to a JSON or YAML file on every mutation. Small, low-churn
//!   data only.
//!
//! Both backends present the same operation set, the same reference
//! (alias) indirection, and the same error taxonomy: every flavor of
//! "it isn't there" reports as [`StoreError::NotFound`], checkable with
//! [`StoreError::is_not_found`].
//!
//! ## Example
//!
//! ```rust
//! use cairn_store::{EngineConfig, EngineProvider, Key, KeyDomain, KeyValueProvider};
//!
//! let provider: EngineProvider<String> =
//!     EngineProvider::open(EngineConfig::in_memory(), KeyDomain::Text).unwrap();
//!
//! provider.store(Key::from("greeting"), "hello".to_string()).unwrap();
//! assert_eq!(provider.get(&Key::from("greeting")).unwrap(), "hello");
//!
//! provider.store_reference(Key::from("hi"), Key::from("greeting")).unwrap();
//! assert_eq!(provider.get_by_reference(&Key::from("hi")).unwrap(), "hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod key;
mod provider;
mod snapshot;

pub use config::{EngineConfig, FileConfig, KeyValueConfig};
pub use engine::EngineProvider;
pub use error::{StoreError, StoreResult};
pub use key::{Key, KeyDomain};
pub use provider::{provider_from_config, KeyValueProvider};
pub use snapshot::SnapshotProvider;
