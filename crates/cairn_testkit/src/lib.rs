//! # Cairn Testkit
//!
//! Test utilities for Cairn providers.
//!
//! This crate provides:
//! - Sample value types and fixtures
//! - Backend constructors with automatic temp-file cleanup
//! - The cross-backend harness that runs one test closure against every
//!   backend, so contract tests are written once
//!
//! ## Usage
//!
//! ```rust
//! use cairn_store::{Key, KeyDomain};
//! use cairn_testkit::each_provider;
//!
//! each_provider::<String>(KeyDomain::Text, |provider| {
//!     provider.store(Key::from("k"), "v".to_string()).unwrap();
//!     assert_eq!(provider.get(&Key::from("k")).unwrap(), "v");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;

pub use fixtures::*;
