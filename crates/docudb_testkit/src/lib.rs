//! # DocuDB Testkit
//!
//! Test utilities for DocuDB.
//!
//! This crate provides:
//! - Temporary store fixtures and ready-made schemas
//! - Property-based test generators using proptest
//! - Byte-exact store file vectors
//! - Concurrent load helpers
//!
//! Cross-crate property and scenario tests live in this crate's `tests/`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docudb_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn saves_a_post() {
//!     let (_store, posts) = TestStore::model(post_schema()).await;
//!     posts.new_record(&json!({"title": "hi"})).unwrap().save().await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
