//! Core primitives for BulkFHIR: the raw record store, NDJSON decoding,
//! and deep flattening of nested resources.
//!
//! This crate is transport-agnostic. It owns the single source of truth for
//! a fetch session (the [`RawRecordStore`]) and the pure transformations
//! over decoded records that the reshape layer builds on.

pub mod error;
pub mod flatten;
pub mod ndjson;
pub mod store;

pub use error::{CoreError, Result};
pub use flatten::{FlatRecord, deep_flatten};
pub use ndjson::{declared_resource_type, parse_ndjson};
pub use store::{RawRecordStore, RecordLookup};
