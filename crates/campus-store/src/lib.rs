//! # campus-store
//!
//! The record store boundary used by the sync engine.
//!
//! [`RecordStore`] is the minimal remote-store contract: full fetches, per-row
//! writes, filtered queries with a distinguishable "not found" signal, and a
//! per-collection change feed. [`Database`] implements it on top of SQLite,
//! with schema-level uniqueness constraints and a broadcast notification
//! after every committed write.

pub mod collection;
pub mod database;
pub mod migrations;
pub mod record_store;
pub mod rows;

mod error;

pub use collection::{Collection, ColumnKind, TableSpec};
pub use database::Database;
pub use error::{Result, StoreError};
pub use record_store::{ChangeFeed, Condition, Op, Query, RecordStore, Row};
pub use rows::{format_timestamp, timestamp_now};
