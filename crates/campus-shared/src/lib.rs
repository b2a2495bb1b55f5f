//! # campus-shared
//!
//! Domain vocabulary shared by the store and the sync engine: class levels and
//! their progression, record statuses, entity models and creation drafts.

pub mod constants;
pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
