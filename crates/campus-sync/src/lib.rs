//! # campus-sync
//!
//! Client-side data synchronization for the school administration app.
//! Keeps in-memory mirrors of the remote collections, validates writes,
//! runs year-end promotion with single-level undo and exposes read views.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;
pub mod validator;
pub mod views;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use commands::promotion::{PromotionPatch, PromotionReport, UndoReport};
pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncHandle};
pub use error::{Result, SyncError};
pub use events::{Notice, NoticeLevel};

/// Install the global tracing subscriber. Respects `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_sync=debug,campus_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
