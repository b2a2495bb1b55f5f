//! Mutations exposed by the engine, one module per collection.
//!
//! Every command validates, awaits its store write, then reloads the
//! affected collection, and emits exactly one notice describing the outcome.

pub mod fees;
pub mod promotion;
pub mod schedules;
pub mod students;
pub mod teachers;
