//! Client-side task store
//!
//! Mirrors the signed-in user's rows for as long as the task-list view is
//! mounted. Local state changes only after the backend acknowledges a call.

mod task_store;

pub use task_store::*;
