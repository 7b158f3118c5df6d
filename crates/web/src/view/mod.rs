//! HTML view layer
//!
//! Rendering only; every form posts to a route that calls the task store.

mod auth_page;
mod components;
mod tasks_page;

pub use auth_page::{AuthMode, AuthPage};
pub use tasks_page::render_tasks_page;
