//! Core library for the to-do list
//!
//! This crate contains everything below the HTML surface:
//! - Task records and their wire forms
//! - The remote data service seam (hosted backend and in-memory backend)
//! - The session gate and the client-side task store

pub mod error;
pub mod gate;
pub mod remote;
pub mod store;
pub mod task;

pub use error::{AuthError, Error, ServiceError};
pub type Result<T> = std::result::Result<T, Error>;
