//! Task module
//!
//! Task records as the client sees them, and the payloads written back.

mod model;

pub use model::*;
