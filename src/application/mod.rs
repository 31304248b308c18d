// Application layer: operation contracts over the repository.
// Existence checks and delete restrictions live here, not in SQL handlers.

pub mod error;
mod service;

pub use error::*;
pub use service::*;
