pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

// Metrics facade and the names of every counter we record
pub mod observability;

// Application boundary: ports implemented by the file and in-memory adapters
pub mod app;

pub use error::{EtlError, Result};
