// Application boundary: ports the core consumes from its I/O collaborators

pub mod ports;

pub use ports::{DocumentSource, RecordSink, RecordSource};
