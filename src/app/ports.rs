use crate::error::Result;
use crate::pipeline::processing::quality::QualityReport;
use crate::types::{CleanRecord, EntityType, RawRecord};

/// Yields the raw rows of one entity type, in source order
pub trait RecordSource {
    fn read(&self, entity: EntityType) -> Result<Vec<RawRecord>>;
}

/// Persists clean rows and the run's quality report
pub trait RecordSink {
    fn write_records(&mut self, entity: EntityType, records: &[CleanRecord]) -> Result<()>;

    fn write_report(&mut self, report: &QualityReport) -> Result<()>;
}

/// Yields the raw bytes of a structured document collection
pub trait DocumentSource {
    /// Human-readable location, used in logs
    fn describe(&self) -> String;

    fn read_bytes(&self) -> Result<Vec<u8>>;
}
