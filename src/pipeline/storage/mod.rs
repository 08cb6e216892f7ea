//! Load stage: sinks accepting clean rows and the quality report

use chrono::Local;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::app::ports::RecordSink;
use crate::constants::QUALITY_REPORT_FILE;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::quality::QualityReport;
use crate::types::{CleanRecord, EntityType};

/// Writes `<output_dir>/<entity>_cleaned.csv` and the text quality report
pub struct CsvRecordSink {
    output_dir: PathBuf,
}

impl CsvRecordSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, entity: EntityType) -> PathBuf {
        self.output_dir.join(entity.clean_file())
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(QUALITY_REPORT_FILE)
    }

    /// Render records as CSV. Columns are the union of field names in first-seen
    /// order; absent values are empty cells.
    pub fn to_csv<W: std::io::Write>(writer: W, records: &[CleanRecord]) -> Result<()> {
        let columns: IndexSet<&str> = records.iter().flat_map(|r| r.field_names()).collect();
        let mut wtr = csv::Writer::from_writer(writer);
        if !columns.is_empty() {
            wtr.write_record(columns.iter())?;
        }
        for record in records {
            wtr.write_record(columns.iter().map(|c| record.get(c).to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_entity(&self, entity: EntityType, records: &[CleanRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(entity);
        let file = fs::File::create(&path)?;
        Self::to_csv(file, records)?;
        Ok(path)
    }
}

impl RecordSink for CsvRecordSink {
    fn write_records(&mut self, entity: EntityType, records: &[CleanRecord]) -> Result<()> {
        match self.write_entity(entity, records) {
            Ok(path) => {
                info!("💾 Saved {} {} records to {}", records.len(), entity, path.display());
                metrics::load::records_written(entity.as_str(), records.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save {} records: {}", entity, e);
                metrics::load::sink_error(entity.as_str());
                Err(e)
            }
        }
    }

    fn write_report(&mut self, report: &QualityReport) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.report_path();
        fs::write(&path, report.render(Local::now()))?;
        info!("Quality report written to {}", path.display());
        Ok(())
    }
}

/// Sink that keeps everything in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryRecordSink {
    pub records: HashMap<EntityType, Vec<CleanRecord>>,
    pub report: Option<QualityReport>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_for(&self, entity: EntityType) -> &[CleanRecord] {
        self.records.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RecordSink for InMemoryRecordSink {
    fn write_records(&mut self, entity: EntityType, records: &[CleanRecord]) -> Result<()> {
        self.records.insert(entity, records.to_vec());
        Ok(())
    }

    fn write_report(&mut self, report: &QualityReport) -> Result<()> {
        self.report = Some(report.clone());
        Ok(())
    }
}
