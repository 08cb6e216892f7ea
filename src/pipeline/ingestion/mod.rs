//! Extract stage: record sources yielding raw rows per entity type

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::RecordSource;
use crate::error::{EtlError, Result};
use crate::observability::metrics;
use crate::types::{EntityType, FieldValue, RawRecord};

/// Reads `<data_dir>/<entity raw file>` as a headed CSV file
pub struct CsvRecordSource {
    data_dir: PathBuf,
}

impl CsvRecordSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, entity: EntityType) -> PathBuf {
        self.data_dir.join(entity.raw_file())
    }

    /// Parse every row of `path`; the header row gives field names and order
    pub fn read_path(path: &Path) -> Result<Vec<RawRecord>> {
        if !path.exists() {
            return Err(EtlError::NotFound { path: path.to_path_buf() });
        }
        let file = File::open(path)?;
        Self::read_from(file).map_err(|e| match e {
            EtlError::Csv(inner) => EtlError::Format(format!("{}: {}", path.display(), inner)),
            other => other,
        })
    }

    /// Parse headed CSV from any reader
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Vec<RawRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let record = RawRecord::from_pairs(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(name, cell)| (name.clone(), FieldValue::from_cell(cell))),
            );
            records.push(record);
        }
        Ok(records)
    }
}

impl RecordSource for CsvRecordSource {
    fn read(&self, entity: EntityType) -> Result<Vec<RawRecord>> {
        let path = self.path_for(entity);
        debug!("Reading {} from {}", entity, path.display());
        match Self::read_path(&path) {
            Ok(records) => {
                info!("Extracted {} {} records", records.len(), entity);
                metrics::extract::records_read(entity.as_str(), records.len());
                Ok(records)
            }
            Err(e) => {
                metrics::extract::source_error(entity.as_str());
                Err(e)
            }
        }
    }
}

/// Record source backed by rows held in memory, for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordSource {
    rows: HashMap<EntityType, Vec<RawRecord>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: EntityType, rows: Vec<RawRecord>) -> Self {
        self.rows.insert(entity, rows);
        self
    }
}

impl RecordSource for InMemoryRecordSource {
    fn read(&self, entity: EntityType) -> Result<Vec<RawRecord>> {
        self.rows.get(&entity).cloned().ok_or_else(|| EtlError::NotFound {
            path: PathBuf::from(entity.raw_file()),
        })
    }
}
