// ETL pipeline: extract from a record source, transform, load into a sink

pub mod ingestion;
pub mod processing;
pub mod storage;

use indexmap::IndexMap;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::app::ports::{RecordSink, RecordSource};
use crate::error::Result;
use crate::types::{CleanRecord, EntityType, RawRecord};
use processing::{QualityReport, TransformRegistry};

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub report: QualityReport,
    pub cleaned: IndexMap<EntityType, Vec<CleanRecord>>,
    pub duration_secs: f64,
}

impl PipelineResult {
    pub fn records(&self, entity: EntityType) -> &[CleanRecord] {
        self.cleaned.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct EtlPipeline {
    registry: TransformRegistry,
}

impl Default for EtlPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl EtlPipeline {
    pub fn new() -> Self {
        Self {
            registry: TransformRegistry::new(),
        }
    }

    pub fn with_registry(registry: TransformRegistry) -> Self {
        Self { registry }
    }

    /// Extract every registered entity, transform each, then load the clean
    /// rows and the quality report. All sources are read before anything is
    /// written, so a missing or malformed source aborts the run with no output.
    #[instrument(skip_all)]
    pub fn run(&self, source: &dyn RecordSource, sink: &mut dyn RecordSink) -> Result<PipelineResult> {
        let started = Instant::now();
        info!("🚀 Starting ETL pipeline");

        let entities = self.registry.entities();
        let mut extracted: Vec<(EntityType, Vec<RawRecord>)> = Vec::with_capacity(entities.len());
        for entity in entities {
            let rows = source.read(entity).map_err(|e| {
                error!("Extraction failed for {}: {}", entity, e);
                e
            })?;
            extracted.push((entity, rows));
        }

        let mut report = QualityReport::new();
        let mut cleaned = IndexMap::new();
        for (entity, rows) in extracted {
            let output = self.registry.transform(entity, rows)?;
            report.record(entity, output.counters);
            cleaned.insert(entity, output.records);
        }

        for (entity, records) in &cleaned {
            sink.write_records(*entity, records)?;
        }
        sink.write_report(&report)?;

        let duration_secs = started.elapsed().as_secs_f64();
        let summary = report.summary();
        info!(
            "✅ ETL pipeline finished in {:.3}s: {} processed, {} loaded",
            duration_secs, summary.total_processed, summary.total_loaded
        );

        Ok(PipelineResult {
            report,
            cleaned,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::InMemoryRecordSource;
    use crate::pipeline::storage::InMemoryRecordSink;
    use crate::types::FieldValue;

    #[test]
    fn test_run_over_in_memory_collaborators() {
        let source = InMemoryRecordSource::new()
            .with(EntityType::Customers, vec![RawRecord::from_pairs([("customer_id", "C1")])])
            .with(EntityType::Products, vec![RawRecord::from_pairs([("product_id", FieldValue::from("P1")), ("price", FieldValue::Null)])])
            .with(EntityType::Orders, Vec::new());
        let mut sink = InMemoryRecordSink::new();

        let result = EtlPipeline::new().run(&source, &mut sink).unwrap();

        assert_eq!(result.records(EntityType::Customers).len(), 1);
        assert!(result.records(EntityType::Products).is_empty());
        assert_eq!(sink.records_for(EntityType::Customers).len(), 1);
        let report = sink.report.expect("report written");
        assert_eq!(report.counters(EntityType::Products).unwrap().loaded, 0);
    }

    #[test]
    fn test_missing_source_aborts_before_writing() {
        let source = InMemoryRecordSource::new().with(EntityType::Customers, Vec::new());
        let mut sink = InMemoryRecordSink::new();

        let err = EtlPipeline::new().run(&source, &mut sink).unwrap_err();

        assert!(err.is_not_found());
        assert!(sink.records.is_empty());
        assert!(sink.report.is_none());
    }
}
