//! Metrics for the FlexiMart ETL pipeline and catalog simulator
//!
//! Metric names live in one enum so recording sites never spell a metric by
//! hand. Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op, which keeps library use and tests quiet.

use once_cell::sync::OnceCell;
use std::fmt;
use tracing::{info, warn};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Extract metrics
    ExtractRecordsRead,
    ExtractSourceErrors,

    // Transform metrics
    TransformRecordsProcessed,
    TransformDuplicatesRemoved,
    TransformRowsDropped,
    TransformMissingFixed,
    TransformUnparseableValues,
    TransformRecordsLoaded,

    // Load metrics
    LoadRecordsWritten,
    LoadSinkErrors,

    // Catalog metrics
    CatalogDocumentsLoaded,
    CatalogLoadErrors,
    CatalogOperations,
    CatalogReviewsAppended,
    CatalogReviewTargetsMissing,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExtractRecordsRead => "fleximart_extract_records_read_total",
            MetricName::ExtractSourceErrors => "fleximart_extract_source_errors_total",

            MetricName::TransformRecordsProcessed => "fleximart_transform_records_processed_total",
            MetricName::TransformDuplicatesRemoved => "fleximart_transform_duplicates_removed_total",
            MetricName::TransformRowsDropped => "fleximart_transform_rows_dropped_total",
            MetricName::TransformMissingFixed => "fleximart_transform_missing_fixed",
            MetricName::TransformUnparseableValues => "fleximart_transform_unparseable_values_total",
            MetricName::TransformRecordsLoaded => "fleximart_transform_records_loaded_total",

            MetricName::LoadRecordsWritten => "fleximart_load_records_written_total",
            MetricName::LoadSinkErrors => "fleximart_load_sink_errors_total",

            MetricName::CatalogDocumentsLoaded => "fleximart_catalog_documents_loaded",
            MetricName::CatalogLoadErrors => "fleximart_catalog_load_errors_total",
            MetricName::CatalogOperations => "fleximart_catalog_operations_total",
            MetricName::CatalogReviewsAppended => "fleximart_catalog_reviews_appended_total",
            MetricName::CatalogReviewTargetsMissing => "fleximart_catalog_review_targets_missing_total",
        }
    }

    /// (phase, description) for each metric
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::ExtractRecordsRead => ("extract", "Raw records read from the record source"),
            MetricName::ExtractSourceErrors => ("extract", "Record source failures"),

            MetricName::TransformRecordsProcessed => ("transform", "Records entering the transform"),
            MetricName::TransformDuplicatesRemoved => ("transform", "Exact duplicate rows removed"),
            MetricName::TransformRowsDropped => ("transform", "Rows dropped for missing critical fields"),
            MetricName::TransformMissingFixed => ("transform", "Net missing cells fixed in the last run"),
            MetricName::TransformUnparseableValues => ("transform", "Field values replaced by the absent sentinel"),
            MetricName::TransformRecordsLoaded => ("transform", "Records leaving the transform"),

            MetricName::LoadRecordsWritten => ("load", "Clean records written to the sink"),
            MetricName::LoadSinkErrors => ("load", "Sink write failures"),

            MetricName::CatalogDocumentsLoaded => ("catalog", "Documents in the collection after the last load"),
            MetricName::CatalogLoadErrors => ("catalog", "Failed collection loads"),
            MetricName::CatalogOperations => ("catalog", "Catalog operations executed"),
            MetricName::CatalogReviewsAppended => ("catalog", "Reviews appended to documents"),
            MetricName::CatalogReviewTargetsMissing => ("catalog", "Review appends whose product was not found"),
        }
    }

    /// Recorded with `gauge!`; everything else is a counter
    pub fn is_gauge(&self) -> bool {
        matches!(self, MetricName::TransformMissingFixed | MetricName::CatalogDocumentsLoaded)
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            ExtractRecordsRead,
            ExtractSourceErrors,
            TransformRecordsProcessed,
            TransformDuplicatesRemoved,
            TransformRowsDropped,
            TransformMissingFixed,
            TransformUnparseableValues,
            TransformRecordsLoaded,
            LoadRecordsWritten,
            LoadSinkErrors,
            CatalogDocumentsLoaded,
            CatalogLoadErrors,
            CatalogOperations,
            CatalogReviewsAppended,
            CatalogReviewTargetsMissing,
        ]
        .into_iter()
    }
}

static HANDLE: OnceCell<metrics_exporter_prometheus::PrometheusHandle> = OnceCell::new();

/// Install an in-process Prometheus recorder. Idempotent; a second call, or a
/// recorder installed elsewhere, leaves the existing one in place.
pub fn init() {
    if HANDLE.get().is_some() {
        return;
    }
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            for metric in MetricName::all_metrics() {
                let (phase, description) = metric.metadata();
                let description = format!("[{}] {}", phase, description);
                if metric.is_gauge() {
                    ::metrics::describe_gauge!(metric.as_str(), description);
                } else {
                    ::metrics::describe_counter!(metric.as_str(), description);
                }
            }
            info!("Metrics recorder installed");
        }
        Err(e) => {
            warn!("Metrics recorder install failed (possibly already installed): {}", e);
        }
    }
}

/// Render the current metrics in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

pub mod extract {
    use super::MetricName;

    pub fn records_read(entity: &str, count: usize) {
        ::metrics::counter!(MetricName::ExtractRecordsRead.as_str(), "entity" => entity.to_string())
            .increment(count as u64);
    }

    pub fn source_error(entity: &str) {
        ::metrics::counter!(MetricName::ExtractSourceErrors.as_str(), "entity" => entity.to_string()).increment(1);
    }
}

pub mod transform {
    use super::MetricName;

    /// Record the counters of one finished entity transform
    pub fn entity_transformed(entity: &str, processed: usize, duplicates: usize, dropped: usize, loaded: usize, missing_fixed: i64) {
        let label = entity.to_string();
        ::metrics::counter!(MetricName::TransformRecordsProcessed.as_str(), "entity" => label.clone())
            .increment(processed as u64);
        ::metrics::counter!(MetricName::TransformDuplicatesRemoved.as_str(), "entity" => label.clone())
            .increment(duplicates as u64);
        ::metrics::counter!(MetricName::TransformRowsDropped.as_str(), "entity" => label.clone())
            .increment(dropped as u64);
        ::metrics::counter!(MetricName::TransformRecordsLoaded.as_str(), "entity" => label.clone())
            .increment(loaded as u64);
        ::metrics::gauge!(MetricName::TransformMissingFixed.as_str(), "entity" => label).set(missing_fixed as f64);
    }

    /// Record a field value the normalizers could not interpret
    pub fn unparseable_value(kind: &'static str) {
        ::metrics::counter!(MetricName::TransformUnparseableValues.as_str(), "kind" => kind).increment(1);
    }
}

pub mod load {
    use super::MetricName;

    pub fn records_written(entity: &str, count: usize) {
        ::metrics::counter!(MetricName::LoadRecordsWritten.as_str(), "entity" => entity.to_string())
            .increment(count as u64);
    }

    pub fn sink_error(entity: &str) {
        ::metrics::counter!(MetricName::LoadSinkErrors.as_str(), "entity" => entity.to_string()).increment(1);
    }
}

pub mod catalog {
    use super::MetricName;

    pub fn documents_loaded(count: usize) {
        ::metrics::gauge!(MetricName::CatalogDocumentsLoaded.as_str()).set(count as f64);
    }

    pub fn load_error() {
        ::metrics::counter!(MetricName::CatalogLoadErrors.as_str()).increment(1);
    }

    pub fn operation(kind: &'static str) {
        ::metrics::counter!(MetricName::CatalogOperations.as_str(), "operation" => kind).increment(1);
    }

    pub fn review_appended() {
        ::metrics::counter!(MetricName::CatalogReviewsAppended.as_str()).increment(1);
    }

    pub fn review_target_missing() {
        ::metrics::counter!(MetricName::CatalogReviewTargetsMissing.as_str()).increment(1);
    }
}
