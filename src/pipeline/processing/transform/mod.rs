//! Entity transformer: raw rows of one entity type to clean rows plus counters.
//!
//! Every entity goes through the same shape:
//! reshape → deduplicate → normalize each row → drop rows missing critical
//! fields. Entity-specific rules plug in through [`EntityTransformer`].

pub mod customers;
pub mod orders;
pub mod products;
pub mod registry;

pub use customers::CustomerTransformer;
pub use orders::OrderTransformer;
pub use products::ProductTransformer;
pub use registry::TransformRegistry;

use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::observability::metrics;
use crate::pipeline::processing::quality::QualityCounters;
use crate::types::{CleanRecord, EntityType, RawRecord};

/// Rules for one entity type
pub trait EntityTransformer: Send + Sync {
    /// The entity type these rules apply to
    fn entity(&self) -> EntityType;

    /// Map alternate source field names onto the canonical schema
    fn reshape(&self, _record: &mut RawRecord) {}

    /// Normalize, synthesize and default the fields of one row.
    /// `row_index` is the row's zero-based position in the source.
    fn normalize(&self, record: &mut RawRecord, row_index: usize);

    /// Whether a normalized row still has its critical fields
    fn keep(&self, _record: &RawRecord) -> bool {
        true
    }
}

/// Clean rows in input order plus the counters for the run
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub records: Vec<CleanRecord>,
    pub counters: QualityCounters,
}

/// Transform `raw` with the built-in rules for `entity`
pub fn transform(entity: EntityType, raw: Vec<RawRecord>) -> TransformOutput {
    match entity {
        EntityType::Customers => run_transform(&CustomerTransformer, raw),
        EntityType::Products => run_transform(&ProductTransformer, raw),
        EntityType::Orders => run_transform(&OrderTransformer, raw),
    }
}

/// Run the shared transform shape with the given rules
#[instrument(skip(rules, raw), fields(entity = %rules.entity(), rows = raw.len()))]
pub fn run_transform(rules: &dyn EntityTransformer, raw: Vec<RawRecord>) -> TransformOutput {
    let entity = rules.entity();
    let processed = raw.len();

    let mut rows: Vec<(usize, RawRecord)> = raw.into_iter().enumerate().collect();
    for (_, record) in rows.iter_mut() {
        rules.reshape(record);
    }

    let rows = deduplicate(rows);
    let duplicates = processed - rows.len();
    debug!("Removed {} duplicate {} records", duplicates, entity);

    let missing_before = missing_cells(rows.iter().map(|(_, r)| r));

    let mut survivors = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for (row_index, mut record) in rows {
        rules.normalize(&mut record, row_index);
        if rules.keep(&record) {
            survivors.push(record);
        } else {
            debug!(row_index, "Dropping {} record missing a critical field", entity);
            dropped += 1;
        }
    }

    let missing_after = missing_cells(survivors.iter());
    let counters = QualityCounters {
        processed,
        duplicates,
        missing_fixed: missing_before as i64 - missing_after as i64,
        loaded: survivors.len(),
    };

    info!(
        "Transformed {}: {} processed, {} duplicates, {} dropped, {} missing fixed, {} loaded",
        entity, counters.processed, counters.duplicates, dropped, counters.missing_fixed, counters.loaded
    );
    metrics::transform::entity_transformed(
        entity.as_str(),
        counters.processed,
        counters.duplicates,
        dropped,
        counters.loaded,
        counters.missing_fixed,
    );

    TransformOutput {
        records: survivors.into_iter().map(RawRecord::into_clean).collect(),
        counters,
    }
}

/// Keep the first occurrence of every distinct row, preserving order
fn deduplicate(rows: Vec<(usize, RawRecord)>) -> Vec<(usize, RawRecord)> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|(_, record)| seen.insert(record.fingerprint()))
        .collect()
}

/// Missing cells over the union of columns present in the row set; a column
/// a row lacks counts as missing for that row.
fn missing_cells<'a>(rows: impl Iterator<Item = &'a RawRecord> + Clone) -> usize {
    let columns: IndexSet<&str> = rows.clone().flat_map(|r| r.fields().map(|(k, _)| k)).collect();
    rows.map(|r| columns.iter().filter(|c| r.get(c).is_null()).count())
        .sum()
}
