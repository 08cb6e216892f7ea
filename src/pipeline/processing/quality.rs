use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EntityType;

/// Cleaning counters for one entity transform.
///
/// Returned by value from each transform call and merged by the caller into a
/// [`QualityReport`]; nothing here is shared between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCounters {
    /// Input row count
    pub processed: usize,
    /// Exact duplicate rows removed
    pub duplicates: usize,
    /// Net change in missing cells: missing before normalization minus missing
    /// after. Negative when normalization introduced more absent values (e.g.
    /// unparseable dates) than it filled.
    pub missing_fixed: i64,
    /// Output row count
    pub loaded: usize,
}

impl QualityCounters {
    /// Cleaning actions taken: duplicates removed plus missing values fixed
    pub fn cleaned(&self) -> i64 {
        self.duplicates as i64 + self.missing_fixed
    }

    /// Rows removed for any reason (duplicates and failed critical fields)
    pub fn removed(&self) -> usize {
        self.processed.saturating_sub(self.loaded)
    }
}

/// Totals across every entity in a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total_processed: usize,
    pub total_cleaned: i64,
    pub total_loaded: usize,
    /// `loaded / processed * 100`; `None` when nothing was processed
    pub quality_score: Option<f64>,
}

/// Per-entity counters for one pipeline run, in the order entities were added
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub run_id: Uuid,
    entities: IndexMap<EntityType, QualityCounters>,
}

impl Default for QualityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            entities: IndexMap::new(),
        }
    }

    /// Merge counters for `entity`. Counters for an entity seen before are summed.
    pub fn record(&mut self, entity: EntityType, counters: QualityCounters) {
        let entry = self.entities.entry(entity).or_default();
        entry.processed += counters.processed;
        entry.duplicates += counters.duplicates;
        entry.missing_fixed += counters.missing_fixed;
        entry.loaded += counters.loaded;
    }

    pub fn counters(&self, entity: EntityType) -> Option<&QualityCounters> {
        self.entities.get(&entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityType, &QualityCounters)> {
        self.entities.iter().map(|(e, c)| (*e, c))
    }

    pub fn summary(&self) -> QualitySummary {
        let total_processed: usize = self.entities.values().map(|c| c.processed).sum();
        let total_loaded: usize = self.entities.values().map(|c| c.loaded).sum();
        let total_cleaned: i64 = self.entities.values().map(|c| c.cleaned()).sum();
        let quality_score = if total_processed == 0 {
            None
        } else {
            Some(total_loaded as f64 / total_processed as f64 * 100.0)
        };
        QualitySummary {
            total_processed,
            total_cleaned,
            total_loaded,
            quality_score,
        }
    }

    /// Human-readable report text
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let rule = "=".repeat(70);
        let thin = "-".repeat(70);
        let mut lines = vec![
            "FLEXIMART ETL DATA QUALITY REPORT".to_string(),
            rule.clone(),
            format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
            format!("Run ID:    {}", self.run_id),
            String::new(),
        ];

        for (entity, stats) in &self.entities {
            lines.push(entity.as_str().to_uppercase());
            lines.push(thin.clone());
            lines.push(format!("  Records Processed:    {}", stats.processed));
            lines.push(format!("  Duplicates Removed:   {}", stats.duplicates));
            lines.push(format!("  Missing Values Fixed: {}", stats.missing_fixed));
            lines.push(format!("  Records Loaded:       {}", stats.loaded));
            lines.push(String::new());
        }

        let summary = self.summary();
        lines.push(rule.clone());
        lines.push("SUMMARY".to_string());
        lines.push(rule);
        lines.push(format!("Total Records Processed: {}", summary.total_processed));
        lines.push(format!("Total Records Cleaned:   {}", summary.total_cleaned));
        lines.push(format!("Total Records Loaded:    {}", summary.total_loaded));
        lines.push(match summary.quality_score {
            Some(score) => format!("Data Quality Score:      {:.1}%", score),
            None => "Data Quality Score:      n/a".to_string(),
        });

        lines.join("\n")
    }
}
