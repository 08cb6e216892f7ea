//! In-memory product collection with document-store style queries.
//!
//! The store is either `Empty` (before any load, or after a failed one) or
//! `Loaded`. Queries against an empty store return empty results; a review
//! append against it reports the product as not found.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use super::aggregate::{category_pipeline, rating_pipeline, AggregationPipeline, CategorySummary, RatingSummary};
use super::document::{Document, Review, Row};
use super::query::{Predicate, Projection};
use crate::app::ports::DocumentSource;
use crate::error::{EtlError, Result};
use crate::observability::metrics;

/// Rating threshold used by the reference rating aggregation
pub const DEFAULT_MIN_RATING: f64 = 4.0;

#[derive(Debug, Default)]
enum CollectionState {
    #[default]
    Empty,
    Loaded { source: String, documents: Vec<Document> },
}

/// Result of appending a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendOutcome {
    Appended {
        product_id: String,
        before: usize,
        after: usize,
    },
    NotFound {
        product_id: String,
    },
}

impl AppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended { .. })
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    state: CollectionState,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection with the JSON array at `path`
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.load_from(&FileDocumentSource::new(path.as_ref()))
    }

    /// Replace the collection with documents decoded from a JSON array
    pub fn load_bytes(&mut self, source: impl Into<String>, bytes: &[u8]) -> Result<usize> {
        self.state = CollectionState::Empty;
        let documents: Vec<Document> = serde_json::from_slice(bytes).map_err(|e| {
            error!("Invalid JSON document collection: {}", e);
            metrics::catalog::load_error();
            EtlError::Decode(e)
        })?;
        let count = documents.len();
        let source = source.into();
        info!("📦 Loaded {} documents from {}", count, source);
        metrics::catalog::documents_loaded(count);
        self.state = CollectionState::Loaded { source, documents };
        Ok(count)
    }

    #[instrument(skip_all, fields(source = %source.describe()))]
    pub fn load_from(&mut self, source: &dyn DocumentSource) -> Result<usize> {
        self.state = CollectionState::Empty;
        let bytes = source.read_bytes().map_err(|e| {
            error!("Failed to read document source: {}", e);
            metrics::catalog::load_error();
            e
        })?;
        self.load_bytes(source.describe(), &bytes)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, CollectionState::Loaded { .. })
    }

    /// Where the current collection was loaded from
    pub fn source(&self) -> Option<&str> {
        match &self.state {
            CollectionState::Loaded { source, .. } => Some(source),
            CollectionState::Empty => None,
        }
    }

    pub fn documents(&self) -> &[Document] {
        match &self.state {
            CollectionState::Loaded { documents, .. } => documents,
            CollectionState::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    pub fn find_by_product_id(&self, product_id: &str) -> Option<&Document> {
        self.documents().iter().find(|d| d.product_id() == Some(product_id))
    }

    /// Lazily yield every document matching `predicate`, reduced to `projection`
    pub fn filter_project<'a>(
        &'a self,
        predicate: &'a Predicate,
        projection: &'a Projection,
    ) -> impl Iterator<Item = Row> + 'a {
        metrics::catalog::operation("filter_project");
        self.documents()
            .iter()
            .filter(move |doc| predicate.matches(*doc))
            .map(move |doc| projection.apply(doc))
    }

    /// Run an arbitrary pipeline over the flattened documents
    pub fn aggregate(&self, pipeline: &AggregationPipeline) -> Vec<Row> {
        let rows = self.documents().iter().map(Document::to_row).collect();
        pipeline.run(rows)
    }

    pub fn rating_aggregation(&self) -> Result<Vec<RatingSummary>> {
        self.rating_aggregation_at(DEFAULT_MIN_RATING)
    }

    #[instrument(skip(self))]
    pub fn rating_aggregation_at(&self, min_rating: f64) -> Result<Vec<RatingSummary>> {
        metrics::catalog::operation("rating_aggregation");
        let results: Vec<RatingSummary> = decode_rows(self.aggregate(&rating_pipeline(min_rating)))?;
        debug!("{} products rated {} or above", results.len(), min_rating);
        Ok(results)
    }

    /// Append `review` to the first document whose `product_id` matches.
    /// An unknown id leaves the collection untouched.
    #[instrument(skip(self, review))]
    pub fn append_review(&mut self, product_id: &str, review: Review) -> AppendOutcome {
        metrics::catalog::operation("append_review");
        let target = match &mut self.state {
            CollectionState::Loaded { documents, .. } => {
                documents.iter_mut().find(|d| d.product_id() == Some(product_id))
            }
            CollectionState::Empty => None,
        };

        match target {
            Some(doc) => {
                let before = doc.reviews().len();
                doc.push_review(review);
                let after = doc.reviews().len();
                info!("📝 Added review to {} ({} -> {} reviews)", product_id, before, after);
                metrics::catalog::review_appended();
                AppendOutcome::Appended {
                    product_id: product_id.to_string(),
                    before,
                    after,
                }
            }
            None => {
                warn!("Product {} not found, review not added", product_id);
                metrics::catalog::review_target_missing();
                AppendOutcome::NotFound {
                    product_id: product_id.to_string(),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub fn category_aggregation(&self) -> Result<Vec<CategorySummary>> {
        metrics::catalog::operation("category_aggregation");
        let results: Vec<CategorySummary> = decode_rows(self.aggregate(&category_pipeline()))?;
        debug!("{} categories aggregated", results.len());
        Ok(results)
    }
}

/// Every group must decode; a row that does not fit fails the whole aggregation
fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row)).map_err(|source| {
                error!("Aggregation row does not fit {}: {}", std::any::type_name::<T>(), source);
                EtlError::Aggregation {
                    target: std::any::type_name::<T>(),
                    source,
                }
            })
        })
        .collect()
}

/// Reads a JSON document collection from a file
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for FileDocumentSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EtlError::NotFound { path: self.path.clone() },
            _ => EtlError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::tempdir;

    fn store_with(docs: Value) -> DocumentStore {
        let mut store = DocumentStore::new();
        store.load_bytes("test", docs.to_string().as_bytes()).unwrap();
        store
    }

    fn review(rating: u8) -> Review {
        Review::try_new("U999", "CodeReviewer", rating, "Good", NaiveDate::from_ymd_opt(2024, 3, 30).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_store_is_total() {
        let mut store = DocumentStore::new();
        assert!(!store.is_loaded());
        let predicate = Predicate::eq("category", "Electronics");
        let projection = Projection::new(["name"]);
        assert_eq!(store.filter_project(&predicate, &projection).count(), 0);
        assert!(store.rating_aggregation().unwrap().is_empty());
        assert!(store.category_aggregation().unwrap().is_empty());
        assert!(!store.append_review("ELEC001", review(4)).is_appended());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new();
        let err = store.load_path(dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_failed_load_leaves_store_empty() {
        let mut store = store_with(json!([{"product_id": "A"}]));
        let err = store.load_bytes("bad", b"{not json").unwrap_err();
        assert!(matches!(err, EtlError::Decode(_)));
        assert!(!store.is_loaded());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_load_replaces_collection() {
        let mut store = store_with(json!([{"product_id": "A"}, {"product_id": "B"}]));
        assert_eq!(store.len(), 2);
        assert_eq!(store.load_bytes("second", br#"[{"product_id": "C"}]"#).unwrap(), 1);
        assert!(store.find_by_product_id("A").is_none());
        assert!(store.find_by_product_id("C").is_some());
        assert_eq!(store.source(), Some("second"));
    }

    #[test]
    fn test_filter_project_reference_query() {
        let store = store_with(json!([
            {"name": "Phone", "category": "Electronics", "price": 79999, "stock": 5},
            {"name": "Earbuds", "category": "Electronics", "price": 1999, "stock": 40},
            {"name": "Shirt", "category": "Fashion", "price": 999, "stock": 10}
        ]));
        let predicate = Predicate::eq("category", "Electronics").and(Predicate::lt("price", 50000));
        let projection = Projection::new(["name", "price", "stock"]);
        let rows: Vec<Row> = store.filter_project(&predicate, &projection).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(Value::Object(rows[0].clone()), json!({"name": "Earbuds", "price": 1999.0, "stock": 40}));
    }

    #[test]
    fn test_append_review_counts() {
        let mut store = store_with(json!([
            {"product_id": "ELEC001", "reviews": [{"rating": 5}]},
            {"product_id": "ELEC002"}
        ]));
        assert_eq!(
            store.append_review("ELEC001", review(4)),
            AppendOutcome::Appended {
                product_id: "ELEC001".into(),
                before: 1,
                after: 2
            }
        );
        assert_eq!(
            store.append_review("ELEC002", review(3)),
            AppendOutcome::Appended {
                product_id: "ELEC002".into(),
                before: 0,
                after: 1
            }
        );
    }

    #[test]
    fn test_append_unknown_product_changes_nothing() {
        let mut store = store_with(json!([
            {"product_id": "ELEC001", "reviews": [{"rating": 5}, {"rating": 2}]},
            {"product_id": "ELEC002", "reviews": []}
        ]));
        let before: Vec<Document> = store.documents().to_vec();
        let outcome = store.append_review("NOPE", review(5));
        assert_eq!(outcome, AppendOutcome::NotFound { product_id: "NOPE".into() });
        assert_eq!(store.documents(), before.as_slice());
    }

    #[test]
    fn test_rating_and_category_summaries() {
        let store = store_with(json!([
            {"name": "one", "category": "A", "price": 10, "stock": 1, "reviews": [{"rating": 5}, {"rating": 3}]},
            {"name": "two", "category": "A", "price": 20, "stock": 2, "reviews": []},
            {"name": "three", "category": "B", "price": 5, "stock": 1, "reviews": [{"rating": 4}, {"rating": 4}]}
        ]));

        let ratings = store.rating_aggregation().unwrap();
        let names: Vec<Option<&str>> = ratings.iter().map(|r| r.name.as_deref()).collect();
        assert_eq!(names, vec![Some("one"), Some("three")]);
        assert_eq!(ratings[0].average_rating, 4.0);
        assert_eq!(ratings[0].review_count, 2);

        let categories = store.category_aggregation().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "A");
        assert_eq!(categories[0].avg_price, 15.0);
        assert_eq!(categories[0].product_count, 2);
        assert_eq!(categories[0].total_stock, 3);
        assert_eq!(categories[1].category, "B");
    }

    #[test]
    fn test_stock_overflow_keeps_every_category() {
        let store = store_with(json!([
            {"name": "big", "category": "A", "price": 10, "stock": i64::MAX},
            {"name": "one more", "category": "A", "price": 20, "stock": 1},
            {"name": "small", "category": "B", "price": 5, "stock": 1}
        ]));
        let categories = store.category_aggregation().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "A");
        assert_eq!(categories[0].total_stock, i64::MAX);
        assert_eq!(categories[1].category, "B");
        assert_eq!(categories[1].total_stock, 1);
    }

    #[test]
    fn test_undecodable_summary_row_is_an_error() {
        let rows = vec![json!({"category": "A", "avg_price": "not a number"}).as_object().cloned().unwrap()];
        let err = decode_rows::<CategorySummary>(rows).unwrap_err();
        assert!(matches!(err, EtlError::Aggregation { .. }));
    }

    #[test]
    fn test_append_outcome_serializes_with_tag() {
        let value = serde_json::to_value(AppendOutcome::NotFound { product_id: "X".into() }).unwrap();
        assert_eq!(value, json!({"outcome": "not_found", "product_id": "X"}));
    }
}
