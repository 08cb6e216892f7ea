// Product catalog: an in-memory document store with filter, aggregation and update operations

pub mod aggregate;
pub mod document;
pub mod query;
pub mod report;
pub mod session;
pub mod store;

pub use aggregate::{AggregationPipeline, CategorySummary, Expr, RatingSummary, Stage};
pub use document::{Document, FieldLookup, Review, Row};
pub use query::{CompareOp, Predicate, Projection};
pub use session::{CatalogResults, CatalogSession};
pub use store::{AppendOutcome, DocumentStore, FileDocumentSource};
