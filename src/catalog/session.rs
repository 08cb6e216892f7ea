//! The reference catalog session: load, query, rate, append a review, group

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::{info, instrument};

use super::aggregate::{CategorySummary, RatingSummary};
use super::document::{Review, Row};
use super::query::{Predicate, Projection};
use super::store::{AppendOutcome, DocumentStore};
use crate::app::ports::DocumentSource;
use crate::config::CatalogConfig;
use crate::error::{EtlError, Result};

/// The review appended when none is supplied
pub fn reference_review() -> Result<Review> {
    let date = NaiveDate::from_ymd_opt(2024, 3, 30)
        .ok_or_else(|| EtlError::InvalidReview("invalid review date".to_string()))?;
    Review::try_new(
        "U999",
        "CodeReviewer",
        4,
        "Excellent value for money! Highly recommended.",
        date,
    )
}

/// Everything one session produced, ready for rendering or serialization
#[derive(Debug, Clone, Serialize)]
pub struct CatalogResults {
    pub generated_at: DateTime<Local>,
    pub source: String,
    pub documents_loaded: usize,
    pub query_category: String,
    pub max_price: f64,
    pub query_results: Vec<Row>,
    pub min_rating: f64,
    pub top_rated: Vec<RatingSummary>,
    pub review: AppendOutcome,
    pub categories: Vec<CategorySummary>,
    pub total_documents: usize,
}

pub struct CatalogSession {
    settings: CatalogConfig,
    review: Review,
}

impl CatalogSession {
    pub fn new(settings: CatalogConfig) -> Result<Self> {
        Ok(Self {
            settings,
            review: reference_review()?,
        })
    }

    pub fn with_review(mut self, review: Review) -> Self {
        self.review = review;
        self
    }

    pub fn settings(&self) -> &CatalogConfig {
        &self.settings
    }

    /// The conjunctive category/price filter for this session
    pub fn predicate(&self) -> Predicate {
        Predicate::eq("category", self.settings.query_category.as_str())
            .and(Predicate::lt("price", self.settings.max_price))
    }

    pub fn projection() -> Projection {
        Projection::new(["name", "price", "stock"])
    }

    /// Run the five operations in order against `store`. Only the load can
    /// fail; a missing review target is reported in the results.
    #[instrument(skip_all, fields(source = %source.describe()))]
    pub fn run(&self, store: &mut DocumentStore, source: &dyn DocumentSource) -> Result<CatalogResults> {
        info!("🚀 Starting catalog session");
        let documents_loaded = store.load_from(source)?;

        let predicate = self.predicate();
        let projection = Self::projection();
        let query_results: Vec<Row> = store.filter_project(&predicate, &projection).collect();
        info!(
            "Found {} {} products under {}",
            query_results.len(),
            self.settings.query_category,
            self.settings.max_price
        );

        let top_rated = store.rating_aggregation_at(self.settings.min_rating)?;
        info!("Found {} products rated {} or above", top_rated.len(), self.settings.min_rating);

        let review = store.append_review(&self.settings.review_product_id, self.review.clone());

        let categories = store.category_aggregation()?;
        info!("✅ Catalog session finished: {} categories", categories.len());

        Ok(CatalogResults {
            generated_at: Local::now(),
            source: source.describe(),
            documents_loaded,
            query_category: self.settings.query_category.clone(),
            max_price: self.settings.max_price,
            query_results,
            min_rating: self.settings.min_rating,
            top_rated,
            review,
            categories,
            total_documents: store.len(),
        })
    }
}
