use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EtlError, Result};

/// A flat JSON object, the unit every query and aggregation stage works on
pub type Row = Map<String, Value>;

/// Anything a predicate or projection can read fields from.
/// Paths may be dotted (`specifications.brand`) to reach nested objects.
pub trait FieldLookup {
    fn lookup(&self, path: &str) -> Option<Value>;
}

impl FieldLookup for Row {
    fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

/// One customer review embedded in a product document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// 1 to 5 when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    /// Build a review for appending; ratings outside 1..=5 are rejected
    pub fn try_new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&rating) {
            return Err(EtlError::InvalidReview(format!(
                "rating {} is outside {}..={}",
                rating,
                Self::MIN_RATING,
                Self::MAX_RATING
            )));
        }
        Ok(Self {
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            rating: Some(rating),
            comment: Some(comment.into()),
            date: Some(date.format("%Y-%m-%d").to_string()),
            extra: Map::new(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut row = Row::new();
        insert_opt(&mut row, "user_id", self.user_id.clone().map(Value::from));
        insert_opt(&mut row, "username", self.username.clone().map(Value::from));
        insert_opt(&mut row, "rating", self.rating.map(Value::from));
        insert_opt(&mut row, "comment", self.comment.clone().map(Value::from));
        insert_opt(&mut row, "date", self.date.clone().map(Value::from));
        row.extend(self.extra.clone());
        Value::Object(row)
    }
}

/// A product document: a few typed, optional fields plus an open bag for the rest.
/// Typed getters return `None` for absent fields instead of a JSON null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reviews: Option<Vec<Review>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Document {
    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn stock(&self) -> Option<i64> {
        self.stock
    }

    /// Reviews in insertion order; empty when the document has none
    pub fn reviews(&self) -> &[Review] {
        self.reviews.as_deref().unwrap_or(&[])
    }

    /// A field outside the typed set, e.g. `subcategory` or `tags`
    pub fn extra(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }

    /// Append to `reviews`, creating the sequence when absent
    pub(crate) fn push_review(&mut self, review: Review) {
        self.reviews.get_or_insert_with(Vec::new).push(review);
    }

    /// Flatten into a row: typed fields first, then the open bag
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        insert_opt(&mut row, "product_id", self.product_id.clone().map(Value::from));
        insert_opt(&mut row, "name", self.name.clone().map(Value::from));
        insert_opt(&mut row, "category", self.category.clone().map(Value::from));
        insert_opt(&mut row, "price", self.price.map(Value::from));
        insert_opt(&mut row, "stock", self.stock.map(Value::from));
        insert_opt(
            &mut row,
            "reviews",
            self.reviews
                .as_ref()
                .map(|reviews| Value::Array(reviews.iter().map(Review::to_value).collect())),
        );
        for (k, v) in &self.extra {
            row.insert(k.clone(), v.clone());
        }
        row
    }
}

impl FieldLookup for Document {
    fn lookup(&self, path: &str) -> Option<Value> {
        let head = path.split('.').next().unwrap_or(path);
        let value = match head {
            "product_id" => self.product_id.clone().map(Value::from),
            "name" => self.name.clone().map(Value::from),
            "category" => self.category.clone().map(Value::from),
            "price" => self.price.map(Value::from),
            "stock" => self.stock.map(Value::from),
            _ => None,
        };
        match value {
            Some(v) if head == path => Some(v),
            // nested paths and the open bag go through the row view
            _ => self.to_row().lookup(path),
        }
    }
}

fn insert_opt(row: &mut Row, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        row.insert(key.to_string(), v);
    }
}
