use tracing::warn;

use crate::observability::metrics;
use crate::pipeline::processing::normalize::normalize_category;
use crate::types::{EntityType, FieldValue, RawRecord};

use super::EntityTransformer;

/// Products: standardize categories, default stock to an integer zero, and
/// drop rows without a price.
pub struct ProductTransformer;

impl ProductTransformer {
    /// Integer stock quantity. Missing stock is `0`; floats truncate toward zero.
    pub fn coerce_stock(raw: &FieldValue) -> i64 {
        match raw {
            FieldValue::Null => 0,
            FieldValue::Integer(i) => *i,
            FieldValue::Float(f) => f.trunc() as i64,
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                    .unwrap_or_else(|| {
                        warn!(value = %s, "Could not interpret stock quantity, defaulting to 0");
                        metrics::transform::unparseable_value("stock_quantity");
                        0
                    })
            }
            FieldValue::Date(_) => {
                warn!("Stock quantity holds a date, defaulting to 0");
                metrics::transform::unparseable_value("stock_quantity");
                0
            }
        }
    }
}

impl EntityTransformer for ProductTransformer {
    fn entity(&self) -> EntityType {
        EntityType::Products
    }

    fn normalize(&self, record: &mut RawRecord, _row_index: usize) {
        if record.contains("category") {
            let category = normalize_category(record.get("category"));
            record.insert("category", category);
        }

        if record.contains("stock_quantity") {
            let stock = Self::coerce_stock(record.get("stock_quantity"));
            record.insert("stock_quantity", stock);
        }
    }

    fn keep(&self, record: &RawRecord) -> bool {
        !record.get("price").is_null()
    }
}
