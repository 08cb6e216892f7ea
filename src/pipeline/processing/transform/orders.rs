use crate::pipeline::processing::normalize::parse_date;
use crate::types::{EntityType, RawRecord};

use super::EntityTransformer;

/// Alternate source field names and their canonical replacements
const FIELD_RENAMES: [(&str, &str); 2] = [("transaction_id", "order_id"), ("transaction_date", "order_date")];

/// Fields without which an order row is dropped
const CRITICAL_FIELDS: [&str; 2] = ["order_id", "customer_id"];

/// Orders: rename transaction fields, parse order dates, drop rows without
/// an order or customer id.
pub struct OrderTransformer;

impl EntityTransformer for OrderTransformer {
    fn entity(&self) -> EntityType {
        EntityType::Orders
    }

    fn reshape(&self, record: &mut RawRecord) {
        for (from, to) in FIELD_RENAMES {
            record.rename_field(from, to);
        }
    }

    fn normalize(&self, record: &mut RawRecord, _row_index: usize) {
        if record.contains("order_date") {
            let date = parse_date(record.get("order_date"));
            record.insert("order_date", date);
        }
    }

    fn keep(&self, record: &RawRecord) -> bool {
        CRITICAL_FIELDS.iter().all(|f| !record.get(f).is_null())
    }
}
