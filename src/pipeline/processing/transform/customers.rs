use crate::constants::{EMAIL_DOMAIN, EMAIL_FALLBACK_FIRST_NAME};
use crate::pipeline::processing::normalize::{normalize_phone, parse_date};
use crate::types::{EntityType, FieldValue, RawRecord};

use super::EntityTransformer;

/// Customers: standardize phones, synthesize missing emails, parse registration dates.
/// Rows are never dropped; missing fields are patched instead.
pub struct CustomerTransformer;

impl CustomerTransformer {
    /// `{first}.{last}@fleximart.com`, lower-cased, falling back to `customer`
    /// for the first name and the source row index for the last name.
    pub fn default_email(record: &RawRecord, row_index: usize) -> String {
        let first = record
            .get("first_name")
            .to_text()
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| EMAIL_FALLBACK_FIRST_NAME.to_string());
        let last = record
            .get("last_name")
            .to_text()
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| row_index.to_string());
        format!("{}.{}@{}", first, last, EMAIL_DOMAIN)
    }
}

impl EntityTransformer for CustomerTransformer {
    fn entity(&self) -> EntityType {
        EntityType::Customers
    }

    fn normalize(&self, record: &mut RawRecord, row_index: usize) {
        if record.contains("phone") {
            let phone = normalize_phone(record.get("phone"));
            record.insert("phone", phone);
        }

        if record.get("email").is_null() {
            let email = Self::default_email(record, row_index);
            record.insert("email", email);
        }

        if record.contains("registration_date") {
            let date = parse_date(record.get("registration_date"));
            record.insert("registration_date", date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::transform::run_transform;
    use chrono::NaiveDate;

    fn customer(id: &str, first: Option<&str>, last: Option<&str>, email: Option<&str>, phone: Option<&str>, date: Option<&str>) -> RawRecord {
        RawRecord::from_pairs([
            ("customer_id", FieldValue::from(id)),
            ("first_name", first.into()),
            ("last_name", last.into()),
            ("email", email.into()),
            ("phone", phone.into()),
            ("city", "Mumbai".into()),
            ("registration_date", date.into()),
        ])
    }

    #[test]
    fn test_customers_are_cleaned() {
        let raw = vec![
            customer("C001", Some("Rahul"), Some("Sharma"), Some("rahul@example.com"), Some("98765-43210"), Some("2023-01-15")),
            customer("C002", Some("Priya"), Some("Patel"), None, Some("+91 9876543211"), Some("15/02/2023")),
            customer("C001", Some("Rahul"), Some("Sharma"), Some("rahul@example.com"), Some("98765-43210"), Some("2023-01-15")),
            customer("C003", None, None, None, Some("12345"), Some("sometime")),
        ];
        let out = run_transform(&CustomerTransformer, raw);

        assert_eq!(out.counters.processed, 4);
        assert_eq!(out.counters.duplicates, 1);
        assert_eq!(out.counters.loaded, 3);

        let first = &out.records[0];
        assert_eq!(first.get("phone").as_str(), Some("+91-9876543210"));
        assert_eq!(first.get("registration_date").as_date(), NaiveDate::from_ymd_opt(2023, 1, 15));

        let second = &out.records[1];
        assert_eq!(second.get("email").as_str(), Some("priya.patel@fleximart.com"));
        assert_eq!(second.get("registration_date").as_date(), NaiveDate::from_ymd_opt(2023, 2, 15));

        // row index 3 in the source, before deduplication
        let third = &out.records[2];
        assert_eq!(third.get("email").as_str(), Some("customer.3@fleximart.com"));
        assert!(third.get("phone").is_null());
        assert!(third.get("registration_date").is_null());
    }

    #[test]
    fn test_missing_fixed_is_net_null_delta() {
        // before: one missing email + two missing names = 3
        // after: email filled, bad phone and bad date become absent, names stay = 4
        let raw = vec![customer("C009", None, None, None, Some("123"), Some("bad"))];
        let out = run_transform(&CustomerTransformer, raw);
        assert_eq!(out.counters.missing_fixed, 3 - 4);
    }

    #[test]
    fn test_customers_are_never_dropped() {
        let raw = vec![RawRecord::from_pairs([("customer_id", FieldValue::Null)])];
        let out = run_transform(&CustomerTransformer, raw);
        assert_eq!(out.counters.loaded, 1);
        assert_eq!(out.records[0].get("email").as_str(), Some("customer.0@fleximart.com"));
    }
}
