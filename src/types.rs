use crate::constants;
use crate::error::EtlError;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Cell tokens the record source reads as missing values
const MISSING_TOKENS: [&str; 13] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

static NULL: FieldValue = FieldValue::Null;

/// A single scalar cell. `Null` is the sentinel for absent or unrecoverable values.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Type a raw tabular cell: missing tokens become `Null`, then integer,
    /// then finite float, otherwise the text is kept as-is.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return FieldValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => FieldValue::Float(f),
            _ => FieldValue::Text(cell.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Plain-text view of the scalar used by the field normalizers.
    /// Integral floats render without a fractional part so that a phone number
    /// read as `9876543210.0` still yields its digits only.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(integral_f64(*f).map_or_else(|| f.to_string(), |i| i.to_string())),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Canonical encoding used when fingerprinting a row. Integers and integral
    /// floats encode the same way so `5` and `5.0` compare equal.
    fn canonical(&self) -> String {
        match self {
            FieldValue::Null => "z:".to_string(),
            FieldValue::Integer(i) => format!("n:{}", i),
            FieldValue::Float(f) => match integral_f64(*f) {
                Some(i) => format!("n:{}", i),
                None => format!("n:{:?}", f),
            },
            FieldValue::Text(s) => format!("s:{}", s),
            FieldValue::Date(d) => format!("d:{}", d),
        }
    }
}

fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) if integral_f64(*x).is_some() => write!(f, "{:.1}", x),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// An unvalidated input row: field name to scalar, in source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: IndexMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `field`, or `Null` when the field is absent.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Rename `from` to `to` in place, keeping the column position. Does nothing
    /// when `from` is absent or `to` already exists.
    pub fn rename_field(&mut self, from: &str, to: &str) -> bool {
        if self.fields.contains_key(to) {
            return false;
        }
        match self.fields.get_index_of(from) {
            Some(idx) => {
                let fields = std::mem::take(&mut self.fields);
                self.fields = fields
                    .into_iter()
                    .enumerate()
                    .map(|(i, (k, v))| if i == idx { (to.to_string(), v) } else { (k, v) })
                    .collect();
                true
            }
            None => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// SHA-256 over the canonical encoding of every (field, value) pair.
    /// Two rows share a fingerprint exactly when all their fields are equal.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (k, v) in &self.fields {
            hasher.update(k.as_bytes());
            hasher.update([0x1f]);
            hasher.update(v.canonical().as_bytes());
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }

    pub(crate) fn into_clean(self) -> CleanRecord {
        CleanRecord { fields: self.fields }
    }
}

/// A row after normalization, defaulting and validation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    fields: IndexMap<String, FieldValue>,
}

impl CleanRecord {
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

/// The three tabular entity types handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Customers,
    Products,
    Orders,
}

impl EntityType {
    pub fn all() -> [EntityType; 3] {
        [EntityType::Customers, EntityType::Products, EntityType::Orders]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customers => constants::CUSTOMERS,
            EntityType::Products => constants::PRODUCTS,
            EntityType::Orders => constants::ORDERS,
        }
    }

    pub fn raw_file(&self) -> &'static str {
        match self {
            EntityType::Customers => constants::CUSTOMERS_RAW_FILE,
            EntityType::Products => constants::PRODUCTS_RAW_FILE,
            EntityType::Orders => constants::ORDERS_RAW_FILE,
        }
    }

    pub fn clean_file(&self) -> &'static str {
        match self {
            EntityType::Customers => constants::CUSTOMERS_CLEAN_FILE,
            EntityType::Products => constants::PRODUCTS_CLEAN_FILE,
            EntityType::Orders => constants::ORDERS_CLEAN_FILE,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            constants::CUSTOMERS => Ok(EntityType::Customers),
            constants::PRODUCTS => Ok(EntityType::Products),
            constants::ORDERS | "sales" => Ok(EntityType::Orders),
            other => Err(EtlError::UnknownEntity(format!(
                "{} (expected one of: {})",
                other,
                constants::get_supported_entities().join(", ")
            ))),
        }
    }
}
