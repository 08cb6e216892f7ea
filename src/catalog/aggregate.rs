//! Aggregation pipelines as ordered lists of stages over rows.
//!
//! Each stage consumes the rows produced by the previous one. The two
//! reference aggregations (`rating_pipeline`, `category_pipeline`) are built
//! from the same stages rather than from bespoke loops.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::document::{FieldLookup, Row};
use super::query::{order_values, Predicate, Projection};
use crate::constants::UNKNOWN_CATEGORY;

/// A value computed from a row
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The field's value; absent stays absent
    Field(String),
    /// The field's value, or `default` when absent or null
    FieldOr(String, Value),
    Literal(Value),
    /// Mean of `field` over the objects in `array`; elements without the
    /// field count as 0, an absent or empty array yields `default`
    AvgOf {
        array: String,
        field: String,
        default: f64,
    },
    /// Length of `array`, 0 when absent
    SizeOf(String),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    pub fn field_or(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Expr::FieldOr(name.into(), default.into())
    }

    pub fn eval(&self, row: &Row) -> Option<Value> {
        match self {
            Expr::Field(name) => row.lookup(name),
            Expr::FieldOr(name, default) => match row.lookup(name) {
                Some(Value::Null) | None => Some(default.clone()),
                found => found,
            },
            Expr::Literal(value) => Some(value.clone()),
            Expr::AvgOf { array, field, default } => {
                let items = row.lookup(array);
                let items = items.as_ref().and_then(Value::as_array);
                let avg = match items {
                    Some(items) if !items.is_empty() => {
                        let total: f64 = items
                            .iter()
                            .map(|item| item.get(field).and_then(Value::as_f64).unwrap_or(0.0))
                            .sum();
                        total / items.len() as f64
                    }
                    _ => *default,
                };
                Some(Value::from(avg))
            }
            Expr::SizeOf(array) => {
                let len = row
                    .lookup(array)
                    .as_ref()
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                Some(Value::from(len))
            }
        }
    }
}

/// Group accumulators. Only numeric inputs are accumulated; a group with
/// no numeric input yields 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Avg(Expr),
    Min(Expr),
    Max(Expr),
    /// Stays an integer while every input is an integer, saturating at the
    /// `i64` bounds
    Sum(Expr),
    Count,
}

#[derive(Debug, Clone, Default)]
struct AccState {
    count: u64,
    numeric: u64,
    int_sum: i64,
    float_sum: f64,
    all_ints: bool,
    min: Option<Value>,
    max: Option<Value>,
}

impl AccState {
    fn new() -> Self {
        Self {
            all_ints: true,
            ..Self::default()
        }
    }

    fn push(&mut self, value: Option<Value>) {
        self.count += 1;
        let Some(value) = value.filter(Value::is_number) else {
            return;
        };
        self.numeric += 1;
        match value.as_i64() {
            Some(i) if self.all_ints => self.int_sum = self.int_sum.saturating_add(i),
            _ => self.all_ints = false,
        }
        self.float_sum += value.as_f64().unwrap_or(0.0);
        if self.min.as_ref().map_or(true, |m| order_values(&value, m) == Some(Ordering::Less)) {
            self.min = Some(value.clone());
        }
        if self.max.as_ref().map_or(true, |m| order_values(&value, m) == Some(Ordering::Greater)) {
            self.max = Some(value);
        }
    }

    fn finish(&self, acc: &Accumulator) -> Value {
        match acc {
            Accumulator::Count => Value::from(self.count),
            Accumulator::Avg(_) if self.numeric == 0 => Value::from(0.0),
            Accumulator::Avg(_) => Value::from(self.float_sum / self.numeric as f64),
            Accumulator::Sum(_) if self.all_ints => Value::from(self.int_sum),
            Accumulator::Sum(_) => Value::from(self.float_sum),
            Accumulator::Min(_) => self.min.clone().unwrap_or_else(|| Value::from(0)),
            Accumulator::Max(_) => self.max.clone().unwrap_or_else(|| Value::from(0)),
        }
    }
}

impl Accumulator {
    fn input(&self, row: &Row) -> Option<Value> {
        match self {
            Accumulator::Avg(e) | Accumulator::Min(e) | Accumulator::Max(e) | Accumulator::Sum(e) => e.eval(row),
            Accumulator::Count => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub key: Expr,
    /// Output field holding the group key
    pub key_name: String,
    pub accumulators: Vec<(String, Accumulator)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    AddField { name: String, expr: Expr },
    Match(Predicate),
    /// Stable; absent and null sort lowest
    Sort { field: String, descending: bool },
    Project(Projection),
    /// Groups come out in order of first appearance
    Group(GroupSpec),
}

impl Stage {
    fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        match self {
            Stage::AddField { name, expr } => rows
                .into_iter()
                .map(|mut row| {
                    if let Some(value) = expr.eval(&row) {
                        row.insert(name.clone(), value);
                    }
                    row
                })
                .collect(),
            Stage::Match(predicate) => rows.into_iter().filter(|row| predicate.matches(row)).collect(),
            Stage::Sort { field, descending } => {
                let mut rows = rows;
                rows.sort_by(|a, b| {
                    let ord = sort_cmp(a.lookup(field).as_ref(), b.lookup(field).as_ref());
                    if *descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
                rows
            }
            Stage::Project(projection) => rows.iter().map(|row| projection.apply(row)).collect(),
            Stage::Group(spec) => group(spec, rows),
        }
    }
}

fn group(spec: &GroupSpec, rows: Vec<Row>) -> Vec<Row> {
    let mut groups: IndexMap<String, (Value, Vec<AccState>)> = IndexMap::new();
    for row in &rows {
        let key = spec.key.eval(row).unwrap_or(Value::Null);
        let (_, states) = groups
            .entry(key.to_string())
            .or_insert_with(|| (key.clone(), vec![AccState::new(); spec.accumulators.len()]));
        for (state, (_, acc)) in states.iter_mut().zip(&spec.accumulators) {
            state.push(acc.input(row));
        }
    }

    groups
        .into_values()
        .map(|(key, states)| {
            let mut out = Row::new();
            out.insert(spec.key_name.clone(), key);
            for (state, (name, acc)) in states.iter().zip(&spec.accumulators) {
                out.insert(name.clone(), state.finish(acc));
            }
            out
        })
        .collect()
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(_) => 3,
    }
}

fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => order_values(x, y).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// An ordered list of stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationPipeline {
    stages: Vec<Stage>,
}

impl AggregationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn add_field(self, name: impl Into<String>, expr: Expr) -> Self {
        self.stage(Stage::AddField { name: name.into(), expr })
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        self.stage(Stage::Match(predicate))
    }

    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.stage(Stage::Sort {
            field: field.into(),
            descending: true,
        })
    }

    pub fn project<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        self.stage(Stage::Project(Projection::new(fields)))
    }

    pub fn group(self, spec: GroupSpec) -> Self {
        self.stage(Stage::Group(spec))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(&self, rows: Vec<Row>) -> Vec<Row> {
        self.stages.iter().fold(rows, |rows, stage| stage.apply(rows))
    }
}

/// Products whose mean review rating is at least `min_rating`, best first
pub fn rating_pipeline(min_rating: f64) -> AggregationPipeline {
    AggregationPipeline::new()
        .add_field(
            "average_rating",
            Expr::AvgOf {
                array: "reviews".into(),
                field: "rating".into(),
                default: 0.0,
            },
        )
        .add_field("review_count", Expr::SizeOf("reviews".into()))
        .filter(Predicate::gte("average_rating", min_rating))
        .sort_desc("average_rating")
        .project(["name", "average_rating", "review_count"])
}

/// Price and stock statistics per category, most expensive category first
pub fn category_pipeline() -> AggregationPipeline {
    let price = || Expr::field_or("price", 0);
    AggregationPipeline::new()
        .group(GroupSpec {
            key: Expr::field_or("category", UNKNOWN_CATEGORY),
            key_name: "category".into(),
            accumulators: vec![
                ("avg_price".into(), Accumulator::Avg(price())),
                ("min_price".into(), Accumulator::Min(price())),
                ("max_price".into(), Accumulator::Max(price())),
                ("product_count".into(), Accumulator::Count),
                ("total_stock".into(), Accumulator::Sum(Expr::field_or("stock", 0))),
            ],
        })
        .sort_desc("avg_price")
        .project([
            "category",
            "avg_price",
            "min_price",
            "max_price",
            "product_count",
            "total_stock",
        ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(default)]
    pub name: Option<String>,
    pub average_rating: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(deserialize_with = "key_as_text")]
    pub category: String,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub product_count: u64,
    pub total_stock: i64,
}

// Group keys can be any JSON value; non-strings are shown as JSON text
fn key_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}
