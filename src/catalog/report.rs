//! Human-readable and JSON renderings of a catalog session

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::session::CatalogResults;
use super::store::AppendOutcome;
use crate::constants::{CATALOG_RESULTS_JSON_FILE, CATALOG_RESULTS_TEXT_FILE};
use crate::error::{EtlError, Result};

/// Group the integer part of `amount` in thousands: `1234567.891` with two
/// decimals gives `1,234,567.89`
pub fn format_amount(amount: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

fn rupees(amount: f64, decimals: usize) -> String {
    format!("₹{}", format_amount(amount, decimals))
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn cell(row: &serde_json::Map<String, Value>, field: &str) -> Option<Value> {
    row.get(field).cloned()
}

pub fn render(results: &CatalogResults) -> String {
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);
    let mut lines = vec![
        rule.clone(),
        "FLEXIMART - PRODUCT CATALOG OPERATIONS - RESULTS".to_string(),
        rule.clone(),
        String::new(),
        format!("Generated: {}", results.generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Source: {}", results.source),
        format!("Total Documents: {}", results.total_documents),
        String::new(),
    ];

    lines.push("OPERATION 1: Load Data".to_string());
    lines.push(thin.clone());
    lines.push(format!("Loaded {} products", results.documents_loaded));
    lines.push(String::new());

    lines.push(format!(
        "OPERATION 2: {} under {}",
        results.query_category,
        rupees(results.max_price, 0)
    ));
    lines.push(thin.clone());
    lines.push(format!("Found {} products", results.query_results.len()));
    if !results.query_results.is_empty() {
        lines.push(format!("{:<30} {:>14} {:>10}", "Product Name", "Price", "Stock"));
        for row in &results.query_results {
            let name = cell(row, "name")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "N/A".to_string());
            let price = cell(row, "price").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let stock = cell(row, "stock").and_then(|v| v.as_i64()).unwrap_or(0);
            lines.push(format!("{:<30} {:>14} {:>10}", truncate(&name, 28), rupees(price, 2), stock));
        }
    }
    lines.push(String::new());

    lines.push(format!("OPERATION 3: Average Rating >= {:.1}", results.min_rating));
    lines.push(thin.clone());
    lines.push(format!("Found {} products", results.top_rated.len()));
    if !results.top_rated.is_empty() {
        lines.push(format!("{:<40} {:>12} {:>10}", "Product Name", "Avg Rating", "Reviews"));
        for item in &results.top_rated {
            let name = item.name.as_deref().unwrap_or("N/A");
            lines.push(format!(
                "{:<40} {:>12.2} {:>10}",
                truncate(name, 38),
                item.average_rating,
                item.review_count
            ));
        }
    }
    lines.push(String::new());

    match &results.review {
        AppendOutcome::Appended { product_id, before, after } => {
            lines.push(format!("OPERATION 4: Add Review to Product {}", product_id));
            lines.push(thin.clone());
            lines.push(format!("Reviews Before: {}", before));
            lines.push(format!("Reviews After:  {}", after));
        }
        AppendOutcome::NotFound { product_id } => {
            lines.push(format!("OPERATION 4: Add Review to Product {}", product_id));
            lines.push(thin.clone());
            lines.push(format!("Product {} not found, no review added", product_id));
        }
    }
    lines.push(String::new());

    lines.push("OPERATION 5: Category Analysis".to_string());
    lines.push(thin);
    lines.push(format!("Analysis complete for {} categories", results.categories.len()));
    if !results.categories.is_empty() {
        lines.push(format!(
            "{:<25} {:>15} {:>15} {:>15} {:>9} {:>8}",
            "Category", "Avg Price", "Min Price", "Max Price", "Products", "Stock"
        ));
        for item in &results.categories {
            lines.push(format!(
                "{:<25} {:>15} {:>15} {:>15} {:>9} {:>8}",
                truncate(&item.category, 23),
                rupees(item.avg_price, 0),
                rupees(item.min_price, 0),
                rupees(item.max_price, 0),
                item.product_count,
                item.total_stock
            ));
        }
    }
    lines.push(rule);

    lines.join("\n")
}

/// Write the text rendering and a JSON dump into `output_dir`.
/// Returns the two paths written.
pub fn write_results(results: &CatalogResults, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)?;

    let text_path = output_dir.join(CATALOG_RESULTS_TEXT_FILE);
    fs::write(&text_path, render(results))?;

    let json_path = output_dir.join(CATALOG_RESULTS_JSON_FILE);
    fs::write(&json_path, serde_json::to_string_pretty(results).map_err(EtlError::Encode)?)?;

    info!("💾 Catalog results written to {} and {}", text_path.display(), json_path.display());
    Ok((text_path, json_path))
}
