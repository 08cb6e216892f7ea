/// Entity names used on the command line, in file names and in the quality report
pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const ORDERS: &str = "orders";

// Raw input files, relative to the data directory
pub const CUSTOMERS_RAW_FILE: &str = "customers_raw.csv";
pub const PRODUCTS_RAW_FILE: &str = "products_raw.csv";
pub const ORDERS_RAW_FILE: &str = "sales_raw.csv";

// Cleaned output files, relative to the output directory
pub const CUSTOMERS_CLEAN_FILE: &str = "customers_cleaned.csv";
pub const PRODUCTS_CLEAN_FILE: &str = "products_cleaned.csv";
pub const ORDERS_CLEAN_FILE: &str = "orders_cleaned.csv";
pub const QUALITY_REPORT_FILE: &str = "data_quality_report.txt";
pub const METRICS_SNAPSHOT_FILE: &str = "metrics.prom";

// Catalog session outputs
pub const CATALOG_RESULTS_TEXT_FILE: &str = "mongodb_results.txt";
pub const CATALOG_RESULTS_JSON_FILE: &str = "catalog_results.json";

// Normalization literals
pub const PHONE_COUNTRY_PREFIX: &str = "+91-";
pub const PHONE_SIGNIFICANT_DIGITS: usize = 10;
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const EMAIL_DOMAIN: &str = "fleximart.com";
pub const EMAIL_FALLBACK_FIRST_NAME: &str = "customer";

/// Date formats tried in order; the first successful parse wins, so day-first
/// beats month-first on ambiguous slash dates.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%m/%d/%Y"];

/// Group key used by the category aggregation for documents without a category
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Get all supported entity names, in pipeline order
pub fn get_supported_entities() -> Vec<&'static str> {
    vec![CUSTOMERS, PRODUCTS, ORDERS]
}
