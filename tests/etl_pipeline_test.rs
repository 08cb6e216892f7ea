use anyhow::Result;
use fleximart::pipeline::ingestion::CsvRecordSource;
use fleximart::pipeline::storage::CsvRecordSink;
use fleximart::pipeline::EtlPipeline;
use fleximart::types::EntityType;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CUSTOMERS_CSV: &str = "\
customer_id,first_name,last_name,email,phone,city,registration_date
C001,Rahul,Sharma,rahul.sharma@gmail.com,9876543210,Bangalore,2023-01-15
C002,Priya,Patel,,+91-9988776655,Mumbai,05/02/2023
C003,Amit,Kumar,amit.kumar@yahoo.com,98765-43211,Delhi,03-20-2023
C001,Rahul,Sharma,rahul.sharma@gmail.com,9876543210,Bangalore,2023-01-15
C004,Sneha,Reddy,sneha.r@gmail.com,12345,Hyderabad,not a date
";

const PRODUCTS_CSV: &str = "\
product_id,product_name,category,price,stock_quantity
P001,Samsung Galaxy S21,electronics,45999.00,150
P002,Nike Running Shoes,FASHION,3499.00,
P003,Apple MacBook Pro,Electronics,,45
P004,Basmati Rice 5kg,  groceries ,650.00,300
";

const SALES_CSV: &str = "\
transaction_id,customer_id,product_id,quantity,unit_price,transaction_date,status
T001,C001,P001,1,45999.00,2024-01-15,Completed
T002,C002,P002,2,3499.00,15/01/2024,Completed
T003,,P004,1,650.00,2024-01-16,Pending
T004,C003,P001,1,45999.00,01/20/2024,Completed
T001,C001,P001,1,45999.00,2024-01-15,Completed
";

fn write_raw_files(dir: &Path) -> Result<()> {
    fs::write(dir.join("customers_raw.csv"), CUSTOMERS_CSV)?;
    fs::write(dir.join("products_raw.csv"), PRODUCTS_CSV)?;
    fs::write(dir.join("sales_raw.csv"), SALES_CSV)?;
    Ok(())
}

#[test]
fn test_full_etl_run_over_csv_files() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_dir = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&data_dir)?;
    write_raw_files(&data_dir)?;

    let source = CsvRecordSource::new(&data_dir);
    let mut sink = CsvRecordSink::new(&output_dir);
    let result = EtlPipeline::new().run(&source, &mut sink)?;

    // Customers: one exact duplicate, nobody dropped
    let customers = result.report.counters(EntityType::Customers).expect("customers counted");
    assert_eq!(customers.processed, 5);
    assert_eq!(customers.duplicates, 1);
    assert_eq!(customers.loaded, 4);

    let cleaned = result.records(EntityType::Customers);
    assert_eq!(cleaned[0].get("phone").as_str(), Some("+91-9876543210"));
    assert_eq!(cleaned[1].get("email").as_str(), Some("priya.patel@fleximart.com"));
    assert_eq!(cleaned[1].get("registration_date").to_string(), "2023-02-05");
    assert_eq!(cleaned[2].get("phone").as_str(), Some("+91-9876543211"));
    assert_eq!(cleaned[2].get("registration_date").to_string(), "2023-03-20");
    assert!(cleaned[3].get("phone").is_null());
    assert!(cleaned[3].get("registration_date").is_null());

    // Products: the row without a price is dropped
    let products = result.records(EntityType::Products);
    assert_eq!(products.len(), 3);
    assert_eq!(products[0].get("category").as_str(), Some("Electronics"));
    assert_eq!(products[1].get("category").as_str(), Some("Fashion"));
    assert_eq!(products[1].get("stock_quantity").as_i64(), Some(0));
    assert_eq!(products[2].get("category").as_str(), Some("Groceries"));

    // Orders: renamed, deduplicated, the row without a customer dropped
    let orders = result.report.counters(EntityType::Orders).expect("orders counted");
    assert_eq!(orders.processed, 5);
    assert_eq!(orders.duplicates, 1);
    assert_eq!(orders.loaded, 3);
    let order_rows = result.records(EntityType::Orders);
    assert_eq!(order_rows[0].get("order_id").as_str(), Some("T001"));
    assert_eq!(order_rows[1].get("order_date").to_string(), "2024-01-15");
    assert_eq!(order_rows[2].get("order_date").to_string(), "2024-01-20");

    // Output files
    let customers_csv = fs::read_to_string(output_dir.join("customers_cleaned.csv"))?;
    assert!(customers_csv.starts_with("customer_id,first_name,last_name,email,phone,city,registration_date"));
    assert_eq!(customers_csv.lines().count(), 5);

    let orders_csv = fs::read_to_string(output_dir.join("orders_cleaned.csv"))?;
    assert!(orders_csv.starts_with("order_id,customer_id,product_id"));
    assert!(orders_csv.contains("order_date"));
    assert!(!orders_csv.contains("transaction_id"));

    let report = fs::read_to_string(output_dir.join("data_quality_report.txt"))?;
    assert!(report.contains("FLEXIMART ETL DATA QUALITY REPORT"));
    assert!(report.contains("CUSTOMERS"));
    assert!(report.contains("Total Records Processed: 14"));
    assert!(report.contains("Total Records Loaded:    10"));

    Ok(())
}

#[test]
fn test_missing_source_file_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_dir = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join("customers_raw.csv"), CUSTOMERS_CSV)?;

    let source = CsvRecordSource::new(&data_dir);
    let mut sink = CsvRecordSink::new(&output_dir);
    let err = EtlPipeline::new().run(&source, &mut sink).unwrap_err();

    assert!(err.is_not_found());
    assert!(!output_dir.exists());
    Ok(())
}

#[test]
fn test_ragged_csv_is_a_format_error() -> Result<()> {
    let temp_dir = tempdir()?;
    write_raw_files(temp_dir.path())?;
    fs::write(
        temp_dir.path().join("products_raw.csv"),
        "product_id,price\nP001,10.0,extra\n",
    )?;

    let source = CsvRecordSource::new(temp_dir.path());
    let mut sink = CsvRecordSink::new(temp_dir.path().join("out"));
    let err = EtlPipeline::new().run(&source, &mut sink).unwrap_err();

    assert!(matches!(err, fleximart::EtlError::Format(_)));
    Ok(())
}
