use anyhow::Result;
use fleximart::catalog::{report, AppendOutcome, CatalogSession, DocumentStore, FileDocumentSource, Predicate, Projection};
use fleximart::config::CatalogConfig;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn catalog_json() -> Value {
    json!([
        {
            "product_id": "ELEC001",
            "name": "Samsung Galaxy S21 Ultra",
            "category": "Electronics",
            "subcategory": "Smartphones",
            "price": 79999.00,
            "stock": 150,
            "specifications": {"brand": "Samsung", "ram": "12GB"},
            "reviews": [
                {"user_id": "U001", "username": "TechGuru", "rating": 5, "comment": "Excellent", "date": "2024-01-15"},
                {"user_id": "U012", "username": "MobileUser", "rating": 4, "comment": "Great camera", "date": "2024-01-22"}
            ],
            "tags": ["flagship", "5G"]
        },
        {
            "product_id": "ELEC002",
            "name": "boAt Airdopes 441",
            "category": "Electronics",
            "price": 1999.00,
            "stock": 300,
            "reviews": [
                {"user_id": "U005", "username": "MusicFan", "rating": 3, "comment": "Okay", "date": "2024-02-01"}
            ]
        },
        {
            "product_id": "FASH001",
            "name": "Levi's 511 Jeans",
            "category": "Fashion",
            "price": 3499.00,
            "stock": 120,
            "reviews": [
                {"user_id": "U007", "username": "StyleIcon", "rating": 4, "comment": "Good fit", "date": "2024-02-10"},
                {"user_id": "U008", "username": "Casual", "rating": 5, "comment": "Love it", "date": "2024-02-12"}
            ]
        },
        {
            "product_id": "MISC001",
            "name": "Mystery Box",
            "price": 500.00
        }
    ])
}

#[test]
fn test_catalog_session_end_to_end() -> Result<()> {
    let temp_dir = tempdir()?;
    let catalog_path = temp_dir.path().join("products_catalog.json");
    fs::write(&catalog_path, serde_json::to_string_pretty(&catalog_json())?)?;

    let session = CatalogSession::new(CatalogConfig {
        products_file: catalog_path.clone(),
        ..CatalogConfig::default()
    })?;
    let mut store = DocumentStore::new();
    let results = session.run(&mut store, &FileDocumentSource::new(&catalog_path))?;

    assert_eq!(results.documents_loaded, 4);
    assert_eq!(results.query_results.len(), 1);
    assert_eq!(
        Value::Object(results.query_results[0].clone()),
        json!({"name": "boAt Airdopes 441", "price": 1999.0, "stock": 300})
    );

    // Both average 4.5; equal averages keep input order
    let rated: Vec<&str> = results.top_rated.iter().filter_map(|r| r.name.as_deref()).collect();
    assert_eq!(rated, vec!["Samsung Galaxy S21 Ultra", "Levi's 511 Jeans"]);

    assert_eq!(
        results.review,
        AppendOutcome::Appended {
            product_id: "ELEC001".into(),
            before: 2,
            after: 3
        }
    );
    let phone = store.find_by_product_id("ELEC001").expect("phone present");
    assert_eq!(phone.reviews().last().and_then(|r| r.username.as_deref()), Some("CodeReviewer"));
    assert_eq!(phone.extra("subcategory"), Some(&json!("Smartphones")));

    let categories: Vec<&str> = results.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(categories, vec!["Electronics", "Fashion", "Unknown"]);
    assert_eq!(results.categories[0].avg_price, 40999.0);
    assert_eq!(results.categories[0].total_stock, 450);
    assert_eq!(results.categories[2].total_stock, 0);

    let (text_path, json_path) = report::write_results(&results, temp_dir.path())?;
    let text = fs::read_to_string(text_path)?;
    assert!(text.contains("Reviews After:  3"));
    let dumped: Value = serde_json::from_str(&fs::read_to_string(json_path)?)?;
    assert_eq!(dumped["documents_loaded"], json!(4));
    assert_eq!(dumped["review"]["outcome"], json!("appended"));

    Ok(())
}

#[test]
fn test_missing_catalog_file_is_not_found() -> Result<()> {
    let temp_dir = tempdir()?;
    let mut store = DocumentStore::new();
    let err = store.load_path(temp_dir.path().join("missing.json")).unwrap_err();
    assert!(err.is_not_found());
    assert!(!store.is_loaded());
    Ok(())
}

#[test]
fn test_nested_field_predicates() -> Result<()> {
    let mut store = DocumentStore::new();
    store.load_bytes("inline", catalog_json().to_string().as_bytes())?;

    let predicate = Predicate::eq("specifications.brand", "Samsung");
    let projection = Projection::new(["product_id", "tags"]);
    let rows: Vec<Value> = store
        .filter_project(&predicate, &projection)
        .map(Value::Object)
        .collect();

    assert_eq!(rows, vec![json!({"product_id": "ELEC001", "tags": ["flagship", "5G"]})]);
    Ok(())
}
