//! End-to-end import: JSON catalog + CSV input -> documents

use std::collections::HashMap;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use sheetmap::prelude::*;
use sheetmap::{fields, upsert_document, SequentialIdGenerator, MISSING_REQUIRED_FIELD};

const CATALOG: &str = r#"{
  "configs": [
    {
      "platform": "douyin",
      "name": "monthly",
      "rules": [
        {"excelHeader": "Account ID", "targetPath": "account_id", "required": true},
        {"excelHeader": "Nickname", "targetPath": "name", "required": true},
        {"excelHeader": "Fans", "targetPath": "stats.fans", "format": "number"},
        {"excelHeader": "Signed", "targetPath": "signed_at", "format": "date"},
        {"excelHeader": "60s+ Video", "targetPath": "prices", "priceType": "video_60plus", "format": "number"},
        {"excelHeader": "Live", "targetPath": "prices", "priceType": "live", "format": "number"},
        {"excelHeader": "Expected Plays", "targetPath": "metrics.expected_plays", "format": "number", "targetCollection": "secondary"},
        {"excelHeader": "Completion", "targetPath": "metrics.completion_rate", "format": "percentage", "targetCollection": "secondary"}
      ],
      "computedFields": [
        {
          "name": "cpm",
          "targetPath": "metrics.cpm",
          "targetCollection": "secondary",
          "formula": {"expression": "round(prices.video_60plus / metrics.expected_plays * 1000, 2)"}
        },
        {
          "name": "fans_per_plays",
          "targetPath": "metrics.fans_ratio",
          "targetCollection": "secondary",
          "formula": {"type": "division", "operand1": "stats.fans", "operand2": "metrics.expected_plays", "precision": 3}
        }
      ]
    },
    {
      "platform": "kuaishou",
      "name": "contacts",
      "rules": [
        {"excelHeader": "Account", "targetPath": "account_id", "required": true},
        {"excelHeader": "Phone", "targetPath": "contact.phone"},
        {"excelHeader": "Plays", "targetPath": "metrics.plays", "format": "number", "targetCollection": "secondary"}
      ]
    },
    {
      "platform": "xhs",
      "name": "broken",
      "rules": [{"excelHeader": "Name", "targetPath": "name"}],
      "computedFields": [
        {"name": "bad", "targetPath": "score", "formula": {"expression": "name *"}}
      ]
    }
  ]
}"#;

const SHEET: &str = "\
Account ID,Nickname,Fans,Signed,60s+ Video,Live,Expected Plays,Completion
1001,Alice,1.5万,2023/06/01,\"5,000\",800,200000,62.5%
1002,,300,,,,,
,,,,,,,
1003,Bob,2000,,,,,
";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn request(platform: &str, name: &str) -> ImportRequest {
    let context = ImportContext::new(date()).with_key_path("account_id");
    ImportRequest::new(platform, name, PricePeriod::new(2024, 3).unwrap(), context)
}

fn table() -> Vec<sheetmap::RawRow> {
    CsvReader::read(SHEET.as_bytes(), &CsvReadOptions::default()).unwrap()
}

fn import(request: &ImportRequest) -> Result<MappingOutput> {
    let catalog = ConfigCatalog::from_json_str(CATALOG).unwrap();
    catalog.import_with_ids(request, &table(), SequentialIdGenerator::new("snap"))
}

#[test]
fn test_full_import() {
    let output = import(&request("douyin", "monthly")).unwrap();

    assert_eq!(output.valid_data.len(), 2);
    assert_eq!(output.invalid_rows.len(), 1);
    assert_eq!(output.secondary_data.len(), 1);

    let alice = &output.valid_data[0];
    assert_eq!(alice.get("account_id"), Some(&json!("1001")));
    assert_eq!(alice.get_path("stats.fans"), Some(&json!(15000)));
    assert_eq!(alice.get("signed_at"), Some(&json!("2023-06-01")));
    assert_eq!(
        alice.prices(),
        vec![
            PriceRecord::confirmed(2024, 3, "video_60plus", 500_000),
            PriceRecord::confirmed(2024, 3, "live", 80_000),
        ]
    );

    let snapshot = &output.secondary_data[0];
    assert_eq!(
        serde_json::Value::from(snapshot.clone()),
        json!({
            "entity_id": "1001",
            "snapshot_id": "20240301-snap000001",
            "snapshot_date": "2024-03-01",
            "snapshot_type": "monthly",
            "data_source": "spreadsheet",
            "metrics": {
                "expected_plays": 200000,
                "completion_rate": 0.625,
                "cpm": 25,
                "fans_ratio": 0.075
            }
        })
    );
}

#[test]
fn test_rejected_row_details() {
    let output = import(&request("douyin", "monthly")).unwrap();
    let invalid = &output.invalid_rows[0];

    assert_eq!(invalid.index, 2);
    assert_eq!(invalid.reason, MISSING_REQUIRED_FIELD);
    assert_eq!(invalid.field.as_deref(), Some("Nickname"));
    assert_eq!(invalid.raw_row[0], RawCell::text("1002"));

    let summary = output.summary();
    assert_eq!(
        summary.to_string(),
        "2 valid, 1 invalid, 1 snapshots\n  1 row missing required field Nickname"
    );
}

#[test]
fn test_digit_only_text_survives_csv_import() {
    let sheet = "Account,Phone,Plays\n007,13800000000123456789,0012\n";
    let table = CsvReader::read(sheet.as_bytes(), &CsvReadOptions::default()).unwrap();
    let catalog = ConfigCatalog::from_json_str(CATALOG).unwrap();
    let output = catalog
        .import_with_ids(&request("kuaishou", "contacts"), &table, SequentialIdGenerator::new("k"))
        .unwrap();

    let doc = &output.valid_data[0];
    assert_eq!(doc.get("account_id"), Some(&json!("007")));
    assert_eq!(doc.get_path("contact.phone"), Some(&json!("13800000000123456789")));

    let snapshot = &output.secondary_data[0];
    assert_eq!(snapshot.get(fields::ENTITY_ID), Some(&json!("007")));
    assert_eq!(snapshot.get_path("metrics.plays"), Some(&json!(12)));
}

#[test]
fn test_unknown_configuration() {
    let err = import(&request("douyin", "weekly")).unwrap_err();
    assert!(matches!(err, Error::UnknownConfig { .. }));
    assert_eq!(
        err.to_string(),
        "Unknown mapping configuration: douyin/weekly"
    );
}

#[test]
fn test_invalid_configuration_is_rejected_before_mapping() {
    let err = import(&request("xhs", "broken")).unwrap_err();
    assert!(matches!(err, Error::InvalidComputedField { ref name, .. } if name == "bad"));
}

#[test]
fn test_entity_id_injection() {
    let mut ids = HashMap::new();
    ids.insert("1001".to_string(), "64f0c2".to_string());
    let mut request = request("douyin", "monthly");
    request.context = request.context.with_entity_ids(ids);

    let output = import(&request).unwrap();
    assert_eq!(
        output.secondary_data[0].get(fields::ENTITY_ID),
        Some(&json!("64f0c2"))
    );
}

#[test]
fn test_reimport_next_month_keeps_price_history() {
    let catalog = ConfigCatalog::from_json_str(CATALOG).unwrap();
    let march = catalog
        .import_with_ids(&request("douyin", "monthly"), &table(), SequentialIdGenerator::new("a"))
        .unwrap();

    let mut april_request = request("douyin", "monthly");
    april_request.period = PricePeriod::new(2024, 4).unwrap();
    let april_sheet = "Account ID,Nickname,60s+ Video\n1001,Alice Li,5500\n";
    let april_table = CsvReader::read(april_sheet.as_bytes(), &CsvReadOptions::default()).unwrap();
    let april = catalog
        .import_with_ids(&april_request, &april_table, SequentialIdGenerator::new("b"))
        .unwrap();

    let mut stored = march.valid_data[0].clone();
    upsert_document(&mut stored, &april.valid_data[0]);

    assert_eq!(stored.get("name"), Some(&json!("Alice Li")));
    assert_eq!(
        stored.prices(),
        vec![
            PriceRecord::confirmed(2024, 3, "video_60plus", 500_000),
            PriceRecord::confirmed(2024, 3, "live", 80_000),
            PriceRecord::confirmed(2024, 4, "video_60plus", 550_000),
        ]
    );
    // No secondary columns in April's sheet
    assert!(april.secondary_data.is_empty());
}

#[test]
fn test_import_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.json");
    std::fs::write(
        &path,
        r#"[["Account ID","Nickname","Expected Plays"],["1001","Alice",1000],[null,null,null]]"#,
    )
    .unwrap();

    let catalog = ConfigCatalog::from_json_str(CATALOG).unwrap();
    let output = catalog.import_file(&request("douyin", "monthly"), &path).unwrap();

    assert_eq!(output.valid_data.len(), 1);
    assert!(output.invalid_rows.is_empty());
    assert_eq!(
        output.secondary_data[0].get_path("metrics.expected_plays"),
        Some(&json!(1000))
    );
    assert_eq!(output.secondary_data[0].get(fields::SNAPSHOT_ID).unwrap().as_str().unwrap().len(), 8 + 1 + 16);
}
