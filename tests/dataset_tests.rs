//! # Dataset Tests
//!
//! Loading both source files from disk, merging, and writing the result.

use std::fs;
use std::path::Path;

use nutrimerge::dataset::{dedup_products, load_nutrition, load_products, write_merged};
use nutrimerge::merge_config::MergeConfig;
use nutrimerge::merge_engine::merge;
use nutrimerge::merge_errors::MergeError;
use tempfile::TempDir;

const NUTRITION_CSV: &str = "\u{feff}FOOD_NM_KR,AMT_NUM1,AMT_NUM3,AMT_NUM4,AMT_NUM6,AMT_NUM7,AMT_NUM13,AMT_NUM23,AMT_NUM24,AMT_NUM25,Z10500,SERVING_SIZE
과자 딸기맛,150,2,5.5,20,8,\"1,200\",0,1.2,0,120g,30g
새우깡,90,1,4,12,1,110,,0.8,0,90,30g
감자칩 오리지널,not-a-number,1,6,10,0,90,0,2,0,,
";

const PRODUCTS_CSV: &str = "PRDLST_NM,BSSH_NM,PRDLST_DCNM,RAWMTRL_NM
딸기맛 과자 120g,해태제과,과자,\"밀가루,설탕,딸기농축액\"
새우깡(90g),농심,스낵과자,\"소맥분,새우\"
새우깡(90g),농심,스낵과자,\"소맥분,새우\"
오리지널 감자칩,오리온,스낵과자,감자
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_nutrition_parses_dirty_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "nutrition.csv", NUTRITION_CSV);
    let rows = load_nutrition(&path, &MergeConfig::default().nutrition_columns).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].name, "과자 딸기맛");
    assert_eq!(rows[0].values.sodium, 1200.0);
    assert_eq!(rows[0].package_total_weight, Some(120.0));
    assert_eq!(rows[0].declared_serving_size.as_deref(), Some("30g"));
    assert_eq!(rows[1].values.cholesterol, 0.0);
    assert_eq!(rows[2].values.calorie, 0.0);
    assert_eq!(rows[2].package_total_weight, None);
    assert_eq!(rows[2].declared_serving_size, None);
}

#[test]
fn test_load_products_assigns_ids_and_dedups() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "products.csv", PRODUCTS_CSV);
    let products = load_products(&path, &MergeConfig::default().product_columns).unwrap();

    assert_eq!(products.len(), 4);
    assert_eq!(products[0].id, 1);
    assert_eq!(products[0].manufacturer, "해태제과");
    assert_eq!(products[0].raw_materials_text, "밀가루,설탕,딸기농축액");

    let (products, dropped) = dedup_products(products);
    assert_eq!(dropped, 1);
    assert_eq!(products.len(), 3);
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.csv");
    let err = load_nutrition(&missing, &MergeConfig::default().nutrition_columns).unwrap_err();
    assert!(matches!(err, MergeError::DatasetMissing(_)));
}

#[test]
fn test_missing_name_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "products.csv", "NAME,BSSH_NM\n새우깡,농심\n");
    let err = load_products(&path, &MergeConfig::default().product_columns).unwrap_err();
    assert!(matches!(err, MergeError::MissingColumn { dataset: "products", .. }));
}

#[test]
fn test_wrong_encoding_is_fatal() {
    // 새우깡 encoded as CP949
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nutrition_cp949.csv");
    fs::write(&path, b"FOOD_NM_KR,AMT_NUM1\n\xBB\xF5\xBF\xEC\xB1\xF8,450\n\xBB\xF5\xBF\xEC\xB1\xF8,90\n")
        .unwrap();
    let err = load_nutrition(&path, &MergeConfig::default().nutrition_columns).unwrap_err();
    assert!(matches!(err, MergeError::DatasetUnreadable { .. }));
    assert!(err.to_string().contains("nutrition_cp949.csv"));
}

fn merged_fixture(dir: &TempDir) -> Vec<nutrimerge::nutrition_model::ProductRecord> {
    let config = MergeConfig::default();
    let nutrition_path = write_fixture(dir, "nutrition.csv", NUTRITION_CSV);
    let products_path = write_fixture(dir, "products.csv", PRODUCTS_CSV);

    let rows = load_nutrition(&nutrition_path, &config.nutrition_columns).unwrap();
    let (mut products, _) =
        dedup_products(load_products(&products_path, &config.product_columns).unwrap());
    let report = merge(&mut products, &rows, &config).unwrap();

    // the potato chip row has an unparseable calorie, which reads as zero
    assert_eq!(report.matched, 2);
    assert_eq!(report.zero_calorie_rejections, 1);
    products
}

#[test]
fn test_write_json_output() {
    let dir = TempDir::new().unwrap();
    let products = merged_fixture(&dir);
    let output = dir.path().join("merged.json");
    write_merged(&output, &products).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let items = written.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["nutrition"]["values"]["calorie"], 500.0);
    assert_eq!(items[0]["nutrition"]["basis_description"], "per 100 units");
    assert!(items[2].get("nutrition").is_none());
}

#[test]
fn test_write_delimited_output_leaves_unmatched_empty() {
    let dir = TempDir::new().unwrap();
    let products = merged_fixture(&dir);
    let output = dir.path().join("merged.csv");
    write_merged(&output, &products).unwrap();

    let mut reader = csv::Reader::from_path(Path::new(&output)).unwrap();
    let headers = reader.headers().unwrap().clone();
    let calorie = headers.iter().position(|h| h == "calorie").unwrap();
    let basis = headers.iter().position(|h| h == "basis_description").unwrap();

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[1][calorie], "270.0");
    assert_eq!(&records[1][basis], "total package (90g)");
    assert_eq!(&records[2][calorie], "");
    assert_eq!(&records[2][basis], "");
}
