//! # Dataset Module
//!
//! Loading of the two source datasets from delimited text with a header
//! row, and writing of the merged products.
//!
//! Columns are resolved by header name (see [`crate::merge_config`]). Only
//! the name column is required; any other absent column reads as empty, and
//! empty or malformed nutrient cells degrade to zero. A missing or
//! unreadable file is the one fatal condition.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use log::{debug, info, warn};
use serde::Serialize;

use crate::merge_config::{NutritionColumns, ProductColumns};
use crate::merge_errors::MergeError;
use crate::nutrition_model::{NutrientValues, NutritionRecord, ProductRecord};
use crate::quantity::{parse_magnitude, parse_weight};

const BOM: char = '\u{feff}';

/// Header name -> column position
struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches(BOM).trim().to_string(), i))
            .collect();
        Self { positions }
    }

    fn required(&self, dataset: &'static str, column: &str) -> Result<usize, MergeError> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| MergeError::MissingColumn {
                dataset,
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        let position = self.positions.get(column).copied();
        if position.is_none() {
            debug!("Column '{}' absent, values default to empty", column);
        }
        position
    }
}

fn cell(record: &StringRecord, position: Option<usize>) -> Option<&str> {
    position
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn open(path: &Path) -> Result<File, MergeError> {
    if !path.exists() {
        return Err(MergeError::DatasetMissing(path.to_path_buf()));
    }
    File::open(path).map_err(|e| MergeError::DatasetUnreadable {
        path: path.display().to_string(),
        source: csv::Error::from(e),
    })
}

/// Read the header row and every decodable data row
///
/// Rows that fail to decode are skipped with a warning. A header that
/// cannot be read, or data rows none of which decode, make the whole
/// dataset unreadable.
fn read_table<R: Read>(reader: R, label: &str) -> Result<(HeaderIndex, Vec<StringRecord>), MergeError> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|source| MergeError::DatasetUnreadable {
            path: label.to_string(),
            source,
        })?
        .clone();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut last_error = None;
    for (line, result) in csv_reader.records().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!("{}: skipping row {}: {}", label, line + 1, e);
                last_error = Some(e);
            }
        }
    }
    if let Some(source) = last_error {
        // Nothing decoded at all: wrong encoding or not delimited text
        if records.is_empty() {
            return Err(MergeError::DatasetUnreadable {
                path: label.to_string(),
                source,
            });
        }
        warn!("{}: {} rows could not be decoded", label, skipped);
    }
    Ok((HeaderIndex::new(&headers), records))
}

/// Read nutrition-facts rows from any reader
pub fn read_nutrition<R: Read>(
    reader: R,
    columns: &NutritionColumns,
    label: &str,
) -> Result<Vec<NutritionRecord>, MergeError> {
    let (index, records) = read_table(reader, label)?;
    let positions = NutritionPositions {
        name: index.required("nutrition", &columns.name)?,
        calorie: index.optional(&columns.calorie),
        protein: index.optional(&columns.protein),
        fat: index.optional(&columns.fat),
        carbohydrate: index.optional(&columns.carbohydrate),
        sugar: index.optional(&columns.sugar),
        sodium: index.optional(&columns.sodium),
        cholesterol: index.optional(&columns.cholesterol),
        saturated_fat: index.optional(&columns.saturated_fat),
        trans_fat: index.optional(&columns.trans_fat),
        total_weight: index.optional(&columns.total_weight),
        serving_size: index.optional(&columns.serving_size),
    };

    let rows: Vec<NutritionRecord> = records.iter().map(|r| positions.read(r)).collect();
    info!("Loaded {} nutrition rows from {}", rows.len(), label);
    Ok(rows)
}

struct NutritionPositions {
    name: usize,
    calorie: Option<usize>,
    protein: Option<usize>,
    fat: Option<usize>,
    carbohydrate: Option<usize>,
    sugar: Option<usize>,
    sodium: Option<usize>,
    cholesterol: Option<usize>,
    saturated_fat: Option<usize>,
    trans_fat: Option<usize>,
    total_weight: Option<usize>,
    serving_size: Option<usize>,
}

impl NutritionPositions {
    fn read(&self, record: &StringRecord) -> NutritionRecord {
        let magnitude = |position| parse_magnitude(cell(record, position));
        NutritionRecord {
            name: cell(record, Some(self.name)).unwrap_or_default().to_string(),
            values: NutrientValues {
                calorie: magnitude(self.calorie),
                protein: magnitude(self.protein),
                fat: magnitude(self.fat),
                carbohydrate: magnitude(self.carbohydrate),
                sugar: magnitude(self.sugar),
                sodium: magnitude(self.sodium),
                cholesterol: magnitude(self.cholesterol),
                saturated_fat: magnitude(self.saturated_fat),
                trans_fat: magnitude(self.trans_fat),
            },
            package_total_weight: cell(record, self.total_weight).and_then(parse_weight),
            declared_serving_size: cell(record, self.serving_size).map(str::to_string),
        }
    }
}

/// Read product registry rows from any reader; ids are assigned from 1
pub fn read_products<R: Read>(
    reader: R,
    columns: &ProductColumns,
    label: &str,
) -> Result<Vec<ProductRecord>, MergeError> {
    let (index, records) = read_table(reader, label)?;
    let name = index.required("products", &columns.name)?;
    let manufacturer = index.optional(&columns.manufacturer);
    let category = index.optional(&columns.category);
    let raw_materials = index.optional(&columns.raw_materials);

    let products: Vec<ProductRecord> = records
        .iter()
        .zip(1u64..)
        .map(|(record, id)| {
            ProductRecord::new(id, cell(record, Some(name)).unwrap_or_default())
                .with_manufacturer(cell(record, manufacturer).unwrap_or_default())
                .with_category(cell(record, category).unwrap_or_default())
                .with_raw_materials(cell(record, raw_materials).unwrap_or_default())
        })
        .collect();

    info!("Loaded {} products from {}", products.len(), label);
    Ok(products)
}

pub fn load_nutrition(
    path: &Path,
    columns: &NutritionColumns,
) -> Result<Vec<NutritionRecord>, MergeError> {
    read_nutrition(open(path)?, columns, &path.display().to_string())
}

pub fn load_products(path: &Path, columns: &ProductColumns) -> Result<Vec<ProductRecord>, MergeError> {
    read_products(open(path)?, columns, &path.display().to_string())
}

/// Drop later products repeating an earlier (name, manufacturer) pair
///
/// Returns the kept products and how many were dropped.
pub fn dedup_products(products: Vec<ProductRecord>) -> (Vec<ProductRecord>, usize) {
    let before = products.len();
    let mut seen = HashSet::new();
    let kept: Vec<ProductRecord> = products
        .into_iter()
        .filter(|p| seen.insert((p.name.clone(), p.manufacturer.clone())))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        info!("Removed {} duplicate products", dropped);
    }
    (kept, dropped)
}

/// Flat output row; nutrition columns stay empty for unmatched products
#[derive(Debug, Serialize)]
struct MergedRow<'a> {
    id: u64,
    name: &'a str,
    manufacturer: &'a str,
    category: &'a str,
    raw_materials: &'a str,
    calorie: Option<f64>,
    carbohydrate: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
    cholesterol: Option<f64>,
    saturated_fat: Option<f64>,
    trans_fat: Option<f64>,
    total_weight: Option<f64>,
    basis_description: Option<&'a str>,
}

impl<'a> From<&'a ProductRecord> for MergedRow<'a> {
    fn from(product: &'a ProductRecord) -> Self {
        let nutrition = product.nutrition.as_ref();
        let value = |f: fn(&NutrientValues) -> f64| nutrition.map(|n| f(&n.values));
        Self {
            id: product.id,
            name: &product.name,
            manufacturer: &product.manufacturer,
            category: &product.category,
            raw_materials: &product.raw_materials_text,
            calorie: value(|v| v.calorie),
            carbohydrate: value(|v| v.carbohydrate),
            protein: value(|v| v.protein),
            fat: value(|v| v.fat),
            sugar: value(|v| v.sugar),
            sodium: value(|v| v.sodium),
            cholesterol: value(|v| v.cholesterol),
            saturated_fat: value(|v| v.saturated_fat),
            trans_fat: value(|v| v.trans_fat),
            total_weight: nutrition.and_then(|n| n.total_weight),
            basis_description: nutrition.map(|n| n.basis_description.as_str()),
        }
    }
}

/// Write merged products; `.json` paths get JSON, anything else delimited text
pub fn write_merged(path: &Path, products: &[ProductRecord]) -> Result<(), MergeError> {
    let output_error = |e: &dyn std::fmt::Display| MergeError::Output(format!("{}: {e}", path.display()));
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let file = File::create(path).map_err(|e| output_error(&e))?;
        serde_json::to_writer_pretty(file, products).map_err(|e| output_error(&e))?;
    } else {
        let mut writer = Writer::from_path(path).map_err(|e| output_error(&e))?;
        for product in products {
            writer
                .serialize(MergedRow::from(product))
                .map_err(|e| output_error(&e))?;
        }
        writer.flush().map_err(|e| output_error(&e))?;
    }

    info!("Wrote {} products to {}", products.len(), path.display());
    Ok(())
}
