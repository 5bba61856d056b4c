//! # Product and Nutrition Data Model
//!
//! This module defines the records of both source datasets and the
//! converted nutrition that the merge attaches to a product.
//!
//! ## Core Concepts
//!
//! - **ProductRecord**: a registry entry (name, manufacturer, raw materials)
//! - **NutritionRecord**: a nutrition-facts row with magnitudes on its own basis
//! - **ConvertedNutrition**: magnitudes rescaled onto one display basis
//! - **Basis**: what quantity the converted magnitudes are expressed per
//!
//! ## Usage
//!
//! ```rust
//! use nutrimerge::nutrition_model::{NutrientValues, NutritionRecord, ProductRecord};
//!
//! let product = ProductRecord::new(1, "딸기맛 과자 120g");
//! let row = NutritionRecord::new("과자 딸기맛")
//!     .with_values(NutrientValues { calorie: 150.0, ..Default::default() })
//!     .with_total_weight(120.0)
//!     .with_serving_size("30g");
//!
//! assert!(product.nutrition.is_none());
//! assert_eq!(row.values.calorie, 150.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A product registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Row identity assigned on ingestion
    pub id: u64,
    pub name: String,
    pub manufacturer: String,
    pub category: String,
    pub raw_materials_text: String,

    /// Attached by the merge; absent for unmatched products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<ConvertedNutrition>,
}

impl ProductRecord {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            manufacturer: String::new(),
            category: String::new(),
            raw_materials_text: String::new(),
            nutrition: None,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: &str) -> Self {
        self.manufacturer = manufacturer.to_string();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_raw_materials(mut self, raw_materials: &str) -> Self {
        self.raw_materials_text = raw_materials.to_string();
        self
    }

    pub fn is_matched(&self) -> bool {
        self.nutrition.is_some()
    }
}

/// Nutrient magnitudes, on whatever basis the owner states
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientValues {
    pub calorie: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub cholesterol: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
}

impl NutrientValues {
    /// Multiply every magnitude by `ratio`
    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            calorie: self.calorie * ratio,
            protein: self.protein * ratio,
            fat: self.fat * ratio,
            carbohydrate: self.carbohydrate * ratio,
            sugar: self.sugar * ratio,
            sodium: self.sodium * ratio,
            cholesterol: self.cholesterol * ratio,
            saturated_fat: self.saturated_fat * ratio,
            trans_fat: self.trans_fat * ratio,
        }
    }

    /// Round for storage: calorie and sodium to whole numbers, the rest to
    /// one decimal place. Halves round to even.
    pub fn rounded_for_display(&self) -> Self {
        Self {
            calorie: self.calorie.round_ties_even(),
            protein: round_one_decimal(self.protein),
            fat: round_one_decimal(self.fat),
            carbohydrate: round_one_decimal(self.carbohydrate),
            sugar: round_one_decimal(self.sugar),
            sodium: self.sodium.round_ties_even(),
            cholesterol: round_one_decimal(self.cholesterol),
            saturated_fat: round_one_decimal(self.saturated_fat),
            trans_fat: round_one_decimal(self.trans_fat),
        }
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// A nutrition-facts row, immutable within a merge run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub name: String,
    /// Magnitudes per declared serving
    pub values: NutrientValues,
    /// Net weight of the whole package
    pub package_total_weight: Option<f64>,
    /// Serving size as printed, e.g. "30g"
    pub declared_serving_size: Option<String>,
}

impl NutritionRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: NutrientValues::default(),
            package_total_weight: None,
            declared_serving_size: None,
        }
    }

    pub fn with_values(mut self, values: NutrientValues) -> Self {
        self.values = values;
        self
    }

    pub fn with_total_weight(mut self, total_weight: f64) -> Self {
        self.package_total_weight = Some(total_weight);
        self
    }

    pub fn with_serving_size(mut self, serving_size: &str) -> Self {
        self.declared_serving_size = Some(serving_size.to_string());
        self
    }
}

/// What converted magnitudes are expressed per
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Basis {
    /// Fixed 100-unit basis for packages above the threshold
    PerHundred,
    /// Whole package of the given weight
    TotalPackage { weight: f64 },
    /// The serving size exactly as declared
    DeclaredServing { serving: String },
    /// Nothing declared
    Serving,
    /// The ratio was out of bounds and has been reset to 1
    Unavailable { serving: Option<String> },
}

impl Basis {
    pub fn is_available(&self) -> bool {
        !matches!(self, Basis::Unavailable { .. })
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::PerHundred => write!(f, "per 100 units"),
            Basis::TotalPackage { weight } => {
                write!(f, "total package ({}g)", format_weight(*weight))
            }
            Basis::DeclaredServing { serving } => write!(f, "per {serving}"),
            Basis::Serving => write!(f, "per serving"),
            Basis::Unavailable { serving: Some(s) } => {
                write!(f, "per {s} (conversion unavailable)")
            }
            Basis::Unavailable { serving: None } => write!(f, "(conversion unavailable)"),
        }
    }
}

/// Format a weight without a trailing ".0" when it is integral
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 && weight.is_finite() {
        format!("{weight:.0}")
    } else {
        format!("{weight}")
    }
}

/// Nutrition rescaled onto a single display basis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedNutrition {
    pub values: NutrientValues,
    pub basis: Basis,
    /// Human-readable form of `basis`
    pub basis_description: String,
    pub total_weight: Option<f64>,
}

impl ConvertedNutrition {
    pub fn new(values: NutrientValues, basis: Basis, total_weight: Option<f64>) -> Self {
        Self {
            basis_description: basis.to_string(),
            values,
            basis,
            total_weight,
        }
    }

    /// Copy with values and weight rounded the way they are stored
    pub fn rounded_for_display(&self) -> Self {
        Self {
            values: self.values.rounded_for_display(),
            basis: self.basis.clone(),
            basis_description: self.basis_description.clone(),
            total_weight: self.total_weight.map(round_one_decimal),
        }
    }
}
