//! # Merge Configuration Module
//!
//! This module defines configuration structures for a merge run,
//! including the noise-word list, vocabulary size, conversion guards,
//! and the header names of both source datasets.

use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::merge_errors::MergeError;

// Constants for merge configuration
pub const DEFAULT_VOCABULARY_TOP_N: usize = 700;
pub const DEFAULT_TOKEN_PATTERN: &str = r"[가-힣]{2,}";
/// Quantity the per-100 basis reports on
pub const PER_HUNDRED_BASIS: f64 = 100.0;
/// Package weight above which the per-100 basis is chosen
pub const DEFAULT_PER_HUNDRED_THRESHOLD: f64 = 100.0;
/// Serving weight assumed when neither serving nor package weight is known
pub const DEFAULT_SERVING_WEIGHT: f64 = 100.0;
pub const MIN_RELIABLE_RATIO: f64 = 0.01;
pub const MAX_RELIABLE_RATIO: f64 = 50.0;

/// Generic descriptors, packaging units and bundle words.
pub const DEFAULT_NOISE_WORDS: &[&str] = &[
    "케이크", "맛", "과자", "스낵", "비스킷", "쿠키", "칩", "질소", "대", "소", "봉", "팩", "기획",
    "세트", "번들",
];

/// Tokens that never identify a product and never anchor a split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseWords(BTreeSet<String>);

impl NoiseWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for NoiseWords {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_WORDS.iter().copied())
    }
}

/// Accepted range for a conversion ratio; anything outside is discarded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    pub min: f64,
    pub max: f64,
}

impl RatioBounds {
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

impl Default for RatioBounds {
    fn default() -> Self {
        Self {
            min: MIN_RELIABLE_RATIO,
            max: MAX_RELIABLE_RATIO,
        }
    }
}

/// Header names of the nutrition-facts dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionColumns {
    pub name: String,
    pub calorie: String,
    pub protein: String,
    pub fat: String,
    pub carbohydrate: String,
    pub sugar: String,
    pub sodium: String,
    pub cholesterol: String,
    pub saturated_fat: String,
    pub trans_fat: String,
    pub total_weight: String,
    pub serving_size: String,
}

impl Default for NutritionColumns {
    fn default() -> Self {
        Self {
            name: "FOOD_NM_KR".to_string(),
            calorie: "AMT_NUM1".to_string(),
            protein: "AMT_NUM3".to_string(),
            fat: "AMT_NUM4".to_string(),
            carbohydrate: "AMT_NUM6".to_string(),
            sugar: "AMT_NUM7".to_string(),
            sodium: "AMT_NUM13".to_string(),
            cholesterol: "AMT_NUM23".to_string(),
            saturated_fat: "AMT_NUM24".to_string(),
            trans_fat: "AMT_NUM25".to_string(),
            total_weight: "Z10500".to_string(),
            serving_size: "SERVING_SIZE".to_string(),
        }
    }
}

/// Header names of the product registry dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductColumns {
    pub name: String,
    pub manufacturer: String,
    pub category: String,
    pub raw_materials: String,
}

impl Default for ProductColumns {
    fn default() -> Self {
        Self {
            name: "PRDLST_NM".to_string(),
            manufacturer: "BSSH_NM".to_string(),
            category: "PRDLST_DCNM".to_string(),
            raw_materials: "RAWMTRL_NM".to_string(),
        }
    }
}

/// Configuration structure for a merge run
///
/// Immutable once a run starts; passed by reference into every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Tokens removed from the vocabulary and from every canonical key
    pub noise_words: NoiseWords,
    /// Maximum number of vocabulary tokens kept
    pub vocabulary_top_n: usize,
    /// Pattern a candidate vocabulary token must match
    pub token_pattern: String,
    /// Treat bare quantity tokens ("120g", "3개") as noise
    pub strip_quantity_tokens: bool,
    /// Guard applied to every conversion ratio
    pub ratio_bounds: RatioBounds,
    /// Packages heavier than this are reported per 100 units
    pub per_hundred_threshold: f64,
    /// Serving weight assumed when neither serving nor total weight is known
    pub default_serving_weight: f64,
    pub nutrition_columns: NutritionColumns,
    pub product_columns: ProductColumns,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            noise_words: NoiseWords::default(),
            vocabulary_top_n: DEFAULT_VOCABULARY_TOP_N,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            strip_quantity_tokens: true,
            ratio_bounds: RatioBounds::default(),
            per_hundred_threshold: DEFAULT_PER_HUNDRED_THRESHOLD,
            default_serving_weight: DEFAULT_SERVING_WEIGHT,
            nutrition_columns: NutritionColumns::default(),
            product_columns: ProductColumns::default(),
        }
    }
}

impl MergeConfig {
    /// Load a configuration override file
    ///
    /// Fields absent from the file keep their defaults. The result is
    /// validated before it is returned.
    pub fn from_json_file(path: &Path) -> Result<Self, MergeError> {
        info!("Loading merge configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MergeError::Config(format!("{}: {e}", path.display())))?;
        let config: MergeConfig = serde_json::from_str(&raw)
            .map_err(|e| MergeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        debug!(
            "Configuration loaded: {} noise words, top_n={}",
            config.noise_words.len(),
            config.vocabulary_top_n
        );
        Ok(config)
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.vocabulary_top_n == 0 {
            return Err(MergeError::Config(
                "vocabulary_top_n must be at least 1".to_string(),
            ));
        }
        Regex::new(&self.token_pattern)?;
        let bounds = self.ratio_bounds;
        if !(bounds.min > 0.0 && bounds.min <= bounds.max) {
            return Err(MergeError::Config(format!(
                "ratio bounds [{}, {}] are not a positive range",
                bounds.min, bounds.max
            )));
        }
        if self.per_hundred_threshold <= 0.0 || self.default_serving_weight <= 0.0 {
            return Err(MergeError::Config(
                "weight thresholds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
