//! # Merge Engine Module
//!
//! Joins the product registry with the nutrition-facts dataset.
//!
//! A run learns the vocabulary from the nutrition names, indexes every
//! nutrition row under its canonical key with magnitudes already converted
//! to the display basis, then canonicalizes each product name with the same
//! vocabulary and attaches whatever the index holds for it. The index is
//! complete and read-only before the first product is touched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::canonicalizer::{CanonicalKey, NameCanonicalizer};
use crate::merge_config::MergeConfig;
use crate::merge_errors::MergeError;
use crate::nutrition_model::{ConvertedNutrition, NutritionRecord, ProductRecord};
use crate::quantity::compute_ratio;
use crate::segmentation::{Segmenter, VocabularySegmenter};
use crate::vocabulary::VocabularyBuilder;

/// Aggregate outcome of one merge run
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub matched: usize,
    /// Misses, empty keys and zero-calorie rejections together
    pub unmatched: usize,
    pub zero_calorie_rejections: usize,
    /// Distinct canonical keys in the nutrition index
    pub index_size: usize,
    /// Nutrition rows that overwrote an earlier row with the same key
    pub key_collisions: usize,
    pub vocabulary_size: usize,
    pub finished_at: DateTime<Utc>,
}

struct IndexedNutrition {
    source_name: String,
    converted: ConvertedNutrition,
}

/// Canonical key -> converted nutrition, last row wins on collision
pub struct NutritionIndex {
    entries: HashMap<CanonicalKey, IndexedNutrition>,
    collisions: usize,
}

impl NutritionIndex {
    pub fn build<S: Segmenter>(
        rows: &[NutritionRecord],
        canonicalizer: &NameCanonicalizer<'_, S>,
        config: &MergeConfig,
    ) -> Self {
        let mut entries: HashMap<CanonicalKey, IndexedNutrition> = HashMap::new();
        let mut collisions = 0;

        for row in rows {
            let key = canonicalizer.canonicalize(Some(&row.name));
            if key.is_empty() {
                trace!(name = %row.name, "nutrition row has an empty key, not indexed");
                continue;
            }

            let conversion = compute_ratio(
                row.package_total_weight,
                row.declared_serving_size.as_deref(),
                config,
            );
            let converted = ConvertedNutrition::new(
                row.values.scaled(conversion.ratio),
                conversion.basis,
                row.package_total_weight.filter(|w| *w > 0.0),
            );

            let entry = IndexedNutrition {
                source_name: row.name.clone(),
                converted,
            };
            if let Some(previous) = entries.insert(key.clone(), entry) {
                collisions += 1;
                debug!(
                    key = %key,
                    replaced = %previous.source_name,
                    by = %row.name,
                    "canonical key collision"
                );
            }
        }

        Self {
            entries,
            collisions,
        }
    }

    /// Converted nutrition for `key`; the empty key never matches
    pub fn get(&self, key: &CanonicalKey) -> Option<&ConvertedNutrition> {
        if key.is_empty() {
            return None;
        }
        self.entries.get(key).map(|e| &e.converted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

/// Runs merges with one configuration and segmentation strategy
pub struct MergeEngine<'c, S = VocabularySegmenter> {
    config: &'c MergeConfig,
    segmenter: S,
}

impl<'c> MergeEngine<'c> {
    pub fn new(config: &'c MergeConfig) -> Result<Self, MergeError> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter: VocabularySegmenter,
        })
    }
}

impl<'c, S: Segmenter> MergeEngine<'c, S> {
    pub fn with_segmenter<T: Segmenter>(self, segmenter: T) -> MergeEngine<'c, T> {
        MergeEngine {
            config: self.config,
            segmenter,
        }
    }

    /// Attach converted nutrition to every product that has a match
    ///
    /// Products without a match, or whose match rounds to zero calories,
    /// end up with no nutrition at all. Unmatched rows are expected and
    /// only counted.
    pub fn merge(
        &self,
        products: &mut [ProductRecord],
        nutrition_rows: &[NutritionRecord],
    ) -> Result<MergeReport, MergeError> {
        info!(
            products = products.len(),
            nutrition_rows = nutrition_rows.len(),
            "Starting merge"
        );

        let vocabulary = VocabularyBuilder::new(self.config)?.build(
            nutrition_rows
                .iter()
                .map(|r| Some(r.name.as_str()).filter(|n| !n.trim().is_empty())),
        )?;
        let canonicalizer =
            NameCanonicalizer::new(&vocabulary, self.config).with_segmenter(&self.segmenter);

        let index = NutritionIndex::build(nutrition_rows, &canonicalizer, self.config);
        info!(
            keys = index.len(),
            collisions = index.collisions(),
            "Nutrition index ready"
        );

        let mut matched = 0;
        let mut unmatched = 0;
        let mut zero_calorie_rejections = 0;

        for product in products.iter_mut() {
            let key = canonicalizer.canonicalize(Some(&product.name));
            let Some(found) = index.get(&key) else {
                product.nutrition = None;
                unmatched += 1;
                continue;
            };

            let stored = found.rounded_for_display();
            if stored.values.calorie == 0.0 {
                trace!(name = %product.name, "match rejected, calorie rounds to zero");
                product.nutrition = None;
                zero_calorie_rejections += 1;
                unmatched += 1;
                continue;
            }

            matched += 1;
            if matched % 100 == 0 {
                info!(
                    matched,
                    name = %product.name,
                    calorie = stored.values.calorie,
                    basis = %stored.basis_description,
                    "merge progress"
                );
            }
            product.nutrition = Some(stored);
        }

        let report = MergeReport {
            matched,
            unmatched,
            zero_calorie_rejections,
            index_size: index.len(),
            key_collisions: index.collisions(),
            vocabulary_size: vocabulary.len(),
            finished_at: Utc::now(),
        };
        info!(
            matched = report.matched,
            unmatched = report.unmatched,
            zero_calorie = report.zero_calorie_rejections,
            collisions = report.key_collisions,
            "Merge complete"
        );
        Ok(report)
    }
}

/// Merge with the default segmentation strategy
pub fn merge(
    products: &mut [ProductRecord],
    nutrition_rows: &[NutritionRecord],
    config: &MergeConfig,
) -> Result<MergeReport, MergeError> {
    MergeEngine::new(config)?.merge(products, nutrition_rows)
}
