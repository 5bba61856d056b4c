//! # Nutrimerge
//!
//! Reconciles a product registry with a nutrition-facts registry that share
//! no identifier. Product names from both sides are reduced to
//! order-independent canonical keys, and nutrition magnitudes are converted
//! onto one display basis per product before they are attached.

pub mod canonicalizer;
pub mod dataset;
pub mod merge_config;
pub mod merge_engine;
pub mod merge_errors;
pub mod nutrition_model;
pub mod quantity;
pub mod segmentation;
pub mod vocabulary;
