//! # Quantity Module
//!
//! Numeric parsing of the loosely formatted weight, serving and nutrient
//! fields, and the policy that picks one display basis per product.
//!
//! ## Basis selection
//!
//! - package heavier than the threshold: per 100 units, `ratio = 100 / serving`
//! - package at or below the threshold: whole package, `ratio = total / serving`
//! - no package weight: the declared serving as-is, `ratio = 1`
//!
//! A ratio outside the configured bounds is discarded and reset to 1.

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::merge_config::{MergeConfig, PER_HUNDRED_BASIS};
use crate::nutrition_model::Basis;

lazy_static! {
    static ref NUMERIC_RUN: Regex =
        Regex::new(r"[\d.]+").expect("Numeric run pattern should be valid");
}

/// First run of digits and decimal points, parsed as a float
///
/// Trailing units and anything after the first run are ignored, so
/// "30g (1/3 pack)" reads as 30. Returns `None` when there is no run or it
/// does not parse ("." or "1.2.3").
///
/// ```rust
/// use nutrimerge::quantity::parse_weight;
///
/// assert_eq!(parse_weight("120g"), Some(120.0));
/// assert_eq!(parse_weight("약 2.5 kg"), Some(2.5));
/// assert_eq!(parse_weight("g"), None);
/// ```
pub fn parse_weight(text: &str) -> Option<f64> {
    let run = NUMERIC_RUN.find(text)?;
    run.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient magnitude parse for nutrient fields
///
/// Thousands separators are removed; empty, non-numeric and non-finite
/// input degrades to zero.
pub fn parse_magnitude(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            if !cleaned.is_empty() {
                trace!("unparseable magnitude '{}' treated as 0", text);
            }
            0.0
        }
    }
}

/// Ratio to apply to per-serving magnitudes and the basis it yields
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub ratio: f64,
    pub basis: Basis,
}

/// Choose the display basis and compute the conversion ratio
///
/// A non-positive `total_weight` counts as absent.
pub fn compute_ratio(
    total_weight: Option<f64>,
    serving_size_text: Option<&str>,
    config: &MergeConfig,
) -> Conversion {
    let total_weight = total_weight.filter(|w| *w > 0.0);
    let declared = serving_size_text
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let serving_weight = declared
        .and_then(parse_weight)
        .filter(|w| *w > 0.0)
        .or(total_weight)
        .unwrap_or(config.default_serving_weight);

    let divide = |numerator: f64| {
        if serving_weight > 0.0 {
            numerator / serving_weight
        } else {
            1.0
        }
    };

    let (ratio, basis) = match total_weight {
        Some(total) if total > config.per_hundred_threshold => {
            (divide(PER_HUNDRED_BASIS), Basis::PerHundred)
        }
        Some(total) => (divide(total), Basis::TotalPackage { weight: total }),
        None => match declared {
            Some(serving) => (
                1.0,
                Basis::DeclaredServing {
                    serving: serving.to_string(),
                },
            ),
            None => (1.0, Basis::Serving),
        },
    };

    if !config.ratio_bounds.contains(ratio) {
        debug!(
            "Discarding ratio {} (total={:?}, serving={}); outside [{}, {}]",
            ratio, total_weight, serving_weight, config.ratio_bounds.min, config.ratio_bounds.max
        );
        return Conversion {
            ratio: 1.0,
            basis: Basis::Unavailable {
                serving: declared.map(str::to_string),
            },
        };
    }

    Conversion { ratio, basis }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_weight_first_run_only() {
        assert_eq!(parse_weight("30g"), Some(30.0));
        assert_eq!(parse_weight("1회 제공량 30g"), Some(1.0));
        assert_eq!(parse_weight("20-30g"), Some(20.0));
        assert_eq!(parse_weight(".5kg"), Some(0.5));
    }

    #[test]
    fn test_parse_weight_failures() {
        assert_eq!(parse_weight(""), None);
        assert_eq!(parse_weight("없음"), None);
        assert_eq!(parse_weight("."), None);
        assert_eq!(parse_weight("1.2.3g"), None);
    }

    #[test]
    fn test_parse_magnitude_degrades_to_zero() {
        assert_eq!(parse_magnitude(Some("1,234.5")), 1234.5);
        assert_eq!(parse_magnitude(Some(" 12 ")), 12.0);
        assert_eq!(parse_magnitude(Some("")), 0.0);
        assert_eq!(parse_magnitude(Some("N/A")), 0.0);
        assert_eq!(parse_magnitude(Some("NaN")), 0.0);
        assert_eq!(parse_magnitude(None), 0.0);
    }

    #[test]
    fn test_heavy_package_reported_per_hundred() {
        let c = compute_ratio(Some(150.0), Some("30g"), &MergeConfig::default());
        assert_eq!(c.basis, Basis::PerHundred);
        assert!(approx(c.ratio, 100.0 / 30.0));
    }

    #[test]
    fn test_threshold_does_not_change_hundred_basis() {
        let config = MergeConfig {
            per_hundred_threshold: 200.0,
            ..Default::default()
        };
        let c = compute_ratio(Some(250.0), Some("50g"), &config);
        assert_eq!(c.basis, Basis::PerHundred);
        assert!(approx(c.ratio, 2.0));

        // below the raised threshold the whole package is reported
        let c = compute_ratio(Some(150.0), Some("50g"), &config);
        assert_eq!(c.basis, Basis::TotalPackage { weight: 150.0 });
        assert!(approx(c.ratio, 3.0));
    }

    #[test]
    fn test_light_package_reported_whole() {
        let c = compute_ratio(Some(50.0), Some("50g"), &MergeConfig::default());
        assert_eq!(c.basis, Basis::TotalPackage { weight: 50.0 });
        assert!(approx(c.ratio, 1.0));
        assert!(c.basis.to_string().contains("50"));
    }

    #[test]
    fn test_missing_serving_falls_back_to_total() {
        let c = compute_ratio(Some(80.0), None, &MergeConfig::default());
        assert_eq!(c.basis, Basis::TotalPackage { weight: 80.0 });
        assert!(approx(c.ratio, 1.0));

        let c = compute_ratio(Some(80.0), Some("0g"), &MergeConfig::default());
        assert!(approx(c.ratio, 1.0));
    }

    #[test]
    fn test_missing_total_uses_declared_serving() {
        let c = compute_ratio(None, Some("1봉지(30g)"), &MergeConfig::default());
        assert_eq!(
            c.basis,
            Basis::DeclaredServing {
                serving: "1봉지(30g)".to_string()
            }
        );
        assert_eq!(c.ratio, 1.0);

        let c = compute_ratio(None, None, &MergeConfig::default());
        assert_eq!(c.basis, Basis::Serving);
        assert_eq!(c.ratio, 1.0);
    }

    #[test]
    fn test_out_of_bounds_ratio_discarded() {
        let c = compute_ratio(Some(1_000_000.0), Some("1g"), &MergeConfig::default());
        assert_eq!(c.ratio, 1.0);
        assert_eq!(
            c.basis,
            Basis::Unavailable {
                serving: Some("1g".to_string())
            }
        );
        assert!(c.basis.to_string().contains("conversion unavailable"));

        // 1 / 500 = 0.002
        let c = compute_ratio(Some(1.0), Some("500g"), &MergeConfig::default());
        assert_eq!(c.ratio, 1.0);
        assert!(!c.basis.is_available());
    }
}
