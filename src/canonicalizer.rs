//! # Name Canonicalizer Module
//!
//! Turns a free-text product name into an order-independent join key.
//!
//! ## Pipeline
//!
//! 1. Drop parenthesized asides ("(50g)", "(기획)")
//! 2. Replace punctuation with spaces
//! 3. Segment with the vocabulary (see [`crate::segmentation`])
//! 4. Drop noise tokens, and bare quantities when configured
//! 5. Sort the survivors and concatenate them without a separator
//!
//! ```rust
//! use nutrimerge::canonicalizer::NameCanonicalizer;
//! use nutrimerge::merge_config::MergeConfig;
//! use nutrimerge::vocabulary::Vocabulary;
//!
//! let config = MergeConfig::default();
//! let vocabulary = Vocabulary::from_tokens(vec!["딸기맛".to_string()])?;
//! let canonicalizer = NameCanonicalizer::new(&vocabulary, &config);
//!
//! assert_eq!(
//!     canonicalizer.canonicalize(Some("딸기맛 과자 120g")),
//!     canonicalizer.canonicalize(Some("과자 딸기맛")),
//! );
//! # Ok::<(), nutrimerge::merge_errors::MergeError>(())
//! ```

use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::merge_config::{MergeConfig, NoiseWords};
use crate::segmentation::{Segmenter, VocabularySegmenter};
use crate::vocabulary::Vocabulary;

lazy_static! {
    static ref PARENTHESIZED: Regex =
        Regex::new(r"\([^)]*\)").expect("Parenthesized pattern should be valid");
    static ref NON_WORD: Regex =
        Regex::new(r"[^\w\s]").expect("Non-word pattern should be valid");
    static ref QUANTITY_TOKEN: Regex = Regex::new(
        r"(?i)^\d+(?:\.\d+)?(?:g|kg|mg|ml|l|개입|개|입|봉|팩|매|ea)?$"
    )
    .expect("Quantity token pattern should be valid");
}

/// Join key derived from a product name
///
/// An empty key never matches anything, including another empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes names against one vocabulary and noise list
pub struct NameCanonicalizer<'a, S = VocabularySegmenter> {
    vocabulary: &'a Vocabulary,
    noise_words: &'a NoiseWords,
    strip_quantity_tokens: bool,
    segmenter: S,
}

impl<'a> NameCanonicalizer<'a> {
    pub fn new(vocabulary: &'a Vocabulary, config: &'a MergeConfig) -> Self {
        Self {
            vocabulary,
            noise_words: &config.noise_words,
            strip_quantity_tokens: config.strip_quantity_tokens,
            segmenter: VocabularySegmenter,
        }
    }
}

impl<'a, S: Segmenter> NameCanonicalizer<'a, S> {
    /// Swap the segmentation strategy, keeping vocabulary and noise list
    pub fn with_segmenter<T: Segmenter>(self, segmenter: T) -> NameCanonicalizer<'a, T> {
        NameCanonicalizer {
            vocabulary: self.vocabulary,
            noise_words: self.noise_words,
            strip_quantity_tokens: self.strip_quantity_tokens,
            segmenter,
        }
    }

    /// Canonical key of `name`; missing or blank names give the empty key
    pub fn canonicalize(&self, name: Option<&str>) -> CanonicalKey {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return CanonicalKey::default(),
        };

        let without_asides = PARENTHESIZED.replace_all(name, "");
        let cleaned = NON_WORD.replace_all(&without_asides, " ");

        let mut tokens: Vec<String> = self
            .segmenter
            .segment(&cleaned, self.vocabulary)
            .into_iter()
            .filter(|t| !self.is_noise(t))
            .collect();
        tokens.sort();

        let key = CanonicalKey(tokens.concat());
        trace!("canonicalized '{}' -> '{}'", name, key);
        key
    }

    fn is_noise(&self, token: &str) -> bool {
        self.noise_words.contains(token)
            || (self.strip_quantity_tokens && QUANTITY_TOKEN.is_match(token))
    }
}

/// One-off canonicalization with the default segmenter
pub fn canonicalize(name: &str, vocabulary: &Vocabulary, config: &MergeConfig) -> CanonicalKey {
    NameCanonicalizer::new(vocabulary, config).canonicalize(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::WhitespaceSegmenter;

    fn vocab(tokens: &[&str]) -> Vocabulary {
        Vocabulary::from_tokens(tokens.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_missing_and_blank_names_give_empty_key() {
        let config = MergeConfig::default();
        let v = vocab(&["딸기"]);
        let c = NameCanonicalizer::new(&v, &config);
        assert!(c.canonicalize(None).is_empty());
        assert!(c.canonicalize(Some("")).is_empty());
        assert!(c.canonicalize(Some("   ")).is_empty());
    }

    #[test]
    fn test_name_of_only_noise_gives_empty_key() {
        let config = MergeConfig::default();
        let v = vocab(&[]);
        let c = NameCanonicalizer::new(&v, &config);
        assert!(c.canonicalize(Some("과자 세트 (대)")).is_empty());
    }

    #[test]
    fn test_punctuation_becomes_boundary() {
        let config = MergeConfig::default();
        let v = vocab(&[]);
        let c = NameCanonicalizer::new(&v, &config);
        assert_eq!(c.canonicalize(Some("초코/바닐라")).as_str(), "바닐라초코");
    }

    #[test]
    fn test_quantity_tokens_stripped_only_when_configured() {
        let v = vocab(&[]);
        let config = MergeConfig::default();
        let c = NameCanonicalizer::new(&v, &config);
        assert_eq!(c.canonicalize(Some("새우깡 90g")).as_str(), "새우깡");
        assert_eq!(c.canonicalize(Some("새우깡 1.5kg 3개")).as_str(), "새우깡");

        let keep = MergeConfig {
            strip_quantity_tokens: false,
            ..Default::default()
        };
        let c = NameCanonicalizer::new(&v, &keep);
        assert_eq!(c.canonicalize(Some("새우깡 90g")).as_str(), "90g새우깡");
    }

    #[test]
    fn test_segmenter_can_be_swapped() {
        let config = MergeConfig::default();
        let v = vocab(&["딸기"]);
        let default_key = NameCanonicalizer::new(&v, &config).canonicalize(Some("딸기우유"));
        let plain_key = NameCanonicalizer::new(&v, &config)
            .with_segmenter(WhitespaceSegmenter)
            .canonicalize(Some("딸기우유"));
        assert_eq!(default_key.as_str(), "딸기우유");
        assert_eq!(plain_key.as_str(), "딸기우유");

        let split = NameCanonicalizer::new(&v, &config).canonicalize(Some("우유 딸기"));
        let unsplit = NameCanonicalizer::new(&v, &config)
            .with_segmenter(WhitespaceSegmenter)
            .canonicalize(Some("우유딸기"));
        assert_eq!(split.as_str(), "딸기우유");
        assert_eq!(unsplit.as_str(), "우유딸기");
    }
}
