//! # Segmentation Module
//!
//! Splits a cleaned name into tokens. The default strategy forces a
//! boundary around every vocabulary token occurrence so compound runs
//! like "딸기맛초코" separate into units the corpus recognizes. Any
//! other tokenizer can be plugged in through [`Segmenter`].

use crate::vocabulary::Vocabulary;

/// Strategy turning cleaned text into tokens
pub trait Segmenter {
    fn segment(&self, text: &str, vocabulary: &Vocabulary) -> Vec<String>;
}

impl<T: Segmenter + ?Sized> Segmenter for &T {
    fn segment(&self, text: &str, vocabulary: &Vocabulary) -> Vec<String> {
        (**self).segment(text, vocabulary)
    }
}

/// Longest-match-first vocabulary segmentation followed by a whitespace split
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularySegmenter;

impl Segmenter for VocabularySegmenter {
    fn segment(&self, text: &str, vocabulary: &Vocabulary) -> Vec<String> {
        match vocabulary.split_pattern() {
            Some(pattern) => pattern
                .replace_all(text, " ${1} ")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            None => split_on_whitespace(text),
        }
    }
}

/// Plain whitespace split; ignores the vocabulary
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str, _vocabulary: &Vocabulary) -> Vec<String> {
        split_on_whitespace(text)
    }
}

fn split_on_whitespace(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
