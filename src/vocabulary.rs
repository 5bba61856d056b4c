//! # Vocabulary Module
//!
//! Learns the split vocabulary from the nutrition dataset's name column.
//! Tokens are ranked by frequency, noise words are removed, and the
//! result is reproducible for identical input: ties in frequency are
//! broken by first appearance in the corpus.

use std::cmp::Reverse;
use std::collections::HashMap;

use log::{debug, info, trace};
use regex::Regex;

use crate::merge_config::{MergeConfig, NoiseWords};
use crate::merge_errors::MergeError;

/// Frequency-ranked tokens plus the longest-first split pattern built from them
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    split_pattern: Option<Regex>,
}

impl Vocabulary {
    /// Build a vocabulary from already ranked tokens
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, MergeError> {
        let split_pattern = build_split_pattern(&tokens)?;
        Ok(Self {
            tokens,
            split_pattern,
        })
    }

    /// Tokens in frequency order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Alternation of every token, longest first; `None` for an empty vocabulary
    pub fn split_pattern(&self) -> Option<&Regex> {
        self.split_pattern.as_ref()
    }
}

fn build_split_pattern(tokens: &[String]) -> Result<Option<Regex>, MergeError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut by_length: Vec<&String> = tokens.iter().collect();
    // Stable: equal lengths keep frequency order
    by_length.sort_by_key(|t| Reverse(t.chars().count()));
    let alternation = by_length
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!("({alternation})"))?))
}

/// Extracts and ranks candidate tokens from a name corpus
pub struct VocabularyBuilder {
    token_pattern: Regex,
    noise_words: NoiseWords,
    top_n: usize,
}

impl VocabularyBuilder {
    pub fn new(config: &MergeConfig) -> Result<Self, MergeError> {
        Ok(Self {
            token_pattern: Regex::new(&config.token_pattern)?,
            noise_words: config.noise_words.clone(),
            top_n: config.vocabulary_top_n,
        })
    }

    /// Rank tokens across every present name
    ///
    /// Missing names are skipped. Returns fewer than `top_n` tokens when the
    /// corpus does not contain that many distinct ones.
    pub fn build<'a, I>(&self, names: I) -> Result<Vocabulary, MergeError>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        // token -> (count, first appearance)
        let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;

        for name in names.into_iter().flatten() {
            for m in self.token_pattern.find_iter(name) {
                let entry = counts.entry(m.as_str()).or_insert((0, seen));
                entry.0 += 1;
                seen += 1;
            }
        }
        debug!("Corpus yielded {} distinct candidate tokens", counts.len());

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .filter(|(token, _)| !self.noise_words.contains(token))
            .map(|(token, (count, first))| (token, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(self.top_n);

        for (token, count, _) in ranked.iter().take(20) {
            trace!("vocabulary token '{}' x{}", token, count);
        }

        let tokens: Vec<String> = ranked.into_iter().map(|(t, _, _)| t.to_string()).collect();
        info!("Learned vocabulary of {} tokens (top_n={})", tokens.len(), self.top_n);
        Vocabulary::from_tokens(tokens)
    }
}
