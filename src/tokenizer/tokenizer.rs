use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;

/// One token produced by the tokenizer.
///
/// `text` is the normalized match (lower-cased and stemmed in phrasing
/// mode); `start` and `length` are byte offsets into the *original* input,
/// so highlight ranges reconstruct correctly even when stemming shortens
/// the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub start: u32,
    pub length: u32,
    pub text: String,
}

impl Token {
    pub fn new(start: u32, length: u32, text: String) -> Self {
        Self {
            start,
            length,
            text,
        }
    }
}

/// How a piece of content should be tokenized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizeMode {
    /// Prose: word-boundary splits, stop-word removal, stemming.
    Phrasing,
    /// Verbatim blocks: identifier-aware splits, no stemming or stop-words.
    Code,
}

/// Text tokenizer with stemming and stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
    identifier: Regex,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
            identifier: Regex::new(r"[\w-]+").unwrap(),
        }
    }

    /// Tokenize `text` in the given mode.
    pub fn tokenize(&self, text: &str, mode: TokenizeMode) -> Vec<Token> {
        match mode {
            TokenizeMode::Phrasing => self.tokenize_phrasing(text),
            TokenizeMode::Code => self.tokenize_code(text),
        }
    }

    /// Split prose into word tokens.
    ///
    /// Words are Unicode word-boundary segments (whitespace, punctuation
    /// and hyphen runs all separate words). Stop-words are dropped before
    /// stemming; offsets always cover the unnormalized word.
    pub fn tokenize_phrasing(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();

        for (offset, word) in text.unicode_word_indices() {
            let mut token = word.to_string();
            if self.config.lowercase {
                token = token.to_lowercase();
            }

            if token.is_empty() || self.stopwords.contains(&token) {
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            tokens.push(Token::new(offset as u32, word.len() as u32, token));
        }

        tokens
    }

    /// Split verbatim text into identifier subtokens.
    ///
    /// Identifier runs are broken at underscores and camelCase boundaries;
    /// subtokens of three or more characters are emitted lower-cased, with
    /// no stemming and no stop-word filtering.
    pub fn tokenize_code(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();

        for m in self.identifier.find_iter(text) {
            for (start, part) in split_identifier(m.as_str()) {
                if part.chars().count() > 2 {
                    tokens.push(Token::new(
                        (m.start() + start) as u32,
                        part.len() as u32,
                        part.to_lowercase(),
                    ));
                }
            }
        }

        tokens
    }
}

/// Split an identifier into subtokens at underscore runs and camelCase
/// boundaries, returning each subtoken with its byte offset.
fn split_identifier(identifier: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;

    for (i, ch) in identifier.char_indices() {
        if ch == '_' {
            if let Some(s) = start.take() {
                parts.push((s, &identifier[s..i]));
            }
        } else if ch.is_uppercase() {
            if let Some(s) = start.take() {
                parts.push((s, &identifier[s..i]));
            }
            start = Some(i);
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        parts.push((s, &identifier[s..]));
    }

    parts
}
