use serde::{Deserialize, Serialize};

/// Tokenizer configuration
///
/// The same configuration must be used when building an index and when
/// tokenizing queries against it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub language: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            language: "english".to_string(),
        }
    }
}
