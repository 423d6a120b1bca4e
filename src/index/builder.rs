use std::collections::HashMap;

use crate::config::TokenizerConfig;
use crate::document::{is_verbatim, walk, IndexDocument, LocationTable};
use crate::error::{Result, SearchError};
use crate::tokenizer::{TokenizeMode, Tokenizer};
use crate::trie::{Range, Trie};

use super::prepared::PreparedIndex;

/// Accumulates documents into a searchable index.
///
/// Add every document with [`add_document`](Self::add_document), then call
/// [`prepare`](Self::prepare) to freeze the result. The builder is consumed
/// by `prepare`; a prepared index never changes again.
pub struct IndexBuilder {
    pub(super) tokenizer: Tokenizer,
    pub(super) documents: HashMap<u32, IndexDocument>,
    pub(super) locations: LocationTable,
    pub(super) tree: Trie,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::with_config(&TokenizerConfig::default())
    }

    /// Build with a non-default tokenizer configuration. Queries against
    /// the prepared index must use the same configuration.
    pub fn with_config(config: &TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
            documents: HashMap::new(),
            locations: LocationTable::new(),
            tree: Trie::new(),
        }
    }

    /// Index one document: walk its structure tree, tokenize every text
    /// leaf, and record each token's position under a fresh location id.
    ///
    /// Leaves inside `pre`/`code` elements are tokenized in code mode.
    /// Leaves whose text produces no tokens get no location. Inserting an
    /// id twice is a fatal build error.
    pub fn add_document(&mut self, doc: IndexDocument) -> Result<()> {
        if self.documents.contains_key(&doc.id) {
            return Err(SearchError::DuplicateDocument(doc.id));
        }

        let mut leaves = 0usize;
        let mut tokens_total = 0usize;

        for item in walk(&doc.structure) {
            let mode = if is_verbatim(&doc.structure, &item.path) {
                TokenizeMode::Code
            } else {
                TokenizeMode::Phrasing
            };

            let tokens = self.tokenizer.tokenize(item.content, mode);
            if tokens.is_empty() {
                continue;
            }

            let location_id = self.locations.add(doc.id, item.path);
            leaves += 1;
            tokens_total += tokens.len();

            for token in tokens {
                self.tree
                    .insert(&token.text, location_id, Range::new(token.start, token.length));
            }
        }

        tracing::debug!(
            doc_id = doc.id,
            slug = %doc.slug,
            locations = leaves,
            tokens = tokens_total,
            "indexed document"
        );

        self.documents.insert(doc.id, doc);
        Ok(())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Freeze the builder into an immutable, queryable index.
    pub fn prepare(self) -> PreparedIndex {
        PreparedIndex::from_builder(self)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
