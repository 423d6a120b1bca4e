pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod index;
pub mod tokenizer;
pub mod trie;

pub use config::TokenizerConfig;
pub use document::{DocumentLocation, IndexDocument, LocationTable, StructureNode};
pub use error::{Result, SearchError};
pub use index::{IndexBuilder, IndexStats, PreparedIndex, SearchPositions};
pub use tokenizer::{Token, TokenizeMode, Tokenizer};
pub use trie::{Range, Trie};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
