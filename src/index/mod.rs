//! Index construction and querying.
//!
//! [`IndexBuilder`] runs at build time: it walks each document's structure
//! tree, tokenizes the text leaves, and fills the radix trie. Its
//! [`prepare`](IndexBuilder::prepare) freezes everything into a
//! [`PreparedIndex`], which answers prefix/phrase queries and round-trips
//! through the binary index format.

mod builder;
mod prepared;
mod stats;

pub use builder::IndexBuilder;
pub use prepared::{PreparedIndex, SearchPositions};
pub use stats::IndexStats;
