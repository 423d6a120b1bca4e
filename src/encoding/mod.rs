//! Binary codec for the search index.
//!
//! Everything in the index file is built from three primitives: big-endian
//! `u32`s (the file magic), VLQs, and VLQ-length-prefixed UTF-8 strings.
//! Trees (the radix trie and each document's structure) are serialized with
//! the stack tree protocol: depth-first node records with a has-children
//! flag and trailing pop counts instead of offsets or pointers, so encoding
//! needs no backpatching and decoding is a single linear pass.

mod decoder;
mod encoder;
pub mod structure;

pub use decoder::Decoder;
pub use encoder::Encoder;
