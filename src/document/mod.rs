//! Documents and their content structure.
//!
//! - `StructureNode`: the hierarchical content tree handed over by the
//!   build pipeline, with an iterative walker over its text leaves and
//!   DOM-selector recomputation for highlighting.
//! - `IndexDocument`: the per-document metadata record stored in the index.
//! - `LocationTable`: dense ids for every (document, path) text leaf.

mod document;
mod location;
pub mod structure;

pub use document::IndexDocument;
pub use location::{DocumentLocation, LocationTable};
pub use structure::{
    is_verbatim, path_to_selector, walk, StructureNode, StructureSelector, StructureWalker,
    WalkItem,
};
