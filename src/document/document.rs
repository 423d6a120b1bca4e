use serde::{Deserialize, Serialize};

use super::structure::StructureNode;
use crate::encoding::structure::{decode_structure, encode_structure};
use crate::encoding::{Decoder, Encoder};
use crate::error::Result;

/// One indexed document.
///
/// The structure tree travels with the document in the binary index so the
/// query side can map match locations back to DOM selectors. Only the tree
/// shape is stored; text content stays with the rendered page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: u32,
    pub page: bool,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub structure: Vec<StructureNode>,
}

impl IndexDocument {
    pub fn new(id: u32, slug: &str, title: &str) -> Self {
        Self {
            id,
            page: false,
            slug: slug.to_string(),
            title: title.to_string(),
            excerpt: None,
            structure: Vec::new(),
        }
    }

    /// Site-relative URL: pages live at the root, everything else under /blog.
    pub fn url(&self) -> String {
        if self.page {
            format!("/{}", self.slug)
        } else {
            format!("/blog/{}", self.slug)
        }
    }

    pub fn store(&self, enc: &mut Encoder) {
        let mut tag = self.id << 2;
        if self.excerpt.is_some() {
            tag |= 0x02;
        }
        if self.page {
            tag |= 0x01;
        }

        enc.write_vlq(tag);
        enc.write_str(&self.slug);
        enc.write_str(&self.title);

        if let Some(excerpt) = &self.excerpt {
            enc.write_str(excerpt);
        }

        encode_structure(enc, &self.structure);
    }

    pub fn load(dec: &mut Decoder) -> Result<Self> {
        let tag = dec.read_vlq()?;
        let slug = dec.read_str()?;
        let title = dec.read_str()?;

        let excerpt = if tag & 0x02 == 0x02 {
            Some(dec.read_str()?)
        } else {
            None
        };

        let structure = decode_structure(dec)?;

        Ok(Self {
            id: tag >> 2,
            page: tag & 0x01 == 0x01,
            slug,
            title,
            excerpt,
            structure,
        })
    }
}
