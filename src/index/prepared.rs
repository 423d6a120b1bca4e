use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::TokenizerConfig;
use crate::document::{path_to_selector, IndexDocument, LocationTable, StructureSelector};
use crate::encoding::{Decoder, Encoder};
use crate::error::{Result, SearchError};
use crate::tokenizer::{TokenizeMode, Tokenizer};
use crate::trie::{merge_ranges, Range, Trie};

use super::builder::IndexBuilder;
use super::stats::IndexStats;

const MAGIC: u32 = 0x53524348;
const FORMAT_VERSION: u32 = 1;

/// All matches within one location: the ranges to highlight there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPositions {
    pub location_id: u32,
    pub ranges: Vec<Range>,
}

/// An immutable, queryable search index.
///
/// Produced either by [`IndexBuilder::prepare`] at build time or by
/// [`load`](Self::load) from the binary blob at query time. Queries take
/// `&self`, so a prepared index can serve any number of concurrent readers.
pub struct PreparedIndex {
    documents: HashMap<u32, IndexDocument>,
    locations: LocationTable,
    tree: Trie,
    tokenizer: Tokenizer,
}

impl PreparedIndex {
    pub(super) fn from_builder(builder: IndexBuilder) -> Self {
        Self {
            documents: builder.documents,
            locations: builder.locations,
            tree: builder.tree,
            tokenizer: builder.tokenizer,
        }
    }

    pub fn document(&self, doc_id: u32) -> Option<&IndexDocument> {
        self.documents.get(&doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &IndexDocument> {
        self.documents.values()
    }

    /// Resolve a match location to a DOM selector in its document.
    pub fn selector(&self, location_id: u32) -> Option<StructureSelector> {
        let location = self.locations.get(location_id)?;
        let doc = self.documents.get(&location.doc_id)?;
        Some(path_to_selector(&doc.structure, &location.path))
    }

    /// Every indexed term, reconstructed from the trie.
    pub fn terms(&self) -> Vec<String> {
        self.tree.terms()
    }

    pub fn stats(&self) -> IndexStats {
        let (nodes, max_depth) = self.tree.measure();
        IndexStats {
            documents: self.documents.len(),
            locations: self.locations.len(),
            terms: self.tree.terms().len(),
            nodes,
            max_depth,
        }
    }

    /// Search every document for a phrase.
    ///
    /// The input is tokenized like document prose; the last token matches
    /// as a prefix, so partially typed words still find their completions.
    /// A document matches only if every token occurs somewhere in it (the
    /// tokens need not be adjacent or ordered). Returns, per matching
    /// document, the match positions sorted by location id.
    pub fn search(&self, input: &str) -> HashMap<u32, Vec<SearchPositions>> {
        self.search_constrained(input, None)
    }

    /// Search within a single document, e.g. to re-highlight a result page.
    pub fn search_document(&self, input: &str, doc_id: u32) -> Vec<SearchPositions> {
        self.search_constrained(input, Some(doc_id))
            .remove(&doc_id)
            .unwrap_or_default()
    }

    fn search_constrained(
        &self,
        input: &str,
        target: Option<u32>,
    ) -> HashMap<u32, Vec<SearchPositions>> {
        let tokens = self.tokenizer.tokenize(input, TokenizeMode::Phrasing);
        if tokens.is_empty() {
            return HashMap::new();
        }

        // Per token, matches grouped by owning document.
        let mut token_hits: Vec<HashMap<u32, HashMap<u32, Vec<Range>>>> = Vec::new();

        for token in &tokens {
            let found = self.tree.search(&token.text);

            let mut grouped: HashMap<u32, HashMap<u32, Vec<Range>>> = HashMap::new();
            for (location_id, ranges) in found {
                let location = match self.locations.get(location_id) {
                    Some(location) => location,
                    None => continue,
                };
                if target.is_some_and(|doc_id| doc_id != location.doc_id) {
                    continue;
                }

                grouped
                    .entry(location.doc_id)
                    .or_default()
                    .insert(location_id, ranges);
            }

            // A token that matches nowhere empties the intersection.
            if grouped.is_empty() {
                return HashMap::new();
            }
            token_hits.push(grouped);
        }

        let mut doc_ids: Vec<u32> = token_hits[0].keys().copied().collect();
        doc_ids.retain(|doc_id| token_hits.iter().all(|hits| hits.contains_key(doc_id)));

        let mut results = HashMap::new();
        for doc_id in doc_ids {
            let mut by_location: HashMap<u32, Vec<Range>> = HashMap::new();
            for hits in &token_hits {
                for (&location_id, ranges) in &hits[&doc_id] {
                    merge_ranges(by_location.entry(location_id).or_default(), ranges);
                }
            }

            let mut positions: Vec<SearchPositions> = by_location
                .into_iter()
                .map(|(location_id, ranges)| SearchPositions {
                    location_id,
                    ranges,
                })
                .collect();
            positions.sort_by_key(|p| p.location_id);

            results.insert(doc_id, positions);
        }

        results
    }

    /// Encode match positions into a compact URL-safe string.
    ///
    /// Result pages receive this in their URL and decode it to highlight
    /// the matched ranges without re-running the query.
    pub fn encode_positions(positions: &[SearchPositions]) -> String {
        let mut enc = Encoder::new();

        enc.write_vlq(positions.len() as u32);
        for position in positions {
            enc.write_vlq(position.location_id);
            enc.write_vlq(position.ranges.len() as u32);
            for range in &position.ranges {
                enc.write_vlq(range.start);
                enc.write_vlq(range.length);
            }
        }

        URL_SAFE_NO_PAD.encode(enc.finish())
    }

    pub fn decode_positions(encoded: &str) -> Result<Vec<SearchPositions>> {
        let data = URL_SAFE_NO_PAD.decode(encoded)?;
        let mut dec = Decoder::new(&data);

        let mut positions = Vec::new();
        let mut count = dec.read_vlq()?;
        while count > 0 {
            let location_id = dec.read_vlq()?;
            let mut ranges = Vec::new();

            let mut num_ranges = dec.read_vlq()?;
            while num_ranges > 0 {
                let start = dec.read_vlq()?;
                let length = dec.read_vlq()?;
                ranges.push(Range::new(start, length));
                num_ranges -= 1;
            }

            positions.push(SearchPositions {
                location_id,
                ranges,
            });
            count -= 1;
        }

        Ok(positions)
    }

    /// Serialize the whole index into one binary blob.
    pub fn store(&self) -> Vec<u8> {
        let mut enc = Encoder::new();

        enc.write_u32(MAGIC);
        enc.write_vlq(FORMAT_VERSION);

        enc.write_vlq(self.documents.len() as u32);
        let mut ids: Vec<u32> = self.documents.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.documents[&id].store(&mut enc);
        }

        self.locations.store(&mut enc);
        self.tree.store(&mut enc);

        let data = enc.finish();
        tracing::debug!(bytes = data.len(), "stored prepared index");
        data
    }

    pub fn load(data: &[u8]) -> Result<Self> {
        Self::load_with_config(data, &TokenizerConfig::default())
    }

    /// Decode an index built with a non-default tokenizer configuration.
    ///
    /// The configuration is not part of the binary format; callers must
    /// pass the one the builder used, or queries will tokenize differently
    /// than the indexed text did.
    pub fn load_with_config(data: &[u8], config: &TokenizerConfig) -> Result<Self> {
        let mut dec = Decoder::new(data);

        let magic = dec.read_u32()?;
        if magic != MAGIC {
            return Err(SearchError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }

        let version = dec.read_vlq()?;
        if version != FORMAT_VERSION {
            return Err(SearchError::UnsupportedVersion {
                expected: FORMAT_VERSION,
                found: version,
            });
        }

        let mut documents = HashMap::new();
        let mut doc_count = dec.read_vlq()?;
        while doc_count > 0 {
            let doc = IndexDocument::load(&mut dec)?;
            documents.insert(doc.id, doc);
            doc_count -= 1;
        }

        let locations = LocationTable::load(&mut dec)?;
        let tree = Trie::load(&mut dec)?;

        tracing::debug!(
            bytes = data.len(),
            documents = documents.len(),
            locations = locations.len(),
            "loaded prepared index"
        );

        Ok(Self {
            documents,
            locations,
            tree,
            tokenizer: Tokenizer::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StructureNode;

    fn build_fixture() -> PreparedIndex {
        let mut builder = IndexBuilder::new();

        let mut doc = IndexDocument::new(1, "trees", "On Trees");
        doc.structure = vec![
            StructureNode::element("h1", vec![StructureNode::text("Radix trees")]),
            StructureNode::element(
                "p",
                vec![StructureNode::text("A compressed tree stores prefixes")],
            ),
        ];
        builder.add_document(doc).unwrap();

        let mut doc = IndexDocument::new(2, "tries", "On Tries");
        doc.structure = vec![StructureNode::element(
            "p",
            vec![StructureNode::text("A trie stores tokens")],
        )];
        builder.add_document(doc).unwrap();

        builder.prepare()
    }

    #[test]
    fn test_single_token_search_groups_by_document() {
        let index = build_fixture();

        let results = index.search("stores");
        assert_eq!(results.len(), 2);
        assert!(results.contains_key(&1));
        assert!(results.contains_key(&2));
    }

    #[test]
    fn test_multi_token_search_intersects_documents() {
        let index = build_fixture();

        // "compressed" only in doc 1, "stores" in both
        let results = index.search("compressed stores");
        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&1));

        // No document has both
        assert!(index.search("trie compressed").is_empty());
    }

    #[test]
    fn test_unknown_token_yields_empty_results() {
        let index = build_fixture();
        assert!(index.search("zzz").is_empty());
        assert!(index.search("stores zzz").is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_results() {
        let index = build_fixture();
        assert!(index.search("").is_empty());
        assert!(index.search("... !!!").is_empty());
    }

    #[test]
    fn test_search_document_constrains_results() {
        let index = build_fixture();

        let positions = index.search_document("stores", 2);
        assert!(!positions.is_empty());

        assert!(index.search_document("compressed", 2).is_empty());
    }

    #[test]
    fn test_positions_are_sorted_by_location() {
        let index = build_fixture();

        let results = index.search("tree");
        let positions = &results[&1];
        let ids: Vec<u32> = positions.iter().map(|p| p.location_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_selector_resolution() {
        let index = build_fixture();

        let results = index.search("compressed");
        let positions = &results[&1];
        let selector = index.selector(positions[0].location_id).unwrap();
        assert_eq!(selector.selector, "p:nth-of-type(1)");
    }

    #[test]
    fn test_position_string_roundtrip() {
        let positions = vec![
            SearchPositions {
                location_id: 3,
                ranges: vec![Range::new(0, 5), Range::new(12, 4)],
            },
            SearchPositions {
                location_id: 9,
                ranges: vec![Range::new(100, 7)],
            },
        ];

        let encoded = PreparedIndex::encode_positions(&positions);
        let decoded = PreparedIndex::decode_positions(&encoded).unwrap();
        assert_eq!(decoded, positions);
    }

    #[test]
    fn test_position_string_rejects_garbage() {
        assert!(PreparedIndex::decode_positions("not base64 !!!").is_err());
    }

    #[test]
    fn test_bad_magic_is_fatal() {
        let index = build_fixture();
        let mut data = index.store();
        data[0] ^= 0xff;

        assert!(matches!(
            PreparedIndex::load(&data),
            Err(SearchError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        let index = build_fixture();
        let mut data = index.store();
        // Version VLQ sits right after the 4-byte magic
        data[4] = 0x63;

        assert!(matches!(
            PreparedIndex::load(&data),
            Err(SearchError::UnsupportedVersion { found: 0x63, .. })
        ));
    }

    #[test]
    fn test_truncated_blob_is_fatal() {
        let index = build_fixture();
        let data = index.store();

        assert!(PreparedIndex::load(&data[..data.len() / 2]).is_err());
        assert!(PreparedIndex::load(&[]).is_err());
    }

    #[test]
    fn test_stats() {
        let index = build_fixture();
        let stats = index.stats();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.locations, 3);
        assert!(stats.terms > 0);
        assert!(stats.nodes > stats.terms);
        assert!(stats.max_depth >= 2);
    }
}
