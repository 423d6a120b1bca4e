use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::encoding::{Decoder, Encoder};
use crate::error::Result;

/// A half-open character range within one text leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: u32,
    pub length: u32,
}

impl Range {
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// A node in the radix trie.
///
/// `fragment` is the edge label leading into this node: one or more
/// characters, empty only at the root. Children are keyed by the first
/// character of their own fragment, so sibling edges never share a prefix.
/// `postings` maps a location id to the sorted, non-overlapping ranges at
/// which the word ending here occurs in that location.
#[derive(Clone, Debug, Default)]
pub struct TrieNode {
    pub(super) fragment: String,
    pub(super) children: BTreeMap<char, TrieNode>,
    pub(super) postings: HashMap<u32, Vec<Range>>,
}

impl TrieNode {
    pub(super) fn new(fragment: String) -> Self {
        Self {
            fragment,
            children: BTreeMap::new(),
            postings: HashMap::new(),
        }
    }

    /// Record an occurrence, merging overlapping ranges.
    ///
    /// Ranges are kept sorted by start. Inserting a range identical to (or
    /// contained in) an existing one leaves the postings unchanged, which
    /// makes repeated insertion of the same token idempotent. Adjacent but
    /// non-overlapping ranges stay separate.
    pub(super) fn add_position(&mut self, location_id: u32, range: Range) {
        let ranges = self.postings.entry(location_id).or_default();
        merge_range(ranges, range);
    }

    pub(super) fn store(&self, enc: &mut Encoder) {
        let first = self.fragment.chars().next().map(|c| c as u32).unwrap_or(0);

        let mut tag = first << 2;
        if !self.postings.is_empty() {
            tag |= 0x02;
        }
        if !self.children.is_empty() {
            tag |= 0x01;
        }

        enc.write_vlq(tag);

        // Everything after the fragment's first character
        let tail = self
            .fragment
            .char_indices()
            .nth(1)
            .map(|(i, _)| &self.fragment[i..])
            .unwrap_or("");
        enc.write_str(tail);

        if !self.postings.is_empty() {
            enc.write_vlq(self.postings.len() as u32);

            let mut location_ids: Vec<u32> = self.postings.keys().copied().collect();
            location_ids.sort_unstable();

            for location_id in location_ids {
                let ranges = &self.postings[&location_id];
                enc.write_vlq(location_id);
                enc.write_vlq(ranges.len() as u32);
                for range in ranges {
                    enc.write_vlq(range.start);
                    enc.write_vlq(range.length);
                }
            }
        }
    }

    /// Decode one node record; returns the node and whether children follow.
    pub(super) fn load(dec: &mut Decoder) -> Result<(TrieNode, bool)> {
        let tag = dec.read_vlq()?;
        let has_postings = tag & 0x02 == 0x02;
        let has_children = tag & 0x01 == 0x01;

        let tail = dec.read_str()?;
        let mut fragment = String::with_capacity(tail.len() + 4);
        if let Some(first) = char::from_u32(tag >> 2).filter(|&c| c != '\0') {
            fragment.push(first);
        }
        fragment.push_str(&tail);

        let mut node = TrieNode::new(fragment);

        if has_postings {
            let mut num_locations = dec.read_vlq()?;
            while num_locations > 0 {
                let location_id = dec.read_vlq()?;
                let mut ranges = Vec::new();

                let mut num_ranges = dec.read_vlq()?;
                while num_ranges > 0 {
                    let start = dec.read_vlq()?;
                    let length = dec.read_vlq()?;
                    ranges.push(Range::new(start, length));
                    num_ranges -= 1;
                }

                node.postings.insert(location_id, ranges);
                num_locations -= 1;
            }
        }

        Ok((node, has_children))
    }
}

/// Merge `range` into a sorted, non-overlapping range list.
pub(super) fn merge_range(ranges: &mut Vec<Range>, range: Range) {
    // First entry that could overlap or follow the new range
    let mut i = ranges.partition_point(|r| r.end() <= range.start);

    let mut merged = range;
    while i < ranges.len() && ranges[i].overlaps(&merged) {
        let existing = ranges.remove(i);
        let start = merged.start.min(existing.start);
        let end = merged.end().max(existing.end());
        merged = Range::new(start, end - start);
    }

    ranges.insert(i, merged);
}

/// Merge every range of `src` into the sorted list `dst`.
pub(crate) fn merge_ranges(dst: &mut Vec<Range>, src: &[Range]) {
    for &range in src {
        merge_range(dst, range);
    }
}
