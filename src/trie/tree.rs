use std::collections::HashMap;

use super::node::{merge_ranges, Range, TrieNode};
use crate::encoding::{Decoder, Encoder};
use crate::error::{Result, SearchError};

/// Compressed radix trie over token text.
///
/// Edges carry multi-character fragments; a chain of single-child nodes is
/// always collapsed into one edge, and an edge is only split at the moment
/// two inserted words diverge. Each node's postings record where the word
/// spelled out by the path to that node occurs.
#[derive(Clone, Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one occurrence of `text` for the given location.
    pub fn insert(&mut self, text: &str, location_id: u32, range: Range) {
        let mut node = &mut self.root;
        let mut text = text;

        loop {
            let first = match text.chars().next() {
                Some(first) => first,
                None => {
                    node.add_position(location_id, range);
                    return;
                }
            };

            if !node.children.contains_key(&first) {
                let mut leaf = TrieNode::new(text.to_string());
                leaf.add_position(location_id, range);
                node.children.insert(first, leaf);
                return;
            }

            let child = node.children.get_mut(&first).unwrap();
            let common = common_prefix_len(&child.fragment, text);

            // Diverged mid-edge: split the edge at the divergence point and
            // re-parent the original child under the new intermediate node.
            if common < child.fragment.len() {
                split_edge(child, common);
            }

            text = &text[common..];
            node = child;
        }
    }

    /// Find every location matching `prefix`, with merged ranges.
    ///
    /// A query that ends partway along an edge matches everything below
    /// that edge; a query that diverges from every edge matches nothing.
    pub fn search(&self, prefix: &str) -> HashMap<u32, Vec<Range>> {
        let mut node = &self.root;
        let mut text = prefix;

        while !text.is_empty() {
            let first = text.chars().next().unwrap();
            let child = match node.children.get(&first) {
                Some(child) => child,
                None => return HashMap::new(),
            };

            if text.len() >= child.fragment.len() {
                if !text.starts_with(child.fragment.as_str()) {
                    return HashMap::new();
                }
                text = &text[child.fragment.len()..];
            } else {
                // The query is a prefix of this edge: everything below matches.
                if !child.fragment.starts_with(text) {
                    return HashMap::new();
                }
                text = "";
            }

            node = child;
        }

        let mut found: HashMap<u32, Vec<Range>> = HashMap::new();
        let mut stack = vec![node];

        while let Some(node) = stack.pop() {
            for (&location_id, ranges) in &node.postings {
                merge_ranges(found.entry(location_id).or_default(), ranges);
            }
            stack.extend(node.children.values());
        }

        found
    }

    /// Reconstruct every indexed word by accumulating edge fragments on a
    /// path buffer during traversal.
    pub fn terms(&self) -> Vec<String> {
        let mut words = Vec::new();
        let mut buffer = String::new();
        let mut stack = vec![(self.root.children.values(), 0usize)];

        loop {
            let next = match stack.last_mut() {
                Some((iter, _)) => iter.next(),
                None => break,
            };

            match next {
                Some(child) => {
                    buffer.push_str(&child.fragment);
                    if !child.postings.is_empty() {
                        words.push(buffer.clone());
                    }
                    stack.push((child.children.values(), child.fragment.len()));
                }
                None => {
                    let (_, fragment_len) = stack.pop().unwrap();
                    buffer.truncate(buffer.len() - fragment_len);
                }
            }
        }

        words
    }

    /// Node count and maximum depth, for index statistics.
    pub fn measure(&self) -> (usize, usize) {
        let mut nodes = 0;
        let mut max_depth = 0;
        let mut stack = vec![(&self.root, 1usize)];

        while let Some((node, depth)) = stack.pop() {
            nodes += 1;
            max_depth = max_depth.max(depth);
            for child in node.children.values() {
                stack.push((child, depth + 1));
            }
        }

        (nodes, max_depth)
    }

    /// Serialize the trie with the stack tree protocol.
    pub fn store(&self, enc: &mut Encoder) {
        let mut pending_pops: u32 = 0;
        let mut node_count = 1usize;

        self.root.store(enc);
        let mut stack = vec![self.root.children.values()];

        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(child) => {
                    if pending_pops > 0 {
                        enc.write_vlq(pending_pops);
                        pending_pops = 0;
                    }
                    child.store(enc);
                    node_count += 1;
                    stack.push(child.children.values());
                }
                None => {
                    stack.pop();
                    pending_pops += 1;
                }
            }
        }

        if pending_pops > 0 {
            enc.write_vlq(pending_pops);
        }

        tracing::debug!(nodes = node_count, "stored index tree");
    }

    /// Decode a trie, replaying the depth-first encoding with an explicit
    /// node stack; pop counts attach completed subtrees to their parents.
    pub fn load(dec: &mut Decoder) -> Result<Self> {
        let mut stack: Vec<TrieNode> = Vec::new();
        let mut total = 0usize;

        loop {
            let (node, has_children) = TrieNode::load(dec)?;
            total += 1;
            stack.push(node);

            if has_children {
                continue;
            }

            let mut pops = dec.read_vlq()?;
            while pops > 0 {
                let child = stack.pop().ok_or(SearchError::StackUnderflow)?;
                pops -= 1;

                match stack.last_mut() {
                    Some(parent) => {
                        let key = child.fragment.chars().next().ok_or_else(|| {
                            SearchError::InvalidStructure(
                                "trie child with empty fragment".to_string(),
                            )
                        })?;
                        parent.children.insert(key, child);
                    }
                    None => {
                        if pops > 0 {
                            return Err(SearchError::StackUnderflow);
                        }
                        tracing::debug!(nodes = total, "loaded index tree");
                        return Ok(Self { root: child });
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &TrieNode {
        &self.root
    }
}

/// Byte length of the longest common prefix, aligned to a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;

    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }

    len
}

/// Split a node's edge at `at` bytes: the node keeps the head of its
/// fragment and becomes an intermediate node whose only child carries the
/// tail along with the original postings and children.
fn split_edge(node: &mut TrieNode, at: usize) {
    let tail = node.fragment.split_off(at);
    let tail_first = tail.chars().next().expect("split at fragment end");

    let mut moved = TrieNode::new(tail);
    moved.children = std::mem::take(&mut node.children);
    moved.postings = std::mem::take(&mut node.postings);

    node.children.insert(tail_first, moved);
}
