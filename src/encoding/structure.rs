//! Stack-tree codec for document structure.
//!
//! A structure tree is serialized depth-first with no offsets or pointers:
//! each node is one tagged VLQ whose low bit records whether children
//! follow, and every childless node is followed by a VLQ pop count telling
//! the decoder how many stack frames to discard before the next sibling or
//! ancestor. Element tag names are interned into a small dictionary written
//! ahead of the nodes.

use std::collections::HashMap;

use super::{Decoder, Encoder};
use crate::document::StructureNode;
use crate::error::{Result, SearchError};

const KIND_ELEMENT: u32 = 0x01;
const KIND_TEXT: u32 = 0x02;

/// Encode a structure tree into `enc`.
pub fn encode_structure(enc: &mut Encoder, roots: &[StructureNode]) {
    let names = gather_names(roots);

    // Dictionary of element tag names; id 0 is reserved for the empty name.
    let mut entries: Vec<(&str, u32)> = names.iter().map(|(name, &id)| (*name, id)).collect();
    entries.sort_by_key(|&(_, id)| id);

    enc.write_vlq(entries.len() as u32);
    for (name, id) in entries {
        enc.write_vlq(id);
        enc.write_str(name);
    }

    enc.write_vlq(roots.len() as u32);
    for root in roots {
        encode_node(enc, root, &names);
    }
}

/// Decode a structure tree from `dec`.
///
/// Text content is not part of the encoding; decoded text nodes carry
/// `content: None`.
pub fn decode_structure(dec: &mut Decoder) -> Result<Vec<StructureNode>> {
    let mut names: HashMap<u32, String> = HashMap::new();

    let mut num_names = dec.read_vlq()?;
    while num_names > 0 {
        let id = dec.read_vlq()?;
        let name = dec.read_str()?;
        names.insert(id, name);
        num_names -= 1;
    }

    let mut num_roots = dec.read_vlq()?;
    let mut roots = Vec::with_capacity(num_roots as usize);
    while num_roots > 0 {
        roots.push(decode_node(dec, &names)?);
        num_roots -= 1;
    }

    Ok(roots)
}

fn gather_names(roots: &[StructureNode]) -> HashMap<&str, u32> {
    let mut names: HashMap<&str, u32> = HashMap::new();
    names.insert("", 0);

    let mut stack: Vec<&StructureNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if let StructureNode::Element { tag_name, children } = node {
            let next_id = names.len() as u32;
            names.entry(tag_name.as_str()).or_insert(next_id);
            stack.extend(children.iter().rev());
        }
    }

    names
}

fn node_tag(node: &StructureNode, names: &HashMap<&str, u32>) -> u32 {
    match node {
        StructureNode::Element { tag_name, children } => {
            let name_id = names[tag_name.as_str()];
            let mut tag = (name_id << 3) | (KIND_ELEMENT << 1);
            if !children.is_empty() {
                tag |= 0x01;
            }
            tag
        }
        // Unknown nodes are stored as empty text placeholders so sibling
        // indices (and therefore walked paths) survive a round-trip.
        StructureNode::Text { .. } | StructureNode::Unknown => KIND_TEXT << 1,
    }
}

fn node_children(node: &StructureNode) -> &[StructureNode] {
    match node {
        StructureNode::Element { children, .. } => children,
        _ => &[],
    }
}

fn encode_node(enc: &mut Encoder, root: &StructureNode, names: &HashMap<&str, u32>) {
    let mut pending_pops: u32 = 0;
    let mut stack: Vec<std::slice::Iter<StructureNode>> = Vec::new();

    emit_node(enc, root, names, &mut pending_pops);
    stack.push(node_children(root).iter());

    while let Some(top) = stack.last_mut() {
        match top.next() {
            Some(child) => {
                emit_node(enc, child, names, &mut pending_pops);
                stack.push(node_children(child).iter());
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
}

fn emit_node(
    enc: &mut Encoder,
    node: &StructureNode,
    names: &HashMap<&str, u32>,
    pending_pops: &mut u32,
) {
    if *pending_pops > 0 {
        enc.write_vlq(*pending_pops);
        *pending_pops = 0;
    }

    enc.write_vlq(node_tag(node, names));
}

fn decode_node(dec: &mut Decoder, names: &HashMap<u32, String>) -> Result<StructureNode> {
    let mut stack: Vec<StructureNode> = Vec::new();

    loop {
        let tag = dec.read_vlq()?;
        let has_children = tag & 0x01 == 0x01;
        let kind = (tag & 0x06) >> 1;

        let node = match kind {
            KIND_TEXT => {
                if has_children {
                    return Err(SearchError::InvalidStructure(
                        "text node cannot have children".to_string(),
                    ));
                }
                StructureNode::Text { content: None }
            }
            KIND_ELEMENT => {
                let name_id = tag >> 3;
                let tag_name = names.get(&name_id).ok_or_else(|| {
                    SearchError::InvalidStructure(format!("unknown tag name id {}", name_id))
                })?;
                StructureNode::Element {
                    tag_name: tag_name.clone(),
                    children: Vec::new(),
                }
            }
            kind => return Err(SearchError::InvalidNodeKind(kind)),
        };

        stack.push(node);

        if has_children {
            continue;
        }

        let mut pops = dec.read_vlq()?;
        while pops > 0 {
            let child = stack.pop().ok_or(SearchError::StackUnderflow)?;
            pops -= 1;

            match stack.last_mut() {
                Some(StructureNode::Element { children, .. }) => children.push(child),
                Some(_) => {
                    return Err(SearchError::InvalidStructure(
                        "text node cannot have children".to_string(),
                    ))
                }
                None => {
                    if pops > 0 {
                        return Err(SearchError::StackUnderflow);
                    }
                    return Ok(child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::structure::{path_to_selector, walk};

    fn roundtrip(roots: &[StructureNode]) -> Vec<StructureNode> {
        let mut enc = Encoder::new();
        encode_structure(&mut enc, roots);

        let data = enc.finish();
        let mut dec = Decoder::new(&data);
        let decoded = decode_structure(&mut dec).unwrap();
        assert!(dec.at_end());
        decoded
    }

    #[test]
    fn test_roundtrip_preserves_shape() {
        let roots = vec![
            StructureNode::element("h1", vec![StructureNode::text("Title")]),
            StructureNode::element(
                "p",
                vec![
                    StructureNode::text("some"),
                    StructureNode::element("strong", vec![StructureNode::text("bold")]),
                ],
            ),
        ];

        let decoded = roundtrip(&roots);

        // Shape survives; content does not travel with the structure.
        let original_paths: Vec<Vec<u32>> = walk(&roots).map(|item| item.path).collect();
        let decoded_selectors: Vec<_> = original_paths
            .iter()
            .map(|path| path_to_selector(&decoded, path))
            .collect();
        let original_selectors: Vec<_> = original_paths
            .iter()
            .map(|path| path_to_selector(&roots, path))
            .collect();
        assert_eq!(decoded_selectors, original_selectors);

        // Decoded text leaves are empty
        assert_eq!(walk(&decoded).count(), 0);
    }

    #[test]
    fn test_roundtrip_empty_structure() {
        assert!(roundtrip(&[]).is_empty());
    }

    #[test]
    fn test_unknown_nodes_keep_sibling_indices() {
        let roots = vec![StructureNode::element(
            "p",
            vec![
                StructureNode::Unknown,
                StructureNode::element("em", vec![StructureNode::text("x")]),
            ],
        )];

        let decoded = roundtrip(&roots);
        let sel = path_to_selector(&decoded, &[0, 1, 0]);
        assert_eq!(sel.selector, "p:nth-of-type(1) > em:nth-of-type(1)");
    }

    #[test]
    fn test_deep_structure_roundtrip() {
        let mut node = StructureNode::text("leaf");
        for _ in 0..5_000 {
            node = StructureNode::element("div", vec![node]);
        }

        let decoded = roundtrip(&[node]);
        let mut depth = 0;
        let mut current = &decoded[0];
        while let StructureNode::Element { children, .. } = current {
            depth += 1;
            current = &children[0];
        }
        assert_eq!(depth, 5_000);
    }

    #[test]
    fn test_invalid_node_kind_is_fatal() {
        let mut enc = Encoder::new();
        enc.write_vlq(1); // one dictionary entry
        enc.write_vlq(0);
        enc.write_str("");
        enc.write_vlq(1); // one root
        enc.write_vlq(0x06); // kind 3: invalid

        let data = enc.finish();
        let mut dec = Decoder::new(&data);
        assert!(matches!(
            decode_structure(&mut dec),
            Err(SearchError::InvalidNodeKind(3))
        ));
    }

    #[test]
    fn test_truncated_structure_is_fatal() {
        let roots = vec![StructureNode::element(
            "p",
            vec![StructureNode::text("hello")],
        )];

        let mut enc = Encoder::new();
        encode_structure(&mut enc, &roots);
        let data = enc.finish();

        let mut dec = Decoder::new(&data[..data.len() - 1]);
        assert!(decode_structure(&mut dec).is_err());
    }
}
