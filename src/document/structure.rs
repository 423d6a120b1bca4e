use serde::{Deserialize, Serialize};

/// A node in a document's content structure tree.
///
/// The structure tree is the indexable skeleton of a rendered document:
/// element nodes carry a tag name and an ordered list of children, text
/// nodes carry the text content of one leaf. Collaborators produce these
/// from their own content representation (hast, a DOM, markdown output);
/// node types this crate does not recognize deserialize as `Unknown` and
/// are skipped during the walk.
///
/// Text content is optional because the binary index stores only the tree
/// shape: a decoded structure has every `content` set to `None`, which is
/// all selector computation needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructureNode {
    Element {
        #[serde(rename = "tagName")]
        tag_name: String,
        #[serde(default)]
        children: Vec<StructureNode>,
    },
    Text {
        content: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl StructureNode {
    pub fn element(tag_name: &str, children: Vec<StructureNode>) -> Self {
        StructureNode::Element {
            tag_name: tag_name.to_string(),
            children,
        }
    }

    pub fn text(content: &str) -> Self {
        StructureNode::Text {
            content: Some(content.to_string()),
        }
    }
}

/// One text leaf yielded by [`walk`]: the child-index path from the
/// structure root to the leaf, and the leaf's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkItem<'a> {
    pub path: Vec<u32>,
    pub content: &'a str,
}

struct Frame<'a> {
    nodes: &'a [StructureNode],
    index: usize,
}

/// Depth-first iterator over the text leaves of a structure tree.
///
/// Traversal is iterative over a stack of remaining-sibling frames, so
/// arbitrarily deep trees cannot overflow the call stack. Paths count all
/// siblings, text or not, which keeps leaf addresses stable under the
/// selector computation in [`path_to_selector`].
pub struct StructureWalker<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for StructureWalker<'a> {
    type Item = WalkItem<'a>;

    fn next(&mut self) -> Option<WalkItem<'a>> {
        while let Some(frame) = self.stack.last_mut() {
            if frame.index >= frame.nodes.len() {
                self.stack.pop();
                continue;
            }

            let node = &frame.nodes[frame.index];
            frame.index += 1;

            match node {
                StructureNode::Text {
                    content: Some(content),
                } => {
                    let path = self.stack.iter().map(|f| (f.index - 1) as u32).collect();
                    return Some(WalkItem { path, content });
                }
                StructureNode::Text { content: None } => {}
                StructureNode::Element { children, .. } => {
                    self.stack.push(Frame {
                        nodes: children,
                        index: 0,
                    });
                }
                StructureNode::Unknown => {
                    tracing::warn!("skipping unrecognized content node");
                }
            }
        }

        None
    }
}

/// Walk a structure tree, yielding every text leaf with its path.
pub fn walk(roots: &[StructureNode]) -> StructureWalker<'_> {
    StructureWalker {
        stack: vec![Frame {
            nodes: roots,
            index: 0,
        }],
    }
}

/// A DOM selector for a structure path: the `nth-of-type` chain of the
/// enclosing elements and the child index of the final text node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSelector {
    pub selector: String,
    pub index: u32,
}

/// Recompute the DOM-style selector for a walked path.
///
/// Each element along the path contributes `tag:nth-of-type(n)`, where `n`
/// counts preceding siblings with the same tag name. The walk stops at the
/// first non-element node; the returned `index` is the last path component,
/// the text leaf's position among its siblings.
pub fn path_to_selector(roots: &[StructureNode], path: &[u32]) -> StructureSelector {
    let mut children = roots;
    let mut selector: Vec<String> = Vec::new();

    for &index in path {
        let index = index as usize;
        if index >= children.len() {
            break;
        }

        match &children[index] {
            StructureNode::Element {
                tag_name,
                children: element_children,
            } => {
                let mut nth_of_type = 1;
                for previous in &children[..index] {
                    if let StructureNode::Element {
                        tag_name: previous_tag,
                        ..
                    } = previous
                    {
                        if previous_tag == tag_name {
                            nth_of_type += 1;
                        }
                    }
                }

                selector.push(format!("{}:nth-of-type({})", tag_name, nth_of_type));
                children = element_children;
            }
            _ => break,
        }
    }

    StructureSelector {
        selector: selector.join(" > "),
        index: path.last().copied().unwrap_or(0),
    }
}

/// Whether a path passes through a verbatim (`pre` or `code`) element.
///
/// Text under verbatim elements is tokenized in code mode.
pub fn is_verbatim(roots: &[StructureNode], path: &[u32]) -> bool {
    let mut children = roots;

    for &index in path {
        match children.get(index as usize) {
            Some(StructureNode::Element {
                tag_name,
                children: element_children,
            }) => {
                if tag_name == "pre" || tag_name == "code" {
                    return true;
                }
                children = element_children;
            }
            _ => return false,
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<StructureNode> {
        vec![
            StructureNode::element("h1", vec![StructureNode::text("Title")]),
            StructureNode::element(
                "p",
                vec![
                    StructureNode::text("first"),
                    StructureNode::element("em", vec![StructureNode::text("emphasis")]),
                    StructureNode::text("last"),
                ],
            ),
        ]
    }

    #[test]
    fn test_walk_yields_all_text_leaves() {
        let roots = sample();
        let items: Vec<(Vec<u32>, String)> = walk(&roots)
            .map(|item| (item.path, item.content.to_string()))
            .collect();

        assert_eq!(
            items,
            vec![
                (vec![0, 0], "Title".to_string()),
                (vec![1, 0], "first".to_string()),
                (vec![1, 1, 0], "emphasis".to_string()),
                (vec![1, 2], "last".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_empty_element_yields_nothing() {
        let roots = vec![StructureNode::element(
            "div",
            vec![StructureNode::element("hr", vec![])],
        )];
        assert_eq!(walk(&roots).count(), 0);
    }

    #[test]
    fn test_walk_skips_unknown_and_empty_text() {
        let roots = vec![StructureNode::element(
            "p",
            vec![
                StructureNode::Unknown,
                StructureNode::Text { content: None },
                StructureNode::text("kept"),
            ],
        )];

        let items: Vec<WalkItem> = walk(&roots).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "kept");
        // Skipped siblings still count towards the path
        assert_eq!(items[0].path, vec![0, 2]);
    }

    #[test]
    fn test_walk_tolerates_deep_nesting() {
        let mut node = StructureNode::text("leaf");
        for _ in 0..10_000 {
            node = StructureNode::element("div", vec![node]);
        }

        let roots = vec![node];
        let items: Vec<WalkItem> = walk(&roots).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path.len(), 10_001);
    }

    #[test]
    fn test_path_to_selector_counts_nth_of_type() {
        let roots = vec![
            StructureNode::element("p", vec![StructureNode::text("one")]),
            StructureNode::element("h2", vec![StructureNode::text("head")]),
            StructureNode::element("p", vec![StructureNode::text("two")]),
        ];

        let sel = path_to_selector(&roots, &[2, 0]);
        assert_eq!(sel.selector, "p:nth-of-type(2)");
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn test_path_to_selector_nested() {
        let roots = sample();
        let sel = path_to_selector(&roots, &[1, 1, 0]);
        assert_eq!(sel.selector, "p:nth-of-type(1) > em:nth-of-type(1)");
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn test_is_verbatim() {
        let roots = vec![StructureNode::element(
            "pre",
            vec![StructureNode::element(
                "code",
                vec![StructureNode::text("let x = 1;")],
            )],
        )];

        assert!(is_verbatim(&roots, &[0, 0, 0]));

        let prose = sample();
        assert!(!is_verbatim(&prose, &[1, 0]));
    }

    #[test]
    fn test_deserialize_unknown_node_type() {
        let json = r#"[
            {"type": "element", "tagName": "p", "children": [
                {"type": "comment"},
                {"type": "text", "content": "hello"}
            ]}
        ]"#;

        let roots: Vec<StructureNode> = serde_json::from_str(json).unwrap();
        let items: Vec<WalkItem> = walk(&roots).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, vec![0, 1]);
    }
}
