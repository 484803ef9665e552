// WHY: Rewrites marker-delimited text in a rendered tree into reveal elements
// Closed node type so the code-region rule and the rewrite rule are exhaustive matches

use anyhow::Result;
use serde::Serialize;

use crate::marker::{contains_marker, MarkerCodec, Span};

pub mod document;
pub mod html;

pub use document::parse_document;
pub use html::render_html;

/// Tag of the reveal-on-click element produced for sensitive spans
pub const REVEAL_TAG: &str = "spoiler";

/// Attribute present on reveal elements whose closing delimiter has not arrived yet
pub const PENDING_ATTRIBUTE: &str = "pending";

/// Node of a rendered-output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkupNode {
    Text { value: String },
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        MarkupNode::Text { value: value.into() }
    }

    pub fn element(tag: impl Into<String>, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element(Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children,
        })
    }

    pub fn element_with_attributes(
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    ) -> Self {
        MarkupNode::Element(Element {
            tag: tag.into(),
            attributes,
            children,
        })
    }

    /// Reveal element holding a complete sensitive span
    pub fn reveal(content: impl Into<String>) -> Self {
        Self::element(REVEAL_TAG, vec![Self::text(content)])
    }

    /// Reveal element for a span still streaming in; renderers show a placeholder
    pub fn pending_reveal(partial: impl Into<String>) -> Self {
        Self::element_with_attributes(
            REVEAL_TAG,
            vec![(PENDING_ATTRIBUTE.to_string(), String::new())],
            vec![Self::text(partial)],
        )
    }

    pub fn is_reveal(&self) -> bool {
        matches!(self, MarkupNode::Element(element) if element.tag == REVEAL_TAG)
    }

    pub fn is_pending(&self) -> bool {
        match self {
            MarkupNode::Element(element) => {
                element.tag == REVEAL_TAG && element.attribute(PENDING_ATTRIBUTE).is_some()
            }
            MarkupNode::Text { .. } => false,
        }
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Element(element) => &element.children,
            MarkupNode::Text { .. } => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            MarkupNode::Text { value } => value.clone(),
            MarkupNode::Element(element) => {
                element.children.iter().map(MarkupNode::text_content).collect()
            }
        }
    }
}

/// Tags whose subtree is literal text and must never be rewritten
pub fn is_literal_tag(tag: &str) -> bool {
    matches!(tag, "code" | "pre")
}

/// Turns `||…||` markers inside text nodes into reveal elements
pub struct MarkupTransformer {
    codec: MarkerCodec,
}

impl MarkupTransformer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            codec: MarkerCodec::new()?,
        })
    }

    pub fn with_codec(codec: MarkerCodec) -> Self {
        Self { codec }
    }

    /// Return a rewritten copy of `tree`; the input is left untouched.
    ///
    /// A bare text root that needs rewriting comes back wrapped in a `span` element,
    /// since a single node cannot stand for a sequence.
    pub fn transform(&self, tree: &MarkupNode) -> MarkupNode {
        match tree {
            MarkupNode::Text { .. } => {
                let mut rewritten = self.rewrite(tree, false);
                if rewritten.len() == 1 {
                    rewritten.remove(0)
                } else {
                    MarkupNode::element("span", rewritten)
                }
            }
            MarkupNode::Element(_) => self.walk(tree, false),
        }
    }

    fn walk(&self, node: &MarkupNode, inside_literal: bool) -> MarkupNode {
        match node {
            MarkupNode::Text { .. } => node.clone(),
            MarkupNode::Element(element) => {
                let literal = inside_literal || is_literal_tag(&element.tag);
                let children = element
                    .children
                    .iter()
                    .flat_map(|child| self.rewrite(child, literal))
                    .collect();
                MarkupNode::Element(Element {
                    tag: element.tag.clone(),
                    attributes: element.attributes.clone(),
                    children,
                })
            }
        }
    }

    /// Replacement nodes for one child position
    fn rewrite(&self, node: &MarkupNode, literal: bool) -> Vec<MarkupNode> {
        match node {
            MarkupNode::Text { value } if !literal && contains_marker(value) => {
                let spans = self.codec.parse_markers(value);
                if spans.iter().all(Span::is_plain) {
                    return vec![node.clone()];
                }
                spans.into_iter().map(span_node).collect()
            }
            MarkupNode::Text { .. } => vec![node.clone()],
            MarkupNode::Element(_) => vec![self.walk(node, literal)],
        }
    }
}

fn span_node(span: Span) -> MarkupNode {
    match span {
        Span::Plain(text) => MarkupNode::text(text),
        Span::Marked(text) => MarkupNode::reveal(text),
        Span::Pending(text) => MarkupNode::pending_reveal(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> MarkupTransformer {
        MarkupTransformer::new().unwrap()
    }

    fn paragraph(text: &str) -> MarkupNode {
        MarkupNode::element("div", vec![MarkupNode::element("p", vec![MarkupNode::text(text)])])
    }

    #[test]
    fn test_pending_then_closed() {
        let partial = transformer().transform(&paragraph("my number is ||555"));
        let p = &partial.children()[0];
        assert_eq!(p.children().len(), 2);
        assert_eq!(p.children()[0], MarkupNode::text("my number is "));
        assert!(p.children()[1].is_pending());
        assert_eq!(p.children()[1].text_content(), "555");

        let complete = transformer().transform(&paragraph("my number is ||555-1234||"));
        let p = &complete.children()[0];
        assert_eq!(p.children()[1], MarkupNode::reveal("555-1234"));
        assert!(!p.children()[1].is_pending());
    }

    #[test]
    fn test_code_block_untouched_at_any_depth() {
        let tree = MarkupNode::element(
            "div",
            vec![MarkupNode::element(
                "pre",
                vec![MarkupNode::element(
                    "code",
                    vec![MarkupNode::element("span", vec![MarkupNode::text("||secret||")])],
                )],
            )],
        );
        assert_eq!(transformer().transform(&tree), tree);
    }

    #[test]
    fn test_inline_code_untouched_but_siblings_rewritten() {
        let tree = MarkupNode::element(
            "p",
            vec![
                MarkupNode::text("mail ||a@x.com|| or run "),
                MarkupNode::element("code", vec![MarkupNode::text("a || b || c")]),
            ],
        );
        let out = transformer().transform(&tree);
        assert_eq!(
            out.children(),
            &[
                MarkupNode::text("mail "),
                MarkupNode::reveal("a@x.com"),
                MarkupNode::text(" or run "),
                MarkupNode::element("code", vec![MarkupNode::text("a || b || c")]),
            ]
        );
    }

    #[test]
    fn test_nested_non_literal_elements_walked() {
        let tree = MarkupNode::element(
            "ul",
            vec![MarkupNode::element(
                "li",
                vec![MarkupNode::element("strong", vec![MarkupNode::text("||Ann||")])],
            )],
        );
        let out = transformer().transform(&tree);
        let strong = &out.children()[0].children()[0];
        assert_eq!(strong.children(), &[MarkupNode::reveal("Ann")]);
    }

    #[test]
    fn test_bare_trailing_delimiter_left_as_is() {
        let tree = paragraph("trailing ||");
        assert_eq!(transformer().transform(&tree), tree);
    }

    #[test]
    fn test_input_tree_not_modified() {
        let tree = paragraph("||Ann||");
        let before = tree.clone();
        let _ = transformer().transform(&tree);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_text_root_wrapped_when_split() {
        let out = transformer().transform(&MarkupNode::text("hi ||Ann||"));
        assert_eq!(
            out,
            MarkupNode::element("span", vec![MarkupNode::text("hi "), MarkupNode::reveal("Ann")])
        );
        let plain = MarkupNode::text("hi Ann");
        assert_eq!(transformer().transform(&plain), plain);
    }

    #[test]
    fn test_literal_predicate() {
        assert!(is_literal_tag("code"));
        assert!(is_literal_tag("pre"));
        assert!(!is_literal_tag("p"));
    }
}
