// WHY: Serializes a transformed tree for display; reveal elements become <spoiler> tags
// Pending reveals render a placeholder so partial PII never reaches the page

use super::{MarkupNode, PENDING_ATTRIBUTE, REVEAL_TAG};

/// Text shown in place of a reveal element that is still streaming
pub const PENDING_PLACEHOLDER: &str = "...";

/// Render a tree as HTML
pub fn render_html(node: &MarkupNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text { value } => escape_into(value, out),
        MarkupNode::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, out);
                out.push('"');
            }
            out.push('>');

            let pending = element.tag == REVEAL_TAG && element.attribute(PENDING_ATTRIBUTE).is_some();
            if pending {
                out.push_str(PENDING_PLACEHOLDER);
            } else {
                for child in &element.children {
                    write_node(child, out);
                }
            }

            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
