// WHY: Minimal text-to-tree builder so generated replies can be rendered without a markdown engine
// Handles what matters for redaction: paragraphs, fenced code blocks and inline code

use super::MarkupNode;

const FENCE: &str = "```";

/// Build a `div` tree from (possibly still streaming) generated text.
///
/// - Blank lines separate `p` paragraphs; single newlines stay inside the paragraph text.
/// - Lines between ``` fences become `pre > code`; an unclosed fence runs to the end,
///   matching how a partial reply renders mid-stream. The fence info string becomes a
///   `language-*` class.
/// - Backtick pairs inside a paragraph become inline `code`; an unpaired backtick is text.
pub fn parse_document(text: &str) -> MarkupNode {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some((language, mut body)) = code.take() {
            if line.trim_start().starts_with(FENCE) {
                blocks.push(code_block(&language, &body));
            } else {
                body.push(line);
                code = Some((language, body));
            }
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(info) = trimmed.strip_prefix(FENCE) {
            flush_paragraph(&mut paragraph, &mut blocks);
            code = Some((info.trim().to_string(), Vec::new()));
        } else if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else {
            paragraph.push(line);
        }
    }

    if let Some((language, body)) = code {
        blocks.push(code_block(&language, &body));
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    MarkupNode::element("div", blocks)
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<MarkupNode>) {
    if lines.is_empty() {
        return;
    }
    let text = lines.join("\n");
    lines.clear();
    blocks.push(MarkupNode::element("p", inline_nodes(&text)));
}

fn code_block(language: &str, body: &[&str]) -> MarkupNode {
    let attributes = if language.is_empty() {
        Vec::new()
    } else {
        vec![("class".to_string(), format!("language-{language}"))]
    };
    let code = MarkupNode::element_with_attributes("code", attributes, vec![MarkupNode::text(body.join("\n"))]);
    MarkupNode::element("pre", vec![code])
}

/// Split paragraph text on backtick pairs into text and inline `code` nodes
fn inline_nodes(text: &str) -> Vec<MarkupNode> {
    let mut nodes = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('`') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('`') else {
            break;
        };
        if open > 0 {
            nodes.push(MarkupNode::text(&rest[..open]));
        }
        nodes.push(MarkupNode::element("code", vec![MarkupNode::text(&after_open[..close])]));
        rest = &after_open[close + 1..];
    }

    if !rest.is_empty() {
        nodes.push(MarkupNode::text(rest));
    }
    nodes
}
