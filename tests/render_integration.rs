// Rendering marker-annotated replies the way a client does while text streams in
// WHY: Partial sensitive spans must stay hidden at every point of the stream

use shroud::markup::html::PENDING_PLACEHOLDER;
use shroud::markup::{parse_document, render_html, MarkupTransformer};
use shroud::source::split_into_deltas;
use shroud::MarkerCodec;

#[path = "integration/fixtures/mod.rs"]
mod fixtures;
use fixtures::*;

fn render(text: &str) -> String {
    let transformer = MarkupTransformer::new().expect("Transformer creation should succeed");
    render_html(&transformer.transform(&parse_document(text)))
}

#[test]
fn test_final_reply_renders_closed_reveals() {
    let html = render(CONTACT_REDACTED);
    assert!(html.contains("<spoiler>Ann Lee</spoiler>"));
    assert!(html.contains("<spoiler>ann.lee@example.com</spoiler>"));
    assert!(html.contains("<spoiler>555-0142</spoiler>"));
    assert!(!html.contains("||"));
    assert!(!html.contains("pending"));
}

#[test]
fn test_partial_span_hidden_until_closed() {
    let cut = CONTACT_REDACTED.find("||ann.lee@").expect("Fixture holds the email") + "||ann.lee@".len();
    let html = render(&CONTACT_REDACTED[..cut]);

    assert!(html.contains(&format!(r#"<spoiler pending="">{PENDING_PLACEHOLDER}</spoiler>"#)));
    assert!(!html.contains("ann.lee@"), "Partial email must not reach the page");
    assert!(html.contains("<spoiler>Ann Lee</spoiler>"));
}

#[test]
fn test_every_streamed_prefix_hides_open_spans() {
    let mut live = String::new();
    for delta in split_into_deltas(CONTACT_REDACTED, 1) {
        live.push_str(&delta);
        let html = render(&live);
        let open_pairs = live.matches("||").count() % 2 == 1;
        let ends_with_opener = live.trim_end().ends_with("||");

        if open_pairs && !ends_with_opener {
            assert!(html.contains("pending"), "Open span should render pending: {live:?}");
        }
        for item in ["ann.lee@example.com", "555-0142"] {
            if html.contains(item) {
                assert!(html.contains(&format!("<spoiler>{item}</spoiler>")), "{item} leaked in {live:?}");
            }
        }
    }
}

#[test]
fn test_code_block_keeps_literal_markers() {
    let codec = MarkerCodec::new().expect("Codec creation should succeed");
    let marked = codec.apply_redactions(CODE_REPLY, ["ann.lee@example.com"]);
    let html = render(&marked);

    assert!(html.contains("<p>Set the contact address to <spoiler>ann.lee@example.com</spoiler> in your config.</p>"));
    assert!(html.contains(r#"<pre><code class="language-toml">owner = &quot;||ann.lee@example.com||&quot;</code></pre>"#));
    assert!(html.contains("<p>Then restart the service.</p>"));
}

#[test]
fn test_plain_reply_unchanged() {
    let html = render(PLAIN_REPLY);
    assert_eq!(html, format!("<div><p>{PLAIN_REPLY}</p></div>"));
}
