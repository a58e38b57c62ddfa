//! HTML text extraction over a parsed DOM.
//!
//! Article pages keep their prose in `<p>` elements; we collect those and
//! ignore everything else (navigation, scripts, footers). Broken markup
//! degrades to "fewer paragraphs", never to a panic.

use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Elements whose text is never prose, even inside a paragraph.
const SKIPPED: [&str; 4] = ["script", "style", "noscript", "template"];

fn paragraph_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("p").expect("static selector"))
}

fn title_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("title").expect("static selector"))
}

/// Text of every non-empty `<p>` element, one paragraph per line.
pub fn extract_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(paragraph_selector())
        .map(visible_text)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the document `<title>`, if any.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = document.select(title_selector()).next()?;
    let title = normalize_text(&title.text().collect::<String>());
    (!title.is_empty()).then_some(title)
}

/// Decoded text under `el`, minus anything inside a skipped element.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != el.id())
            .filter_map(|a| a.value().as_element())
            .any(|e| SKIPPED.contains(&e.name()));
        if !hidden {
            out.push_str(text);
        }
    }
    normalize_text(&out)
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
