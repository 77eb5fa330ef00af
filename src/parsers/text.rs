use scraper::{ElementRef, Html};

/// Elements whose content is never rendered as text
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "iframe"];

/// Flattens a markup fragment (or plain text) into one trimmed line.
///
/// Script, style, noscript and iframe content is dropped, entities are
/// decoded and every whitespace run becomes a single space. Missing or
/// broken input degrades to whatever text can be recovered, never an error.
pub fn clean_text(fragment: Option<&str>) -> String {
    let fragment = match fragment {
        Some(f) if !f.trim().is_empty() => f,
        _ => return String::new(),
    };

    // Plain text still goes through the parser when it carries entities
    if !fragment.contains('<') && !fragment.contains('&') {
        return collapse_whitespace(fragment);
    }

    let doc = Html::parse_fragment(fragment);
    element_text(doc.root_element())
}

/// Rendered text of an element with skipped elements removed, whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// Collapse every whitespace run to a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
