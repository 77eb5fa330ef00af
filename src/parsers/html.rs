use crate::parsers::text::{collapse_whitespace, element_text};
use crate::selectors::{Strategy, TableStrategy};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Compile a CSS selector; invalid selectors are logged and skipped
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            ::log::warn!("Skipping invalid selector {:?}: {}", css, e);
            None
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    let text = collapse_whitespace(&text);
    if text.is_empty() { None } else { Some(text) }
}

/// Evaluate one strategy against the document
pub fn evaluate(doc: &Html, strategy: &Strategy) -> Option<String> {
    match strategy {
        Strategy::Text { selector: css } => {
            let sel = selector(css)?;
            doc.select(&sel).next().and_then(|e| non_blank(element_text(e)))
        }
        Strategy::Attr {
            selector: css,
            attr,
        } => {
            let sel = selector(css)?;
            doc.select(&sel)
                .next()
                .and_then(|e| e.value().attr(attr))
                .and_then(|v| non_blank(v.to_string()))
        }
        Strategy::Labeled {
            item,
            label,
            value,
            contains,
        } => {
            let item_sel = selector(item)?;
            let label_sel = selector(label)?;
            let value_sel = match value {
                Some(css) => Some(selector(css)?),
                None => None,
            };
            let needle = contains.to_lowercase();

            doc.select(&item_sel).find_map(|item| {
                let label_text = item.select(&label_sel).next().map(element_text)?;
                if !label_text.to_lowercase().contains(&needle) {
                    return None;
                }
                match &value_sel {
                    Some(sel) => item.select(sel).next().and_then(|v| non_blank(element_text(v))),
                    None => non_blank(element_text(item).replacen(&label_text, "", 1)),
                }
            })
        }
    }
}

/// First strategy in the chain that yields non-blank text
pub fn first_match(doc: &Html, chain: &[Strategy]) -> Option<String> {
    chain.iter().find_map(|strategy| evaluate(doc, strategy))
}

/// Non-blank texts of every element matching `css`, in document order
pub fn all_texts(scope: ElementRef<'_>, css: &str, min_len: usize) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .map(element_text)
        .filter(|t| !t.is_empty() && t.chars().count() >= min_len)
        .collect()
}

/// Texts from the first selector in the list that yields any
pub fn first_list(doc: &Html, selectors: &[String], min_len: usize) -> Option<Vec<String>> {
    selectors
        .iter()
        .map(|css| all_texts(doc.root_element(), css, min_len))
        .find(|texts| !texts.is_empty())
}

/// Label to value mapping read from a table layout
pub fn table_map(doc: &Html, table: &TableStrategy) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let (Some(row_sel), Some(label_sel), Some(value_sel)) = (
        selector(&table.row),
        selector(&table.label),
        selector(&table.value),
    ) else {
        return map;
    };

    for row in doc.select(&row_sel) {
        let label = row.select(&label_sel).next().map(element_text);
        let value = row.select(&value_sel).next().map(element_text);
        if let (Some(label), Some(value)) = (label, value) {
            if !label.is_empty() && !value.is_empty() {
                map.entry(label).or_insert(value);
            }
        }
    }
    map
}
