//! Recipe link and pagination discovery on listing pages.

use crate::filter::{UrlFilter, normalize_url_str};
use crate::parsers::html::selector;
use crate::parsers::text::element_text;
use crate::selectors::ListingSelectors;
use crate::utils::to_absolute;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Absolute, fragment-free recipe links on the page, deduplicated, in
/// document order. All anchors are swept first, then the card containers.
pub fn find_recipe_links(
    doc: &Html,
    page_url: &str,
    filter: &UrlFilter,
    selectors: &ListingSelectors,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let sweeps = std::iter::once("a[href]").chain(selectors.card_links.iter().map(String::as_str));
    for css in sweeps {
        let Some(sel) = selector(css) else { continue };
        for anchor in doc.select(&sel) {
            let Some(link) = element_link(anchor, page_url) else {
                continue;
            };
            if filter.is_recipe_str(&link) && seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    ::log::debug!("Found {} recipe links on {}", links.len(), page_url);
    links
}

/// Absolute, normalized target of a link-like element
fn element_link(element: ElementRef<'_>, page_url: &str) -> Option<String> {
    let href = element
        .value()
        .attr("href")
        .or_else(|| element.value().attr("data-href"))?
        .trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    to_absolute(href, page_url).map(|abs| normalize_url_str(&abs))
}

/// Locate the next listing page.
///
/// Candidates are tried in priority order: a `rel="next"` link, the site's
/// own next control, any control labelled "next", any anchor whose page
/// parameter exceeds `page_number`, and finally the current URL with the
/// page parameter incremented. The last step only runs when
/// `always_advance` is set or the page shows pagination of its own.
/// Recipe links are never pagination candidates, whatever their text says.
pub fn find_next_page(
    doc: &Html,
    page_url: &str,
    page_number: u32,
    filter: &UrlFilter,
    selectors: &ListingSelectors,
    always_advance: bool,
) -> Option<String> {
    let current = normalize_url_str(page_url);
    let skip = |link: &str| link == current || filter.is_recipe_str(link);

    let candidate = first_link(doc, page_url, &selectors.next_rel, &skip, |_| true)
        .or_else(|| first_link(doc, page_url, &selectors.next_control, &skip, |_| true))
        .or_else(|| {
            first_link(doc, page_url, &selectors.next_text_controls, &skip, |el| {
                mentions_next(el)
            })
        })
        .or_else(|| higher_page_link(doc, page_url, page_number, &selectors.page_param, &skip));

    if candidate.is_some() {
        return candidate;
    }

    if always_advance || has_pagination(doc, selectors) {
        synthesize_next(page_url, page_number, &selectors.page_param)
    } else {
        ::log::debug!("No pagination found on {}", page_url);
        None
    }
}

fn first_link(
    doc: &Html,
    page_url: &str,
    selectors: &[String],
    skip: &impl Fn(&str) -> bool,
    accept: impl Fn(ElementRef<'_>) -> bool,
) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel)
            .filter(|el| accept(*el))
            .filter_map(|el| element_link(el, page_url))
            .find(|link| !skip(link.as_str()))
    })
}

fn mentions_next(element: ElementRef<'_>) -> bool {
    let label = element.value().attr("aria-label").unwrap_or_default();
    label.to_lowercase().contains("next") || element_text(element).to_lowercase().contains("next")
}

fn page_param_value(url: &str, param: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| value.trim().parse().ok())
}

fn higher_page_link(
    doc: &Html,
    page_url: &str,
    page_number: u32,
    param: &str,
    skip: &impl Fn(&str) -> bool,
) -> Option<String> {
    let sel = selector("a[href]")?;
    doc.select(&sel)
        .filter_map(|el| element_link(el, page_url))
        .filter(|link| !skip(link.as_str()))
        .find(|link| page_param_value(link, param).is_some_and(|n| n > page_number))
}

fn has_pagination(doc: &Html, selectors: &ListingSelectors) -> bool {
    let marked = selectors
        .pagination_markers
        .iter()
        .filter_map(|css| selector(css))
        .any(|sel| doc.select(&sel).next().is_some());
    if marked {
        return true;
    }
    selector("a[href]").is_some_and(|sel| {
        doc.select(&sel)
            .filter_map(|el| el.value().attr("href"))
            .any(|href| href.contains(&format!("{}=", selectors.page_param)))
    })
}

/// The current URL with the page parameter set to `page_number + 1`
pub fn synthesize_next(page_url: &str, page_number: u32, param: &str) -> Option<String> {
    let mut url = Url::parse(page_url).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &(page_number + 1).to_string());
    Some(url.to_string())
}
