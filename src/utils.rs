use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Site root used for search seeds and as the default base for relative links
pub const SITE_ROOT: &str = "https://www.allrecipes.com";

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static pattern"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static pattern"));

/// Resolve `href` against `base`. Malformed input yields `None`, never an error.
pub fn to_absolute(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Build the search listing URL for a query
pub fn build_search_url(query: &str) -> String {
    let mut url = Url::parse(SITE_ROOT).expect("static site root");
    url.set_path("/search");
    let query = query.trim();
    if !query.is_empty() {
        url.query_pairs_mut().append_pair("q", query);
    }
    url.to_string()
}

/// Parse the first decimal number in a string such as `"4.5 stars"`
pub fn parse_decimal(text: &str) -> Option<f64> {
    DECIMAL.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Parse a count such as `"1,234 Ratings"`
pub fn parse_count(text: &str) -> Option<u64> {
    let stripped = text.replace(',', "");
    INTEGER.find(&stripped).and_then(|m| m.as_str().parse().ok())
}
