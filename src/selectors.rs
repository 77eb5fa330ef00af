//! Selector fallback chains for the target site's markup.
//!
//! Every field lists its alternatives in priority order and the first one
//! that yields non-blank text wins. The order matters: the site serves
//! several page templates and the earlier entries match the current one.
//! All chains deserialize from the run configuration, so a markup change
//! can be handled without a rebuild.

use serde::{Deserialize, Serialize};

/// One way of reading a single text value from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Normalized text of the first element matching `selector`
    Text { selector: String },

    /// Attribute of the first element matching `selector`
    Attr { selector: String, attr: String },

    /// First `item` whose `label` text contains `contains`, read through `value`
    Labeled {
        item: String,
        label: String,
        #[serde(default)]
        value: Option<String>,
        contains: String,
    },
}

impl Strategy {
    pub fn text(selector: &str) -> Self {
        Self::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    pub fn labeled(item: &str, label: &str, value: Option<&str>, contains: &str) -> Self {
        Self::Labeled {
            item: item.to_string(),
            label: label.to_string(),
            value: value.map(str::to_string),
            contains: contains.to_string(),
        }
    }
}

/// A nutrition table layout: one row per nutrient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStrategy {
    pub row: String,
    pub label: String,
    pub value: String,
}

/// Chains used by the heuristic recipe extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeSelectors {
    pub name: Vec<Strategy>,
    pub description: Vec<Strategy>,
    pub image: Vec<Strategy>,
    pub prep_time: Vec<Strategy>,
    pub cook_time: Vec<Strategy>,
    pub total_time: Vec<Strategy>,
    pub servings: Vec<Strategy>,
    pub rating_value: Vec<Strategy>,
    pub rating_count: Vec<Strategy>,
    pub author: Vec<Strategy>,
    pub nutrition_tables: Vec<TableStrategy>,
    pub calories: Vec<Strategy>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub instructions_fallback: Vec<String>,
    pub breadcrumbs: Vec<String>,
    pub keywords: Vec<String>,
}

const DETAILS_ITEM: &str = ".mntl-recipe-details__item";
const DETAILS_LABEL: &str = ".mntl-recipe-details__label";
const DETAILS_VALUE: &str = ".mntl-recipe-details__value";
const META_ITEM: &str = ".recipe-meta-item";
const META_LABEL: &str = ".recipe-meta-item-header";
const META_VALUE: &str = ".recipe-meta-item-body";

fn time_chain(contains: &str) -> Vec<Strategy> {
    vec![
        Strategy::labeled(DETAILS_ITEM, DETAILS_LABEL, Some(DETAILS_VALUE), contains),
        Strategy::labeled(META_ITEM, META_LABEL, Some(META_VALUE), contains),
    ]
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl Default for RecipeSelectors {
    fn default() -> Self {
        Self {
            name: vec![
                Strategy::text("h1.article-heading"),
                Strategy::text("h1.headline"),
                Strategy::text("h1"),
            ],
            description: vec![
                Strategy::text("p.article-subheading"),
                Strategy::text(".recipe-summary"),
                Strategy::text("p.description"),
            ],
            image: vec![
                Strategy::attr("img.primary-image", "src"),
                Strategy::attr(".primary-image__image", "src"),
                Strategy::attr(".recipe-image img", "src"),
                Strategy::attr("img[src*=\"recipe\"]", "src"),
                Strategy::attr("meta[property=\"og:image\"]", "content"),
            ],
            prep_time: time_chain("Prep"),
            cook_time: time_chain("Cook"),
            total_time: time_chain("Total"),
            servings: {
                let mut chain = time_chain("Servings");
                chain.push(Strategy::text("#recipe-serving"));
                chain.push(Strategy::text("[data-unit=\"serving\"]"));
                chain
            },
            rating_value: vec![
                Strategy::attr("meta[itemprop=\"ratingValue\"]", "content"),
                Strategy::attr("[data-rating]", "data-rating"),
                Strategy::text(".mntl-recipe-review-bar__rating"),
                Strategy::text(".rating-value"),
            ],
            rating_count: vec![
                Strategy::attr("meta[itemprop=\"reviewCount\"]", "content"),
                Strategy::attr("[data-review-count]", "data-review-count"),
                Strategy::text(".mntl-recipe-review-bar__rating-count"),
                Strategy::text(".review-count"),
            ],
            author: vec![
                Strategy::attr("meta[name=\"author\"]", "content"),
                Strategy::text(".mntl-attribution__item-name"),
                Strategy::text("[rel=\"author\"]"),
                Strategy::text(".author-name"),
            ],
            nutrition_tables: vec![
                TableStrategy {
                    row: ".mntl-nutrition-facts-summary__table-row".to_string(),
                    label: "td:nth-child(2)".to_string(),
                    value: "td:nth-child(1)".to_string(),
                },
                TableStrategy {
                    row: "table.nutrition tr".to_string(),
                    label: "th".to_string(),
                    value: "td".to_string(),
                },
            ],
            calories: vec![
                Strategy::attr("[itemprop=\"calories\"]", "content"),
                Strategy::text("[itemprop=\"calories\"]"),
                Strategy::text(".calorie-count"),
            ],
            ingredients: owned(&[
                "li.mntl-structured-ingredients__list-item",
                ".ingredients-item",
                "[data-ingredient]",
                "ul.ingredients li",
            ]),
            instructions: owned(&[
                "#recipe__steps li",
                ".recipe-directions li",
                "[data-instruction]",
                "ol.instructions li",
            ]),
            instructions_fallback: owned(&[".mntl-sc-block-html"]),
            breadcrumbs: owned(&[
                ".mntl-breadcrumbs__item",
                "nav[aria-label=\"breadcrumb\"] li",
                ".breadcrumbs li",
            ]),
            keywords: owned(&[".mntl-taxonomy-nodes__link", ".tag-list a", "a[rel=\"tag\"]"]),
        }
    }
}

/// Chains used by the link discoverer on listing pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Card and list containers whose anchors are swept for recipe links
    pub card_links: Vec<String>,

    /// Explicit `rel="next"` links
    pub next_rel: Vec<String>,

    /// Site-specific "next" pagination controls
    pub next_control: Vec<String>,

    /// Elements inspected for an accessible label or text containing "next"
    pub next_text_controls: Vec<String>,

    /// Query parameter carrying the listing page number
    pub page_param: String,

    /// Elements whose presence shows the listing spans more than one page
    pub pagination_markers: Vec<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card_links: owned(&[
                ".card--no-image a",
                ".mntl-card-list-items a",
                ".comp.mntl-card-list-items a",
                "article a",
            ]),
            next_rel: owned(&["link[rel=\"next\"]", "a[rel=\"next\"]"]),
            next_control: owned(&[
                ".pagination__next a",
                "a.pagination__next",
                ".mntl-pagination__next a",
            ]),
            next_text_controls: owned(&["a", "button"]),
            page_param: "page".to_string(),
            pagination_markers: owned(&[
                ".pagination",
                ".mntl-pagination",
                "nav[aria-label*=\"agination\"]",
            ]),
        }
    }
}

/// All selector chains for one site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub recipe: RecipeSelectors,
    pub listing: ListingSelectors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_json_shape() {
        let json = r#"[
            {"kind": "text", "selector": "h1"},
            {"kind": "attr", "selector": "img", "attr": "src"},
            {"kind": "labeled", "item": "li", "label": "b", "contains": "Prep"}
        ]"#;
        let chain: Vec<Strategy> = serde_json::from_str(json).unwrap();
        assert_eq!(chain[0], Strategy::text("h1"));
        assert_eq!(chain[1], Strategy::attr("img", "src"));
        assert_eq!(chain[2], Strategy::labeled("li", "b", None, "Prep"));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r#"{"recipe": {"name": [{"kind": "text", "selector": ".title"}]}}"#;
        let config: SelectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.recipe.name, vec![Strategy::text(".title")]);
        assert_eq!(config.recipe.ingredients, RecipeSelectors::default().ingredients);
        assert_eq!(config.listing, ListingSelectors::default());
    }
}
