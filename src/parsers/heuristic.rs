//! Recipe extraction from visible markup through selector fallback chains.

use crate::parsers::html::{first_list, first_match, table_map};
use crate::parsers::rating::normalize_rating;
use crate::results::{RawRecipeFields, Rating};
use crate::selectors::RecipeSelectors;
use crate::utils::to_absolute;
use scraper::Html;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Instruction steps shorter than this are layout noise
const MIN_STEP_CHARS: usize = 6;

/// Breadcrumb entries that never name a category
const GENERIC_CRUMBS: [&str; 2] = ["recipes", "home"];

/// Derive recipe fields from the visible page. Every field degrades to
/// `None` independently; nothing here fails.
pub fn extract(doc: &Html, page_url: &str, selectors: &RecipeSelectors) -> RawRecipeFields {
    let image = first_match(doc, &selectors.image).and_then(|src| to_absolute(&src, page_url));

    let instructions = first_list(doc, &selectors.instructions, MIN_STEP_CHARS).or_else(|| {
        ::log::debug!("No primary instruction steps on {}, trying block content", page_url);
        first_list(doc, &selectors.instructions_fallback, MIN_STEP_CHARS)
    });

    let (category, cuisine) = breadcrumb_fields(doc, selectors);

    RawRecipeFields {
        name: first_match(doc, &selectors.name),
        description: first_match(doc, &selectors.description),
        image,
        prep_time: first_match(doc, &selectors.prep_time),
        cook_time: first_match(doc, &selectors.cook_time),
        total_time: first_match(doc, &selectors.total_time),
        servings: first_match(doc, &selectors.servings),
        ingredients: first_list(doc, &selectors.ingredients, 1),
        instructions,
        rating: rating(doc, selectors),
        author: first_match(doc, &selectors.author),
        category,
        cuisine,
        keywords: keywords(doc, selectors),
        nutrition: nutrition(doc, selectors),
    }
}

fn rating(doc: &Html, selectors: &RecipeSelectors) -> Option<Rating> {
    let mut raw = Map::new();
    if let Some(value) = first_match(doc, &selectors.rating_value) {
        raw.insert("ratingValue".to_string(), Value::String(value));
    }
    if let Some(count) = first_match(doc, &selectors.rating_count) {
        raw.insert("ratingCount".to_string(), Value::String(count));
    }
    normalize_rating(&raw)
}

fn nutrition(doc: &Html, selectors: &RecipeSelectors) -> Option<BTreeMap<String, String>> {
    let table = selectors
        .nutrition_tables
        .iter()
        .map(|t| table_map(doc, t))
        .find(|map| !map.is_empty());
    if table.is_some() {
        return table;
    }

    first_match(doc, &selectors.calories).map(|calories| {
        let mut map = BTreeMap::new();
        map.insert("calories".to_string(), calories);
        map
    })
}

/// Category is the deepest specific breadcrumb; cuisine is the crumb
/// following one that mentions "Cuisine".
fn breadcrumb_fields(doc: &Html, selectors: &RecipeSelectors) -> (Option<String>, Option<String>) {
    let Some(crumbs) = first_list(doc, &selectors.breadcrumbs, 1) else {
        return (None, None);
    };

    let category = crumbs
        .iter()
        .rev()
        .find(|c| !GENERIC_CRUMBS.contains(&c.to_lowercase().as_str()))
        .cloned();

    let cuisine = crumbs
        .windows(2)
        .find(|pair| pair[0].to_lowercase().contains("cuisine"))
        .map(|pair| pair[1].clone());

    (category, cuisine)
}

fn keywords(doc: &Html, selectors: &RecipeSelectors) -> Option<String> {
    let tags = first_list(doc, &selectors.keywords, 1)?;
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    Some(unique.join(", "))
}
