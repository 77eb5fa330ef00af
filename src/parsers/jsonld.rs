//! Recipe extraction from embedded JSON-LD blocks.

use crate::parsers::rating::normalize_rating_value;
use crate::parsers::text::clean_text;
use crate::results::RawRecipeFields;
use crate::utils::to_absolute;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys whose values are searched for further nodes
const NESTING_KEYS: [&str; 4] = ["@graph", "graph", "mainEntity", "mainEntityOfPage"];

/// A person, category or keyword as it appears in the wild
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamedValue {
    Text(String),
    List(Vec<NamedValue>),
    Named { name: String },
    Other(IgnoredAny),
}

impl NamedValue {
    fn collect(&self, split_commas: bool, out: &mut Vec<String>) {
        match self {
            NamedValue::Text(text) if split_commas => {
                out.extend(text.split(',').map(|part| clean_text(Some(part))));
            }
            NamedValue::Text(text) | NamedValue::Named { name: text } => {
                out.push(clean_text(Some(text)))
            }
            NamedValue::List(items) => items.iter().for_each(|i| i.collect(split_commas, out)),
            NamedValue::Other(_) => {}
        }
    }
}

/// Deduplicate and comma-join a string, named object or list of either
fn join_named(value: Option<&Value>, split_commas: bool) -> Option<String> {
    let parsed = NamedValue::deserialize(value?).ok()?;
    let mut names = Vec::new();
    parsed.collect(split_commas, &mut names);

    let mut unique: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    if unique.is_empty() {
        None
    } else {
        Some(unique.join(", "))
    }
}

/// One node of a `recipeInstructions` tree
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionNode {
    Step(String),
    Sequence(Vec<InstructionNode>),
    Section {
        #[serde(rename = "itemListElement")]
        item_list_element: Vec<InstructionNode>,
    },
    Item(Map<String, Value>),
    Other(IgnoredAny),
}

impl InstructionNode {
    fn flatten(&self, out: &mut Vec<String>) {
        match self {
            InstructionNode::Step(text) => push_clean(out, Some(text)),
            InstructionNode::Sequence(items) | InstructionNode::Section {
                item_list_element: items,
            } => items.iter().for_each(|i| i.flatten(out)),
            InstructionNode::Item(map) => {
                let text = ["text", "name", "description"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str));
                push_clean(out, text);
            }
            InstructionNode::Other(_) => {}
        }
    }
}

fn push_clean(out: &mut Vec<String>, text: Option<&str>) {
    let cleaned = clean_text(text);
    if !cleaned.is_empty() {
        out.push(cleaned);
    }
}

/// Image given as a URL, an ImageObject or a list of either
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageValue {
    Url(String),
    List(Vec<ImageValue>),
    Object { url: String },
    Other(IgnoredAny),
}

impl ImageValue {
    fn first_url(&self) -> Option<&str> {
        match self {
            ImageValue::Url(url) | ImageValue::Object { url } => {
                Some(url.as_str()).filter(|u| !u.trim().is_empty())
            }
            ImageValue::List(items) => items.iter().find_map(ImageValue::first_url),
            ImageValue::Other(_) => None,
        }
    }
}

/// Parse every JSON-LD block on the page and map the chosen Recipe node.
///
/// Blocks that fail to parse are skipped. Returns `None` when no node typed
/// `Recipe` exists anywhere on the page.
pub fn extract(doc: &Html, page_url: &str) -> Option<RawRecipeFields> {
    let script_sel = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

    let blocks: Vec<Value> = doc
        .select(&script_sel)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    ::log::debug!("Discarding malformed JSON-LD block on {}: {}", page_url, e);
                    None
                }
            }
        })
        .collect();

    let mut nodes = Vec::new();
    for block in &blocks {
        collect_nodes(block, &mut nodes);
    }

    let recipe = select_recipe(&nodes)?;
    Some(map_recipe(recipe, page_url))
}

/// Flatten a parsed block into candidate nodes, in document order
fn collect_nodes<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_nodes(item, out)),
        Value::Object(map) => {
            out.push(map);
            for key in NESTING_KEYS {
                if let Some(nested) = map.get(key) {
                    collect_nodes(nested, out);
                }
            }
        }
        _ => {}
    }
}

fn is_recipe(node: &Map<String, Value>) -> bool {
    let node_type = node.get("@type").or_else(|| node.get("type"));
    match node_type {
        Some(Value::String(t)) => t == "Recipe",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

/// First Recipe with a non-empty name, otherwise the first Recipe
fn select_recipe<'a>(nodes: &[&'a Map<String, Value>]) -> Option<&'a Map<String, Value>> {
    let recipes: Vec<&Map<String, Value>> =
        nodes.iter().copied().filter(|n| is_recipe(n)).collect();

    recipes
        .iter()
        .copied()
        .find(|n| string_field(n, "name").is_some())
        .or_else(|| recipes.first().copied())
}

fn string_field(node: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match node.get(key)? {
        Value::String(s) => clean_text(Some(s)),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<&Value> = match value? {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    let cleaned: Vec<String> = items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(clean_text(Some(s))),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

fn recipe_yield(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(clean_text(Some(s))).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|v| recipe_yield(Some(v))),
        _ => None,
    }
}

fn nutrition(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let map = value?.as_object()?;
    let facts: BTreeMap<String, String> = map
        .iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, v)| {
            let text = match v {
                Value::String(s) => clean_text(Some(s)),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then(|| (key.clone(), text))
        })
        .collect();
    if facts.is_empty() { None } else { Some(facts) }
}

fn map_recipe(node: &Map<String, Value>, page_url: &str) -> RawRecipeFields {
    let image = node
        .get("image")
        .and_then(|v| ImageValue::deserialize(v).ok())
        .and_then(|img| img.first_url().and_then(|u| to_absolute(u, page_url)));

    let instructions = node
        .get("recipeInstructions")
        .and_then(|v| InstructionNode::deserialize(v).ok())
        .map(|tree| {
            let mut steps = Vec::new();
            tree.flatten(&mut steps);
            steps
        })
        .filter(|steps| !steps.is_empty());

    RawRecipeFields {
        name: string_field(node, "name"),
        description: string_field(node, "description"),
        image,
        prep_time: string_field(node, "prepTime"),
        cook_time: string_field(node, "cookTime"),
        total_time: string_field(node, "totalTime"),
        servings: recipe_yield(node.get("recipeYield").or_else(|| node.get("yield"))),
        ingredients: string_list(
            node.get("recipeIngredient")
                .or_else(|| node.get("ingredients")),
        ),
        instructions,
        rating: node.get("aggregateRating").and_then(normalize_rating_value),
        author: join_named(node.get("author"), false),
        category: join_named(node.get("recipeCategory"), false),
        cuisine: join_named(node.get("recipeCuisine"), false),
        keywords: join_named(node.get("keywords"), true),
        nutrition: nutrition(node.get("nutrition")),
    }
}
