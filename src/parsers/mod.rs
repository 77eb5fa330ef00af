pub mod heuristic;
pub mod html;
pub mod jsonld;
pub mod links;
pub mod merge;
pub mod rating;
pub mod text;

#[cfg(test)]
mod tests;

use crate::results::RawRecipeFields;
use crate::selectors::RecipeSelectors;
use scraper::Html;

/// Run both extractors over a detail page and merge the results, structured
/// data taking precedence field by field.
pub fn extract_recipe(doc: &Html, page_url: &str, selectors: &RecipeSelectors) -> RawRecipeFields {
    let structured = jsonld::extract(doc, page_url);
    if structured.is_none() {
        ::log::debug!("No JSON-LD recipe on {}, relying on page markup", page_url);
    }
    let visible = heuristic::extract(doc, page_url, selectors);

    merge::merge(structured.unwrap_or_default(), visible)
}
