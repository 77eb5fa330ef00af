use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate rating as reported by a recipe page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    /// Average score
    pub rating_value: Option<f64>,

    /// Number of votes behind the score
    pub rating_count: Option<u64>,

    /// Number of written reviews (falls back to the vote count)
    pub review_count: Option<u64>,
}

/// Every attribute either extractor can produce.
///
/// `None` means the extractor found nothing; it is kept distinct from an
/// empty string or an empty list so the merger can tell the two apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecipeFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub rating: Option<Rating>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub keywords: Option<String>,
    pub nutrition: Option<BTreeMap<String, String>>,
}

impl RawRecipeFields {
    /// True when there is nothing worth emitting: no name, no ingredients
    /// and no instructions.
    pub fn lacks_recipe_content(&self) -> bool {
        is_blank(&self.name)
            && self.ingredients.as_ref().is_none_or(|v| v.is_empty())
            && self.instructions.as_ref().is_none_or(|v| v.is_empty())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// A merged recipe ready for the storage sink. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub rating: Option<Rating>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub keywords: Option<String>,
    pub nutrition: Option<BTreeMap<String, String>>,

    /// URL of the detail page this record came from
    pub source_url: String,

    /// When the record was emitted
    pub scraped_at: DateTime<Utc>,
}

impl RecipeRecord {
    /// Finalize merged fields into a record for `source_url`
    pub fn new(fields: RawRecipeFields, source_url: String, scraped_at: DateTime<Utc>) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            image: fields.image,
            prep_time: fields.prep_time,
            cook_time: fields.cook_time,
            total_time: fields.total_time,
            servings: fields.servings,
            ingredients: fields.ingredients.unwrap_or_default(),
            instructions: fields.instructions.unwrap_or_default(),
            rating: fields.rating,
            author: fields.author,
            category: fields.category,
            cuisine: fields.cuisine,
            keywords: fields.keywords,
            nutrition: fields.nutrition,
            source_url,
            scraped_at,
        }
    }
}
