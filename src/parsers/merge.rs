use crate::results::{RawRecipeFields, Rating};
use std::collections::BTreeMap;

/// Values that can be missing even when present: blank strings, empty lists
trait Absent {
    fn is_absent(&self) -> bool;
}

impl Absent for String {
    fn is_absent(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Absent for Vec<String> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl Absent for BTreeMap<String, String> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl Absent for Rating {
    fn is_absent(&self) -> bool {
        self.rating_value.is_none() && self.rating_count.is_none()
    }
}

fn pick<T: Absent>(primary: Option<T>, fallback: Option<T>) -> Option<T> {
    match primary {
        Some(value) if !value.is_absent() => Some(value),
        _ => fallback.filter(|v| !v.is_absent()),
    }
}

/// Field-level union of two extraction results.
///
/// Each field keeps the primary (structured data) value unless it is
/// absent, in which case the fallback (visible markup) value is used.
pub fn merge(primary: RawRecipeFields, fallback: RawRecipeFields) -> RawRecipeFields {
    RawRecipeFields {
        name: pick(primary.name, fallback.name),
        description: pick(primary.description, fallback.description),
        image: pick(primary.image, fallback.image),
        prep_time: pick(primary.prep_time, fallback.prep_time),
        cook_time: pick(primary.cook_time, fallback.cook_time),
        total_time: pick(primary.total_time, fallback.total_time),
        servings: pick(primary.servings, fallback.servings),
        ingredients: pick(primary.ingredients, fallback.ingredients),
        instructions: pick(primary.instructions, fallback.instructions),
        rating: pick(primary.rating, fallback.rating),
        author: pick(primary.author, fallback.author),
        category: pick(primary.category, fallback.category),
        cuisine: pick(primary.cuisine, fallback.cuisine),
        keywords: pick(primary.keywords, fallback.keywords),
        nutrition: pick(primary.nutrition, fallback.nutrition),
    }
}
