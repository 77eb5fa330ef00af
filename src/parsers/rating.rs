use crate::results::Rating;
use crate::utils::{parse_count, parse_decimal};
use serde_json::{Map, Value};

const SCORE_KEYS: [&str; 3] = ["ratingValue", "rating", "value"];
const COUNT_KEYS: [&str; 4] = ["ratingCount", "reviewCount", "ratingVotes", "count"];
const REVIEW_KEY: &str = "reviewCount";

/// Normalize an aggregate-rating object whatever aliases it uses.
///
/// Returns `None` when neither a score nor a count can be read.
pub fn normalize_rating(rating: &Map<String, Value>) -> Option<Rating> {
    let rating_value = SCORE_KEYS
        .iter()
        .find_map(|key| rating.get(*key).and_then(as_decimal));
    let rating_count = COUNT_KEYS
        .iter()
        .find_map(|key| rating.get(*key).and_then(as_count));

    if rating_value.is_none() && rating_count.is_none() {
        return None;
    }

    let review_count = rating.get(REVIEW_KEY).and_then(as_count).or(rating_count);

    Some(Rating {
        rating_value,
        rating_count,
        review_count,
    })
}

/// Normalize any JSON value that may hold a rating object
pub fn normalize_rating_value(value: &Value) -> Option<Rating> {
    match value {
        Value::Object(map) => normalize_rating(map),
        Value::Array(items) => items.iter().find_map(normalize_rating_value),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}
