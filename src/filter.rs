use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for recognising recipe detail pages by URL shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Regex patterns matched against the URL path; any match marks a detail page
    #[serde(default = "default_recipe_patterns")]
    pub recipe_patterns: Vec<String>,

    /// Regex patterns for URLs never treated as recipes (these take precedence)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Domains recipe links may point at (empty allows any domain)
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

fn default_recipe_patterns() -> Vec<String> {
    vec![r"/recipe/\d+".to_string()]
}

impl Default for UrlFilterConfig {
    fn default() -> Self {
        Self {
            recipe_patterns: default_recipe_patterns(),
            exclude_patterns: vec![
                // Media and assets occasionally carry a recipe id in their path
                r"\.(jpg|jpeg|png|gif|css|js|ico|svg|webp|pdf)$".to_string(),
            ],
            allowed_domains: Vec::new(),
        }
    }
}

/// URL filter deciding which URLs are recipe detail pages
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    recipe_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(UrlFilterConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let recipe_regexes = config
            .recipe_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            recipe_regexes,
            exclude_regexes,
        })
    }

    /// Whether the URL has the shape of a recipe detail page
    pub fn is_recipe_url(&self, url: &Url) -> bool {
        if !self.is_in_domain_scope(url) {
            return false;
        }

        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        let path = url.path();
        self.recipe_regexes.iter().any(|r| r.is_match(path))
    }

    /// String form of [`UrlFilter::is_recipe_url`]; unparseable input is never a recipe
    pub fn is_recipe_str(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| self.is_recipe_url(&u))
    }

    fn is_in_domain_scope(&self, url: &Url) -> bool {
        if self.config.allowed_domains.is_empty() {
            return true;
        }
        match url.domain() {
            Some(domain) => self
                .config
                .allowed_domains
                .iter()
                .any(|allowed| domain == allowed || domain.ends_with(&format!(".{allowed}"))),
            None => false,
        }
    }
}

/// Frontier identity of a URL: the URL with its fragment stripped
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// String form of [`normalize_url`]; unparseable input is returned trimmed
pub fn normalize_url_str(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(parsed) => normalize_url(&parsed).to_string(),
        Err(_) => url.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = UrlFilter::default();

        let recipe = Url::parse("https://www.allrecipes.com/recipe/26317/chicken-pot-pie/").unwrap();
        assert!(filter.is_recipe_url(&recipe));

        let search = Url::parse("https://www.allrecipes.com/search?q=chicken").unwrap();
        assert!(!filter.is_recipe_url(&search));

        // Gallery pages have a slug but no numeric id
        let gallery = Url::parse("https://www.allrecipes.com/recipe/chicken-ideas/").unwrap();
        assert!(!filter.is_recipe_url(&gallery));

        let image = Url::parse("https://www.allrecipes.com/recipe/123/photo.jpg").unwrap();
        assert!(!filter.is_recipe_url(&image));
    }

    #[test]
    fn test_pattern_matches_path_only() {
        let filter = UrlFilter::default();
        let query_only = Url::parse("https://www.allrecipes.com/search?next=/recipe/12").unwrap();
        assert!(!filter.is_recipe_url(&query_only));
    }

    #[test]
    fn test_domain_restriction() {
        let config = UrlFilterConfig {
            allowed_domains: vec!["allrecipes.com".to_string()],
            ..UrlFilterConfig::default()
        };
        let filter = UrlFilter::new(config).unwrap();

        assert!(filter.is_recipe_str("https://www.allrecipes.com/recipe/1/a/"));
        assert!(!filter.is_recipe_str("https://other.com/recipe/1/a/"));
        assert!(!filter.is_recipe_str("not a url"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let config = UrlFilterConfig {
            recipe_patterns: vec!["(".to_string()],
            ..UrlFilterConfig::default()
        };
        assert!(UrlFilter::new(config).is_err());
    }

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(
            normalize_url_str("https://www.allrecipes.com/recipe/1/a/#reviews"),
            "https://www.allrecipes.com/recipe/1/a/"
        );
        assert_eq!(normalize_url_str(" junk "), "junk");
    }
}
