use crate::crawlers::frontier::{CrawlTask, PageLabel};
use crate::filter::UrlFilter;
use crate::parsers::{extract_recipe, links};
use crate::results::RawRecipeFields;
use crate::selectors::SelectorConfig;
use scraper::Html;

/// What a fetched page turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// A listing page with its recipe links and next page
    Listing {
        recipe_links: Vec<String>,
        next_page: Option<String>,
    },
    /// A page queued as a recipe that holds no recipe; its links are still followed
    Reclassified { recipe_links: Vec<String> },
    /// A recipe ready to be emitted
    Recipe(RawRecipeFields),
}

/// Decides how each fetched page is handled and runs the matching extraction
pub struct PageClassifier {
    filter: UrlFilter,
    selectors: SelectorConfig,
    always_advance: bool,
}

impl PageClassifier {
    pub fn new(filter: UrlFilter, selectors: SelectorConfig, always_advance: bool) -> Self {
        Self {
            filter,
            selectors,
            always_advance,
        }
    }

    /// Parse a page body and classify it according to the task's label
    pub fn classify(&self, task: &CrawlTask, body: &str) -> PageOutcome {
        let doc = Html::parse_document(body);

        match task.label {
            PageLabel::List => PageOutcome::Listing {
                recipe_links: self.recipe_links(&doc, task),
                next_page: links::find_next_page(
                    &doc,
                    &task.url,
                    task.page_number,
                    &self.filter,
                    &self.selectors.listing,
                    self.always_advance,
                ),
            },
            PageLabel::Recipe => {
                if !self.filter.is_recipe_str(&task.url) {
                    ::log::info!("{} is not a recipe URL, treating it as a listing", task.url);
                    return self.reclassify(&doc, task);
                }

                let fields = extract_recipe(&doc, &task.url, &self.selectors.recipe);
                if fields.lacks_recipe_content() {
                    ::log::info!("No recipe content on {}, treating it as a listing", task.url);
                    return self.reclassify(&doc, task);
                }
                PageOutcome::Recipe(fields)
            }
        }
    }

    fn reclassify(&self, doc: &Html, task: &CrawlTask) -> PageOutcome {
        PageOutcome::Reclassified {
            recipe_links: self.recipe_links(doc, task),
        }
    }

    fn recipe_links(&self, doc: &Html, task: &CrawlTask) -> Vec<String> {
        links::find_recipe_links(doc, &task.url, &self.filter, &self.selectors.listing)
    }
}
