use crate::filter::UrlFilter;
use crate::parsers::links::{find_next_page, find_recipe_links, synthesize_next};
use crate::selectors::ListingSelectors;
use scraper::Html;

const SEARCH_URL: &str = "https://www.allrecipes.com/search?q=chicken";

const LISTING_PAGE: &str = r#"
<html><body>
  <a href="/recipe/100/first/">First</a>
  <a href="https://www.allrecipes.com/recipe/200/second/#reviews">Second</a>
  <a href="/recipe/100/first/">First again</a>
  <a href="/gallery/chicken-dinners/">Gallery</a>
  <a href="/recipe/roundup/">Roundup</a>
  <div class="mntl-card-list-items">
    <a href="/recipe/300/third/">Third</a>
    <a href="/recipe/200/second/">Second card</a>
  </div>
  <a href="http://[broken">Broken</a>
</body></html>"#;

#[cfg(test)]
mod recipe_link_tests {
    use super::*;

    #[test]
    fn test_links_are_absolute_deduplicated_and_ordered() {
        let doc = Html::parse_document(LISTING_PAGE);
        let links = find_recipe_links(
            &doc,
            SEARCH_URL,
            &UrlFilter::default(),
            &ListingSelectors::default(),
        );
        assert_eq!(
            links,
            vec![
                "https://www.allrecipes.com/recipe/100/first/",
                "https://www.allrecipes.com/recipe/200/second/",
                "https://www.allrecipes.com/recipe/300/third/",
            ]
        );
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let doc = Html::parse_document(LISTING_PAGE);
        let filter = UrlFilter::default();
        let selectors = ListingSelectors::default();

        let first = find_recipe_links(&doc, SEARCH_URL, &filter, &selectors);
        let second = find_recipe_links(&doc, SEARCH_URL, &filter, &selectors);
        assert_eq!(first, second);

        let again = Html::parse_document(LISTING_PAGE);
        assert_eq!(first, find_recipe_links(&again, SEARCH_URL, &filter, &selectors));
    }

    #[test]
    fn test_page_without_links() {
        let doc = Html::parse_document("<p>No results</p>");
        let links = find_recipe_links(
            &doc,
            SEARCH_URL,
            &UrlFilter::default(),
            &ListingSelectors::default(),
        );
        assert!(links.is_empty());
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    fn next(html: &str, page: u32, always_advance: bool) -> Option<String> {
        let doc = Html::parse_document(html);
        find_next_page(
            &doc,
            SEARCH_URL,
            page,
            &UrlFilter::default(),
            &ListingSelectors::default(),
            always_advance,
        )
    }

    #[test]
    fn test_recipe_titled_next_is_not_pagination() {
        let html = r#"<a href="/recipe/1/next-level-nachos/">Next-Level Nachos</a>"#;
        assert_eq!(
            next(html, 1, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=2")
        );
    }

    #[test]
    fn test_recipe_links_skipped_before_real_next_control() {
        let html = r#"
            <a aria-label="Next recipe" href="/recipe/5/soup/">Soup</a>
            <a href="/recipe/6/stew/?page=9">Stew</a>
            <a href="/search?q=chicken&page=2">Next page</a>"#;
        assert_eq!(
            next(html, 1, false).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=2")
        );
    }

    #[test]
    fn test_rel_next_wins() {
        let html = r#"
            <link rel="next" href="/search?q=chicken&page=7">
            <a class="pagination__next" href="/search?q=chicken&page=2">Next</a>"#;
        assert_eq!(
            next(html, 1, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=7")
        );
    }

    #[test]
    fn test_site_control_before_text_match() {
        let html = r#"
            <a href="/search?q=chicken&page=9">Next up: desserts</a>
            <li class="mntl-pagination__next"><a href="/search?q=chicken&page=2">&gt;</a></li>"#;
        assert_eq!(
            next(html, 1, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=2")
        );
    }

    #[test]
    fn test_accessible_label() {
        let html = r#"
            <a href="/search?q=chicken&page=1">1</a>
            <a aria-label="Go to NEXT page" href="/search?q=chicken&page=3">›</a>"#;
        assert_eq!(
            next(html, 2, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=3")
        );
    }

    #[test]
    fn test_higher_page_number_link() {
        let html = r#"
            <a href="/search?q=chicken&page=1">1</a>
            <a href="/search?q=chicken&page=2">2</a>
            <a href="/search?q=chicken&page=3">3</a>"#;
        assert_eq!(
            next(html, 2, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=3")
        );
    }

    #[test]
    fn test_always_advance_synthesizes() {
        assert_eq!(
            next("<p>results</p>", 1, true).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=2")
        );
    }

    #[test]
    fn test_conditional_advance_needs_pagination() {
        assert_eq!(next("<p>results</p>", 1, false), None);
        assert_eq!(
            next(r#"<nav class="pagination"><span>1</span></nav>"#, 4, false).as_deref(),
            Some("https://www.allrecipes.com/search?q=chicken&page=5")
        );
    }

    #[test]
    fn test_synthesize_replaces_existing_page() {
        assert_eq!(
            synthesize_next("https://www.allrecipes.com/search?page=3&q=soup#top", 3, "page")
                .as_deref(),
            Some("https://www.allrecipes.com/search?q=soup&page=4")
        );
        assert_eq!(synthesize_next("not a url", 1, "page"), None);
    }
}
