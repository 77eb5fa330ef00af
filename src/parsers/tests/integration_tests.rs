use crate::parsers::extract_recipe;
use crate::selectors::RecipeSelectors;
use scraper::Html;

const PAGE_URL: &str = "https://www.allrecipes.com/recipe/13125/soup/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_only_page() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Recipe","name":"Soup"}</script>
        </head><body></body></html>"#;
        let doc = Html::parse_document(html);
        let fields = extract_recipe(&doc, PAGE_URL, &RecipeSelectors::default());

        assert_eq!(fields.name.as_deref(), Some("Soup"));
        assert_eq!(fields.nutrition, None);
        assert_eq!(fields.ingredients, None);
        assert_eq!(fields.instructions, None);
        assert_eq!(fields.category, None);
        assert_eq!(fields.keywords, None);
        assert_eq!(fields.image, None);
        assert_eq!(fields.rating, None);
    }

    #[test]
    fn test_structured_ingredients_with_markup_nutrition() {
        let html = r#"<html><head>
            <script type="application/ld+json">{
                "@type": "Recipe",
                "name": "Minestrone",
                "recipeIngredient": ["1 can beans", "2 carrots"]
            }</script>
        </head><body>
            <h1>Minestrone (page title)</h1>
            <ul class="ingredients"><li>something else</li></ul>
            <table class="nutrition">
                <tr><th>Calories</th><td>210</td></tr>
                <tr><th>Protein</th><td>9g</td></tr>
            </table>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let fields = extract_recipe(&doc, PAGE_URL, &RecipeSelectors::default());

        assert_eq!(fields.name.as_deref(), Some("Minestrone"));
        assert_eq!(
            fields.ingredients,
            Some(vec!["1 can beans".to_string(), "2 carrots".to_string()])
        );
        let nutrition = fields.nutrition.unwrap();
        assert_eq!(nutrition.get("Calories").map(String::as_str), Some("210"));
        assert_eq!(nutrition.get("Protein").map(String::as_str), Some("9g"));
    }

    #[test]
    fn test_page_without_any_recipe_data() {
        let doc = Html::parse_document("<html><body><p>Hello</p></body></html>");
        let fields = extract_recipe(&doc, PAGE_URL, &RecipeSelectors::default());
        assert!(fields.lacks_recipe_content());
    }
}
