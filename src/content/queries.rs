//! The fixed set of read queries the site issues against the content API.
//!
//! Every query that returns posts joins the referenced author and categories inline.

use serde_json::{json, Map, Value};

use crate::models::Locale;

/// Posts per page on the blog listing.
pub const POSTS_PAGE_SIZE: u32 = 20;
/// Cap on the "related posts" strip under an article.
pub const RELATED_POSTS_LIMIT: u32 = 3;
/// Cap on the featured posts shown on the experience page.
pub const FEATURED_POSTS_LIMIT: u32 = 6;

const POST_CARD_FIELDS: &str = r#"
    _id,
    title,
    slug,
    excerpt,
    coverImage,
    publishedAt,
    locale,
    author->{
      name,
      slug,
      image
    },
    categories[]->{
      _id,
      title,
      slug,
      color
    },
    "slug": slug.current"#;

const POST_DETAIL_FIELDS: &str = r#"
    _id,
    title,
    slug,
    excerpt,
    coverImage,
    "body": coalesce(body, content),
    publishedAt,
    locale,
    seo,
    author->{
      name,
      slug,
      image,
      bio
    },
    categories[]->{
      _id,
      title,
      slug,
      color
    },
    "slug": slug.current"#;

/// A logical operation plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// One page of a locale's posts, newest first. Pages are zero-based.
    PostsByLocale { locale: Locale, page: u32 },
    PostBySlug { slug: String, locale: Locale },
    /// Every `(slug, locale)` pair with a defined slug, for static path generation.
    AllPostSlugs,
    RelatedPosts {
        locale: Locale,
        slug: String,
        category_ids: Vec<String>,
    },
    FeaturedPosts { locale: Locale },
    PostsByCategory { locale: Locale, category_slug: String },
    /// Every category with the number of posts referencing it.
    AllCategories,
}

impl CatalogQuery {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            CatalogQuery::PostsByLocale { .. } => "posts_by_locale",
            CatalogQuery::PostBySlug { .. } => "post_by_slug",
            CatalogQuery::AllPostSlugs => "all_post_slugs",
            CatalogQuery::RelatedPosts { .. } => "related_posts",
            CatalogQuery::FeaturedPosts { .. } => "featured_posts",
            CatalogQuery::PostsByCategory { .. } => "posts_by_category",
            CatalogQuery::AllCategories => "all_categories",
        }
    }

    /// Half-open `[start, end)` slice of the ordered result, when the query is bounded.
    pub fn window(&self) -> Option<(u32, u32)> {
        match self {
            CatalogQuery::PostsByLocale { page, .. } => {
                let start = page.saturating_mul(POSTS_PAGE_SIZE);
                Some((start, start.saturating_add(POSTS_PAGE_SIZE)))
            }
            CatalogQuery::RelatedPosts { .. } => Some((0, RELATED_POSTS_LIMIT)),
            CatalogQuery::FeaturedPosts { .. } => Some((0, FEATURED_POSTS_LIMIT)),
            _ => None,
        }
    }

    /// GROQ text for this operation. Slice bounds are integers, so they are inlined.
    pub fn groq(&self) -> String {
        match self {
            CatalogQuery::PostsByLocale { .. } => {
                let (start, end) = self.window().unwrap_or((0, POSTS_PAGE_SIZE));
                format!(
                    "*[_type == \"post\" && locale == $locale] | order(publishedAt desc) {{{}\n}}[{}...{}]",
                    POST_CARD_FIELDS, start, end
                )
            }
            CatalogQuery::PostBySlug { .. } => format!(
                "*[_type == \"post\" && slug.current == $slug && locale == $locale][0] {{{}\n}}",
                POST_DETAIL_FIELDS
            ),
            CatalogQuery::AllPostSlugs => {
                "*[_type == \"post\" && defined(slug.current)] {\n    \"slug\": slug.current,\n    locale\n}"
                    .to_string()
            }
            CatalogQuery::RelatedPosts { .. } => format!(
                "*[_type == \"post\" && locale == $locale && slug.current != $slug && count(categories[@._ref in $categories]) > 0] | order(publishedAt desc) {{{}\n}}[0...{}]",
                POST_CARD_FIELDS, RELATED_POSTS_LIMIT
            ),
            CatalogQuery::FeaturedPosts { .. } => format!(
                "*[_type == \"post\" && locale == $locale] | order(publishedAt desc) {{{}\n}}[0...{}]",
                POST_CARD_FIELDS, FEATURED_POSTS_LIMIT
            ),
            CatalogQuery::PostsByCategory { .. } => format!(
                "*[_type == \"post\" && locale == $locale && $categorySlug in categories[]->slug.current] | order(publishedAt desc) {{{}\n}}",
                POST_CARD_FIELDS
            ),
            CatalogQuery::AllCategories => r#"*[_type == "category"] | order(title.en asc) {
    _id,
    title,
    slug,
    description,
    color,
    "slug": slug.current,
    "postCount": count(*[_type == "post" && references(^._id)])
}"#
            .to_string(),
        }
    }

    /// Named parameters, without the `$` prefix.
    pub fn params(&self) -> Map<String, Value> {
        let value = match self {
            CatalogQuery::PostsByLocale { locale, .. } | CatalogQuery::FeaturedPosts { locale } => {
                json!({ "locale": locale.as_str() })
            }
            CatalogQuery::PostBySlug { slug, locale } => {
                json!({ "slug": slug, "locale": locale.as_str() })
            }
            CatalogQuery::RelatedPosts {
                locale,
                slug,
                category_ids,
            } => json!({
                "locale": locale.as_str(),
                "slug": slug,
                "categories": category_ids,
            }),
            CatalogQuery::PostsByCategory {
                locale,
                category_slug,
            } => json!({ "locale": locale.as_str(), "categorySlug": category_slug }),
            CatalogQuery::AllPostSlugs | CatalogQuery::AllCategories => json!({}),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
