use serde::de::DeserializeOwned;

use crate::content::{CatalogQuery, ContentClient, ContentError, Perspective};
use crate::models::{Category, Locale, Post, SlugEntry};

/// Runs a query and decodes its result; a `null` result decodes to `T::default()`.
async fn fetch_as<T>(
    client: &ContentClient,
    query: CatalogQuery,
    perspective: Perspective,
) -> Result<T, ContentError>
where
    T: DeserializeOwned + Default,
{
    let value = client.fetch(&query, perspective).await?;
    let decoded: Option<T> = serde_json::from_value(value)?;
    Ok(decoded.unwrap_or_default())
}

/// `page` is zero-based.
pub async fn fetch_posts_by_locale(
    client: &ContentClient,
    locale: Locale,
    page: u32,
    perspective: Perspective,
) -> Result<Vec<Post>, ContentError> {
    fetch_as(client, CatalogQuery::PostsByLocale { locale, page }, perspective).await
}

pub async fn fetch_post_by_slug(
    client: &ContentClient,
    slug: &str,
    locale: Locale,
    perspective: Perspective,
) -> Result<Option<Post>, ContentError> {
    let query = CatalogQuery::PostBySlug {
        slug: slug.to_string(),
        locale,
    };
    fetch_as(client, query, perspective).await
}

/// Every `(slug, locale)` pair with a defined, non-empty slug, once each, sorted.
pub async fn fetch_all_post_slugs(client: &ContentClient) -> Result<Vec<SlugEntry>, ContentError> {
    let mut entries: Vec<SlugEntry> =
        fetch_as(client, CatalogQuery::AllPostSlugs, Perspective::Published).await?;
    entries.retain(|e| !e.slug.trim().is_empty());
    entries.sort();
    entries.dedup();
    Ok(entries)
}

/// Posts sharing at least one category with `post`. Skips the round trip when it has none.
pub async fn fetch_related_posts(
    client: &ContentClient,
    post: &Post,
    locale: Locale,
    perspective: Perspective,
) -> Result<Vec<Post>, ContentError> {
    let category_ids = post.category_ids();
    let Some(slug) = post.slug() else {
        return Ok(Vec::new());
    };
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = CatalogQuery::RelatedPosts {
        locale,
        slug: slug.to_string(),
        category_ids,
    };
    fetch_as(client, query, perspective).await
}

pub async fn fetch_featured_posts(
    client: &ContentClient,
    locale: Locale,
    perspective: Perspective,
) -> Result<Vec<Post>, ContentError> {
    fetch_as(client, CatalogQuery::FeaturedPosts { locale }, perspective).await
}

pub async fn fetch_posts_by_category(
    client: &ContentClient,
    locale: Locale,
    category_slug: &str,
    perspective: Perspective,
) -> Result<Vec<Post>, ContentError> {
    let query = CatalogQuery::PostsByCategory {
        locale,
        category_slug: category_slug.to_string(),
    };
    fetch_as(client, query, perspective).await
}

pub async fn fetch_all_categories(
    client: &ContentClient,
    perspective: Perspective,
) -> Result<Vec<Category>, ContentError> {
    fetch_as(client, CatalogQuery::AllCategories, perspective).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FixtureDataset;
    use serde_json::json;

    fn client() -> ContentClient {
        ContentClient::from_fixture(FixtureDataset::from_documents(vec![
            json!({"_id": "c1", "_type": "category", "title": {"en": "Guides"}, "slug": {"current": "guides"}}),
            json!({"_id": "a", "_type": "post", "slug": {"current": "same"}, "locale": "vi", "categories": [{"_ref": "c1"}]}),
            json!({"_id": "b", "_type": "post", "slug": {"current": "same"}, "locale": "en"}),
            json!({"_id": "c", "_type": "post", "slug": {"current": ""}, "locale": "en"}),
            json!({"_id": "d", "_type": "post", "locale": "en"}),
            json!({"_id": "e", "_type": "post", "slug": {"current": "other"}, "locale": "vi", "categories": [{"_ref": "c1"}]}),
        ]))
    }

    #[actix_web::test]
    async fn slug_listing_skips_blank_and_missing_slugs() {
        let slugs = fetch_all_post_slugs(&client()).await.unwrap();
        let pairs: Vec<(&str, &str)> = slugs
            .iter()
            .map(|e| (e.slug.as_str(), e.locale.as_str()))
            .collect();
        assert_eq!(pairs, vec![("other", "vi"), ("same", "en"), ("same", "vi")]);
    }

    #[actix_web::test]
    async fn missing_post_is_none() {
        let post = fetch_post_by_slug(&client(), "nope", Locale::Vi, Perspective::Published)
            .await
            .unwrap();
        assert!(post.is_none());
    }

    #[actix_web::test]
    async fn related_posts_need_categories() {
        let client = client();
        let with_category = fetch_post_by_slug(&client, "same", Locale::Vi, Perspective::Published)
            .await
            .unwrap()
            .unwrap();
        let related = fetch_related_posts(&client, &with_category, Locale::Vi, Perspective::Published)
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, "e");

        let without = fetch_post_by_slug(&client, "same", Locale::En, Perspective::Published)
            .await
            .unwrap()
            .unwrap();
        let related = fetch_related_posts(&client, &without, Locale::En, Perspective::Published)
            .await
            .unwrap();
        assert!(related.is_empty());
    }

    #[actix_web::test]
    async fn categories_decode_with_counts() {
        let categories = fetch_all_categories(&client(), Perspective::Published)
            .await
            .unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].post_count, Some(2));
    }
}
