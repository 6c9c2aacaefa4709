//! Answers catalog queries from a local dataset export (one JSON document per line).
//!
//! Used for offline development and by the HTTP tests. It mirrors the filters, ordering,
//! slicing and reference joins of the GROQ text in [`super::queries`].

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use super::queries::CatalogQuery;
use super::{ContentError, Perspective};

const DRAFT_PREFIX: &str = "drafts.";

#[derive(Debug, Clone, Default)]
pub struct FixtureDataset {
    documents: Vec<Value>,
}

/// Documents visible under one perspective, indexed for reference lookups.
struct View {
    documents: Vec<Value>,
    by_id: HashMap<String, usize>,
}

impl View {
    fn deref(&self, reference: &Value) -> Option<&Value> {
        let id = reference.get("_ref")?.as_str()?;
        self.by_id.get(id).map(|&i| &self.documents[i])
    }

    fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.documents
            .iter()
            .filter(move |d| d.get("_type").and_then(Value::as_str) == Some(kind))
    }
}

fn str_field<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

fn slug_current(doc: &Value) -> Option<&str> {
    match doc.get("slug") {
        Some(Value::Object(obj)) => obj.get("current").and_then(Value::as_str),
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn field_or_null(doc: &Value, field: &str) -> Value {
    doc.get(field).cloned().unwrap_or(Value::Null)
}

fn published_at(doc: &Value) -> Option<DateTime<FixedOffset>> {
    str_field(doc, "publishedAt").and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// Newest first; posts without a date go last.
fn newest_first(a: &&Value, b: &&Value) -> Ordering {
    match (published_at(a), published_at(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// True when any nested `_ref` in `doc` points at `id`.
fn references(doc: &Value, id: &str) -> bool {
    match doc {
        Value::Object(obj) => {
            obj.get("_ref").and_then(Value::as_str) == Some(id)
                || obj.values().any(|v| references(v, id))
        }
        Value::Array(items) => items.iter().any(|v| references(v, id)),
        _ => false,
    }
}

fn select(doc: &Value, fields: &[&str]) -> Value {
    let mut out = Map::new();
    for field in fields {
        out.insert(field.to_string(), field_or_null(doc, field));
    }
    Value::Object(out)
}

impl FixtureDataset {
    pub fn from_documents(documents: Vec<Value>) -> Self {
        Self { documents }
    }

    pub fn parse_ndjson(input: &str) -> Result<Self, ContentError> {
        let mut documents = Vec::new();
        for (index, line) in input.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc = serde_json::from_str(line).map_err(|source| ContentError::Fixture {
                line: index + 1,
                source,
            })?;
            documents.push(doc);
        }
        Ok(Self { documents })
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let input = std::fs::read_to_string(path)?;
        let dataset = Self::parse_ndjson(&input)?;
        log::info!(
            "Loaded {} content documents from fixture '{}'",
            dataset.documents.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn view(&self, perspective: Perspective) -> View {
        let mut documents: Vec<Value> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for doc in &self.documents {
            let Some(id) = str_field(doc, "_id") else {
                continue;
            };
            let (base_id, is_draft) = match id.strip_prefix(DRAFT_PREFIX) {
                Some(base) => (base.to_string(), true),
                None => (id.to_string(), false),
            };

            match perspective {
                Perspective::Published if is_draft => continue,
                Perspective::Published => {
                    by_id.insert(base_id, documents.len());
                    documents.push(doc.clone());
                }
                Perspective::Drafts => {
                    let mut visible = doc.clone();
                    if let Value::Object(obj) = &mut visible {
                        obj.insert("_id".into(), Value::String(base_id.clone()));
                    }
                    match by_id.get(&base_id).copied() {
                        // A draft replaces its published version; a published doc never replaces a draft.
                        Some(i) if is_draft => documents[i] = visible,
                        Some(_) => {}
                        None => {
                            by_id.insert(base_id, documents.len());
                            documents.push(visible);
                        }
                    }
                }
            }
        }

        View { documents, by_id }
    }

    fn project_author(view: &View, post: &Value, with_bio: bool) -> Value {
        let Some(author) = post.get("author").and_then(|r| view.deref(r)) else {
            return Value::Null;
        };
        let mut fields = vec!["name", "slug", "image"];
        if with_bio {
            fields.push("bio");
        }
        select(author, &fields)
    }

    fn project_categories(view: &View, post: &Value) -> Value {
        match post.get("categories") {
            Some(Value::Array(refs)) => Value::Array(
                refs.iter()
                    .map(|r| match view.deref(r) {
                        Some(category) => select(category, &["_id", "title", "slug", "color"]),
                        None => Value::Null,
                    })
                    .collect(),
            ),
            _ => Value::Null,
        }
    }

    fn project_card(view: &View, post: &Value) -> Value {
        let mut out = select(
            post,
            &["_id", "title", "excerpt", "coverImage", "publishedAt", "locale"],
        );
        if let Value::Object(obj) = &mut out {
            obj.insert(
                "slug".into(),
                slug_current(post).map(|s| json!(s)).unwrap_or(Value::Null),
            );
            obj.insert("author".into(), Self::project_author(view, post, false));
            obj.insert("categories".into(), Self::project_categories(view, post));
        }
        out
    }

    fn project_detail(view: &View, post: &Value) -> Value {
        let mut out = Self::project_card(view, post);
        if let Value::Object(obj) = &mut out {
            let body = match post.get("body") {
                Some(Value::Null) | None => field_or_null(post, "content"),
                Some(body) => body.clone(),
            };
            obj.insert("body".into(), body);
            obj.insert("seo".into(), field_or_null(post, "seo"));
            obj.insert("author".into(), Self::project_author(view, post, true));
        }
        out
    }

    fn window<'a>(query: &CatalogQuery, mut posts: Vec<&'a Value>) -> Vec<&'a Value> {
        posts.sort_by(newest_first);
        match query.window() {
            Some((start, end)) => posts
                .into_iter()
                .skip(start as usize)
                .take(end.saturating_sub(start) as usize)
                .collect(),
            None => posts,
        }
    }

    /// Evaluates `query` the way the hosted API would, returning the same JSON shape.
    pub fn execute(&self, query: &CatalogQuery, perspective: Perspective) -> Value {
        let view = self.view(perspective);
        let posts = || view.of_type("post");
        let in_locale = |post: &&Value, locale: &str| str_field(post, "locale") == Some(locale);
        let cards = |selected: Vec<&Value>| {
            Value::Array(selected.into_iter().map(|p| Self::project_card(&view, p)).collect())
        };

        match query {
            CatalogQuery::PostsByLocale { locale, .. } | CatalogQuery::FeaturedPosts { locale } => {
                let selected = posts().filter(|p| in_locale(p, locale.as_str())).collect();
                cards(Self::window(query, selected))
            }
            CatalogQuery::PostBySlug { slug, locale } => posts()
                .find(|p| slug_current(p) == Some(slug.as_str()) && in_locale(p, locale.as_str()))
                .map(|p| Self::project_detail(&view, p))
                .unwrap_or(Value::Null),
            CatalogQuery::AllPostSlugs => Value::Array(
                posts()
                    .filter_map(|p| {
                        slug_current(p)
                            .map(|slug| json!({ "slug": slug, "locale": field_or_null(p, "locale") }))
                    })
                    .collect(),
            ),
            CatalogQuery::RelatedPosts {
                locale,
                slug,
                category_ids,
            } => {
                let shares_category = |post: &&Value| match post.get("categories") {
                    Some(Value::Array(refs)) => refs.iter().any(|r| {
                        r.get("_ref")
                            .and_then(Value::as_str)
                            .map_or(false, |id| category_ids.iter().any(|c| c == id))
                    }),
                    _ => false,
                };
                let selected = posts()
                    .filter(|p| in_locale(p, locale.as_str()))
                    .filter(|p| slug_current(p) != Some(slug.as_str()))
                    .filter(shares_category)
                    .collect();
                cards(Self::window(query, selected))
            }
            CatalogQuery::PostsByCategory {
                locale,
                category_slug,
            } => {
                let in_category = |post: &&Value| match post.get("categories") {
                    Some(Value::Array(refs)) => refs
                        .iter()
                        .filter_map(|r| view.deref(r))
                        .any(|c| slug_current(c) == Some(category_slug.as_str())),
                    _ => false,
                };
                let selected = posts()
                    .filter(|p| in_locale(p, locale.as_str()))
                    .filter(in_category)
                    .collect();
                cards(Self::window(query, selected))
            }
            CatalogQuery::AllCategories => {
                let mut categories: Vec<&Value> = view.of_type("category").collect();
                let english_title = |c: &Value| {
                    c.get("title")
                        .and_then(|t| t.get("en"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                // Missing titles sort last, as nulls do in the hosted API.
                categories.sort_by(|a, b| match (english_title(a), english_title(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });

                Value::Array(
                    categories
                        .into_iter()
                        .map(|c| {
                            let id = str_field(c, "_id").unwrap_or_default();
                            let count = posts().filter(|p| references(p, id)).count();
                            let mut out =
                                select(c, &["_id", "title", "description", "color"]);
                            if let Value::Object(obj) = &mut out {
                                obj.insert(
                                    "slug".into(),
                                    slug_current(c).map(|s| json!(s)).unwrap_or(Value::Null),
                                );
                                obj.insert("postCount".into(), json!(count));
                            }
                            out
                        })
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Locale;

    fn dataset() -> FixtureDataset {
        FixtureDataset::parse_ndjson(
            r#"
{"_id":"author-lan","_type":"author","name":"Lan","slug":{"current":"lan"},"bio":{"en":"Editor"}}
{"_id":"cat-guides","_type":"category","title":{"en":"Guides","vi":"Hướng dẫn"},"slug":{"current":"guides"},"color":"green"}
{"_id":"cat-news","_type":"category","title":{"en":"News"},"slug":{"current":"news"},"color":"blue"}
{"_id":"p1","_type":"post","title":"Đổi bằng","slug":{"current":"doi-bang"},"locale":"vi","publishedAt":"2024-05-01T00:00:00Z","author":{"_ref":"author-lan"},"categories":[{"_ref":"cat-guides"}],"body":[{"_type":"block","children":[{"_type":"span","text":"Xin chào"}]}]}
{"_id":"p2","_type":"post","title":"License exchange","slug":{"current":"doi-bang"},"locale":"en","publishedAt":"2024-05-02T00:00:00Z","categories":[{"_ref":"cat-guides"}]}
{"_id":"p3","_type":"post","title":"Newer","slug":{"current":"newer"},"locale":"vi","publishedAt":"2024-06-01T00:00:00Z","categories":[{"_ref":"cat-guides"},{"_ref":"missing"}]}
{"_id":"p4","_type":"post","title":"Untitled","locale":"vi","publishedAt":"2024-04-01T00:00:00Z"}
{"_id":"drafts.p3","_type":"post","title":"Newer (draft)","slug":{"current":"newer"},"locale":"vi","publishedAt":"2024-06-01T00:00:00Z"}
{"_id":"drafts.p5","_type":"post","title":"Unpublished","slug":{"current":"unpublished"},"locale":"vi","publishedAt":"2024-07-01T00:00:00Z"}
"#,
        )
        .unwrap()
    }

    #[test]
    fn slug_lookup_never_crosses_locales() {
        let data = dataset();
        for (locale, id) in [(Locale::Vi, "p1"), (Locale::En, "p2")] {
            let post = data.execute(
                &CatalogQuery::PostBySlug {
                    slug: "doi-bang".into(),
                    locale,
                },
                Perspective::Published,
            );
            assert_eq!(post["_id"], id);
            assert_eq!(post["locale"], locale.as_str());
        }
    }

    #[test]
    fn detail_joins_author_with_bio_and_categories() {
        let post = dataset().execute(
            &CatalogQuery::PostBySlug {
                slug: "doi-bang".into(),
                locale: Locale::Vi,
            },
            Perspective::Published,
        );
        assert_eq!(post["author"]["name"], "Lan");
        assert_eq!(post["author"]["bio"]["en"], "Editor");
        assert_eq!(post["categories"][0]["_id"], "cat-guides");
        assert_eq!(post["body"][0]["_type"], "block");
        assert_eq!(post["slug"], "doi-bang");
    }

    #[test]
    fn listing_is_newest_first_and_locale_scoped() {
        let posts = dataset().execute(
            &CatalogQuery::PostsByLocale {
                locale: Locale::Vi,
                page: 0,
            },
            Perspective::Published,
        );
        let ids: Vec<&str> = posts
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p3", "p1", "p4"]);

        let second_page = dataset().execute(
            &CatalogQuery::PostsByLocale {
                locale: Locale::Vi,
                page: 1,
            },
            Perspective::Published,
        );
        assert_eq!(second_page, json!([]));
    }

    #[test]
    fn slug_listing_has_one_entry_per_defined_slug() {
        let slugs = dataset().execute(&CatalogQuery::AllPostSlugs, Perspective::Published);
        let mut pairs: Vec<(String, String)> = slugs
            .as_array()
            .unwrap()
            .iter()
            .map(|e| {
                (
                    e["slug"].as_str().unwrap().to_string(),
                    e["locale"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("doi-bang".to_string(), "en".to_string()),
                ("doi-bang".to_string(), "vi".to_string()),
                ("newer".to_string(), "vi".to_string()),
            ]
        );
    }

    #[test]
    fn related_posts_share_a_category_and_exclude_self() {
        let related = dataset().execute(
            &CatalogQuery::RelatedPosts {
                locale: Locale::Vi,
                slug: "doi-bang".into(),
                category_ids: vec!["cat-guides".into()],
            },
            Perspective::Published,
        );
        let related = related.as_array().unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0]["_id"], "p3");
        // Dangling references become nulls in the joined array.
        assert_eq!(related[0]["categories"][1], Value::Null);
    }

    #[test]
    fn posts_by_category_follow_category_slug() {
        let posts = dataset().execute(
            &CatalogQuery::PostsByCategory {
                locale: Locale::En,
                category_slug: "guides".into(),
            },
            Perspective::Published,
        );
        assert_eq!(posts.as_array().unwrap().len(), 1);

        let none = dataset().execute(
            &CatalogQuery::PostsByCategory {
                locale: Locale::En,
                category_slug: "news".into(),
            },
            Perspective::Published,
        );
        assert_eq!(none, json!([]));
    }

    #[test]
    fn categories_are_sorted_and_counted() {
        let categories = dataset().execute(&CatalogQuery::AllCategories, Perspective::Published);
        assert_eq!(categories[0]["slug"], "guides");
        assert_eq!(categories[0]["postCount"], 3);
        assert_eq!(categories[1]["slug"], "news");
        assert_eq!(categories[1]["postCount"], 0);
    }

    #[test]
    fn drafts_are_hidden_unless_previewing() {
        let data = dataset();
        let lookup = |slug: &str, perspective| {
            data.execute(
                &CatalogQuery::PostBySlug {
                    slug: slug.into(),
                    locale: Locale::Vi,
                },
                perspective,
            )
        };

        assert_eq!(lookup("unpublished", Perspective::Published), Value::Null);
        assert_eq!(lookup("unpublished", Perspective::Drafts)["_id"], "p5");
        assert_eq!(lookup("newer", Perspective::Published)["title"], "Newer");
        assert_eq!(lookup("newer", Perspective::Drafts)["title"], "Newer (draft)");
    }

    #[test]
    fn malformed_lines_report_their_position() {
        let err = FixtureDataset::parse_ndjson("{\"_id\":\"a\"}\n{oops").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
