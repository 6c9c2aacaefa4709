use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod locale;
pub mod portable_text;

pub use locale::{resolve_localized, Locale, LocalizedString};
pub use portable_text::Block;

/// GROQ projections return `null` for absent fields; treat that as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Dereferenced arrays keep a `null` slot for every dangling reference. Drop them.
fn skip_null_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// A slug as the CMS stores it (`{ "current": "..." }`) or as a projected string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrObject {
            String(String),
            Object { current: String },
        }

        match StringOrObject::deserialize(deserializer)? {
            StringOrObject::String(s) | StringOrObject::Object { current: s } => Ok(Slug(s)),
        }
    }
}

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetReference {
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// An image field or image block: a reference to an uploaded asset plus alt text.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    #[serde(default)]
    pub asset: Option<AssetReference>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn asset_ref(&self) -> Option<&str> {
        self.asset.as_ref().map(|a| a.reference.as_str())
    }
}

/// The fixed palette editors pick category badges from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    Blue,
    Green,
    Red,
    Purple,
    Yellow,
}

impl CategoryColor {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blue" => Some(CategoryColor::Blue),
            "green" => Some(CategoryColor::Green),
            "red" => Some(CategoryColor::Red),
            "purple" => Some(CategoryColor::Purple),
            "yellow" => Some(CategoryColor::Yellow),
            _ => None,
        }
    }

    /// CSS class for a badge; categories without a known colour render grey.
    pub fn badge_class(color: Option<Self>) -> &'static str {
        match color {
            Some(CategoryColor::Blue) => "badge badge-blue",
            Some(CategoryColor::Green) => "badge badge-green",
            Some(CategoryColor::Red) => "badge badge-red",
            Some(CategoryColor::Purple) => "badge badge-purple",
            Some(CategoryColor::Yellow) => "badge badge-yellow",
            None => "badge badge-gray",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub bio: Option<LocalizedString>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<LocalizedString>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub post_count: Option<u32>,
}

impl Category {
    pub fn color(&self) -> Option<CategoryColor> {
        self.color.as_deref().and_then(CategoryColor::parse)
    }
}

/// Per-post overrides for the document `<title>` and meta description.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default)]
    pub meta_title: Option<LocalizedString>,
    #[serde(default)]
    pub meta_description: Option<LocalizedString>,
}

/// A blog post with its author and categories joined inline.
///
/// Listing queries leave `body`, `seo` and the author bio out, so those stay empty there.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<LocalizedString>,
    #[serde(default)]
    pub excerpt: Option<LocalizedString>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub cover_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Block>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub seo: Option<Seo>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default, deserialize_with = "skip_null_items")]
    pub categories: Vec<Category>,
}

impl Post {
    /// `None` when the stored tag is outside the supported pair.
    pub fn locale(&self) -> Option<Locale> {
        self.locale.as_deref().and_then(Locale::from_path_segment)
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_ref().map(Slug::as_str)
    }

    /// `_id`s of the referenced categories, as needed by the related-posts query.
    pub fn category_ids(&self) -> Vec<String> {
        self.categories.iter().filter_map(|c| c.id.clone()).collect()
    }
}

/// One row of the static-path listing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlugEntry {
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locale: String,
}
