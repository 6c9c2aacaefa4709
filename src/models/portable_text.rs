//! Typed view of the CMS block-editor output (Portable Text).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{null_as_default, ImageRef};

/// Inline run of text with the decorators and annotation keys applied to it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Span {
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub marks: Vec<String>,
}

/// Annotation referenced from a span's `marks` by `_key` (links are the only kind rendered).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub blank: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub list_item: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Span>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mark_defs: Vec<MarkDef>,
}

/// One top-level entry of a rich-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(TextBlock),
    Image(ImageRef),
    /// Any `_type` without a renderer, kept so the sequence stays intact.
    Unknown(String),
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // A malformed block must not take the whole body down with it.
        let block = match kind.as_str() {
            "block" => serde_json::from_value(value).map(Block::Text).ok(),
            "image" => serde_json::from_value(value).map(Block::Image).ok(),
            _ => None,
        };
        Ok(block.unwrap_or(Block::Unknown(kind)))
    }
}
