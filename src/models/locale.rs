use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The two languages the site is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Vi,
    En,
}

impl Locale {
    /// Locale applied when a request carries no recognised prefix.
    pub const DEFAULT: Locale = Locale::Vi;

    /// Every supported locale, in the order pages and sitemaps list them.
    pub const ALL: [Locale; 2] = [Locale::Vi, Locale::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Vi => "vi",
            Locale::En => "en",
        }
    }

    /// Parses a language tag, ignoring case and any region suffix (`en-US`, `vi_VN`).
    pub fn parse(value: &str) -> Option<Self> {
        let lang = value.trim().split(['-', '_']).next().unwrap_or("");
        match lang.to_ascii_lowercase().as_str() {
            "vi" => Some(Locale::Vi),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// Same as [`Locale::parse`] but never fails: unknown tags become the default.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::DEFAULT)
    }

    /// Strict match on a single path segment. Region suffixes are not accepted here.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "vi" => Some(Locale::Vi),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// The other locale, used by the language switcher.
    pub fn alternate(self) -> Self {
        match self {
            Locale::Vi => Locale::En,
            Locale::En => Locale::Vi,
        }
    }

    /// Value for the `og:locale` meta tag.
    pub fn og_locale(self) -> &'static str {
        match self {
            Locale::Vi => "vi_VN",
            Locale::En => "en_US",
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Locale::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported locale '{}'", raw)))
    }
}

/// A field the CMS stores either as one plain string or as a per-language map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizedString {
    Plain(String),
    Map(BTreeMap<String, String>),
}

impl LocalizedString {
    /// The raw value for exactly this language tag, without any fallback.
    pub fn get(&self, tag: &str) -> Option<&str> {
        match self {
            LocalizedString::Plain(s) => Some(s.as_str()),
            LocalizedString::Map(map) => map.get(tag).map(String::as_str),
        }
    }
}

impl<'de> Deserialize<'de> for LocalizedString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrMap {
            String(String),
            Map(BTreeMap<String, Option<serde_json::Value>>),
        }

        match StringOrMap::deserialize(deserializer)? {
            StringOrMap::String(s) => Ok(LocalizedString::Plain(s)),
            // Sanity objects carry `_type` and friends next to the language keys.
            StringOrMap::Map(map) => Ok(LocalizedString::Map(
                map.into_iter()
                    .filter(|(k, _)| !k.starts_with('_'))
                    .filter_map(|(k, v)| match v {
                        Some(serde_json::Value::String(s)) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            )),
        }
    }
}

/// Lookup order for localized content: the requested language, then English, then Vietnamese.
pub fn fallback_chain(requested: Locale) -> [&'static str; 3] {
    [requested.as_str(), Locale::En.as_str(), Locale::Vi.as_str()]
}

/// Picks the best string for `requested` from a localized field.
///
/// Order is requested → `en` → `vi` → `placeholder`. Empty strings count as missing.
pub fn resolve_localized(
    value: Option<&LocalizedString>,
    requested: Locale,
    placeholder: &str,
) -> String {
    value
        .and_then(|v| {
            fallback_chain(requested)
                .iter()
                .filter_map(|tag| v.get(tag))
                .find(|s| !s.trim().is_empty())
        })
        .unwrap_or(placeholder)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> LocalizedString {
        LocalizedString::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn parse_accepts_region_tags() {
        assert_eq!(Locale::parse("en-US"), Some(Locale::En));
        assert_eq!(Locale::parse("VI_vn"), Some(Locale::Vi));
        assert_eq!(Locale::parse("fr"), None);
        assert_eq!(Locale::parse(""), None);
        assert_eq!(Locale::parse_or_default("de"), Locale::Vi);
    }

    #[test]
    fn path_segment_is_strict() {
        assert_eq!(Locale::from_path_segment("en"), Some(Locale::En));
        assert_eq!(Locale::from_path_segment("EN"), None);
        assert_eq!(Locale::from_path_segment("en-US"), None);
    }

    #[test]
    fn resolves_requested_locale_first() {
        let title = map(&[("vi", "Xin chào"), ("en", "Hello")]);
        assert_eq!(resolve_localized(Some(&title), Locale::Vi, "Blog Post"), "Xin chào");
        assert_eq!(resolve_localized(Some(&title), Locale::En, "Blog Post"), "Hello");
    }

    #[test]
    fn falls_back_to_english_then_vietnamese_then_placeholder() {
        let only_en = map(&[("en", "Hello")]);
        assert_eq!(resolve_localized(Some(&only_en), Locale::Vi, "Blog Post"), "Hello");

        let only_vi = map(&[("vi", "Xin chào")]);
        assert_eq!(resolve_localized(Some(&only_vi), Locale::En, "Blog Post"), "Xin chào");

        let empty = map(&[]);
        assert_eq!(resolve_localized(Some(&empty), Locale::En, "Blog Post"), "Blog Post");
        assert_eq!(resolve_localized(None, Locale::Vi, "Blog Post"), "Blog Post");
    }

    #[test]
    fn blank_values_are_skipped() {
        let title = map(&[("vi", "  "), ("en", "Hello")]);
        assert_eq!(resolve_localized(Some(&title), Locale::Vi, "x"), "Hello");
    }

    #[test]
    fn plain_string_applies_to_every_locale() {
        let title: LocalizedString = serde_json::from_str("\"Tiêu đề\"").unwrap();
        assert_eq!(resolve_localized(Some(&title), Locale::En, "x"), "Tiêu đề");
    }

    #[test]
    fn map_deserialization_drops_sanity_metadata() {
        let title: LocalizedString =
            serde_json::from_str(r#"{"_type":"localeString","vi":"Chào","en":null}"#).unwrap();
        assert_eq!(title, map(&[("vi", "Chào")]));
    }

    #[test]
    fn locale_deserializes_from_tag() {
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
        assert!(serde_json::from_str::<Locale>("\"ja\"").is_err());
    }
}
