//! View models and shared template context for the page renderers.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use tera::Context;

use crate::content::ImageUrlBuilder;
use crate::middleware::RequestContext;
use crate::models::{resolve_localized, Category, CategoryColor, Locale, Post};

/// Shown when a post has no title in any language.
pub const UNTITLED_PLACEHOLDER: &str = "Blog Post";

/// Blog pages may be served up to a minute stale.
pub const BLOG_CACHE_CONTROL: &str = "public, max-age=0, s-maxage=60, stale-while-revalidate=60";
pub const STATIC_CACHE_CONTROL: &str = "public, max-age=0, s-maxage=3600";
pub const DRAFT_CACHE_CONTROL: &str = "private, no-store";

const CARD_IMAGE_WIDTH: u32 = 600;
const CARD_IMAGE_HEIGHT: u32 = 400;

/// Dates are shown in Vietnam time (UTC+7) in both languages.
const SITE_UTC_OFFSET_SECS: i32 = 7 * 3600;

static MESSAGES_VI: OnceLock<Value> = OnceLock::new();
static MESSAGES_EN: OnceLock<Value> = OnceLock::new();

fn parse_messages(raw: &str, locale: Locale) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::error!("Message catalog for '{}' is not valid JSON: {}", locale, e);
        Value::Null
    })
}

/// UI strings for `locale`, from `messages/{locale}.json`.
pub fn messages(locale: Locale) -> &'static Value {
    match locale {
        Locale::Vi => MESSAGES_VI
            .get_or_init(|| parse_messages(include_str!("../../messages/vi.json"), locale)),
        Locale::En => MESSAGES_EN
            .get_or_init(|| parse_messages(include_str!("../../messages/en.json"), locale)),
    }
}

/// Looks up a dotted key (`blog.title`) in the catalog, falling back to the key itself.
pub fn message(locale: Locale, key: &str) -> String {
    key.split('.')
        .try_fold(messages(locale), |node, part| node.get(part))
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string()
}

pub fn cache_control(draft_mode: bool, published: &'static str) -> &'static str {
    if draft_mode {
        DRAFT_CACHE_CONTROL
    } else {
        published
    }
}

/// `long`: "October 19, 2026" / "19 tháng 10, 2026". Short: "Oct 19, 2026" / "19 thg 10, 2026".
pub fn format_date(date: DateTime<Utc>, locale: Locale, long: bool) -> String {
    let offset = FixedOffset::east_opt(SITE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    let pattern = match (locale, long) {
        (Locale::Vi, true) => "%-d tháng %-m, %Y",
        (Locale::Vi, false) => "%-d thg %-m, %Y",
        (Locale::En, true) => "%B %-d, %Y",
        (Locale::En, false) => "%b %-d, %Y",
    };
    date.with_timezone(&offset).format(pattern).to_string()
}

#[derive(Debug, Serialize)]
pub struct NavItem {
    pub href: String,
    pub label: String,
    pub active: bool,
}

/// Header navigation: (message key, path below the locale).
const NAV: &[(&str, &str)] = &[
    ("about", "gioi-thieu"),
    ("procedure", "thu-tuc"),
    ("services", "dich-vu"),
    ("exchange", "doi-bang"),
    ("faq", "hoi-dap"),
    ("experience", "kinh-nghiem"),
    ("blog", "blog"),
    ("contact", "lien-he"),
];

fn localized_href(locale: Locale, tail: &str) -> String {
    if tail.is_empty() {
        format!("/{}", locale)
    } else {
        format!("/{}/{}", locale, tail)
    }
}

/// Context every page template expects. `tail` is the path below the locale prefix
/// (`""` for home, `"blog/some-post"` for an article) and drives the language switcher.
pub fn base_context(ctx: &RequestContext, tail: &str, site_url: &str) -> Context {
    let tail = tail.trim_matches('/');
    let nav: Vec<NavItem> = NAV
        .iter()
        .map(|(key, path)| NavItem {
            href: localized_href(ctx.locale, path),
            label: message(ctx.locale, &format!("nav.{}", key)),
            active: tail == *path || tail.starts_with(&format!("{}/", path)),
        })
        .collect();

    let mut context = Context::new();
    context.insert("locale", ctx.locale.as_str());
    context.insert("og_locale", ctx.locale.og_locale());
    context.insert("alt_locale", ctx.locale.alternate().as_str());
    context.insert("t", messages(ctx.locale));
    context.insert("nav", &nav);
    context.insert("home_href", &localized_href(ctx.locale, ""));
    context.insert("current_path", &localized_href(ctx.locale, tail));
    context.insert("switch_href", &localized_href(ctx.locale.alternate(), tail));
    context.insert("canonical_url", &format!("{}{}", site_url, localized_href(ctx.locale, tail)));
    context.insert("draft_mode", &ctx.draft_mode);
    context.insert("current_year", &Utc::now().year());
    context
}

#[derive(Debug, Serialize)]
pub struct CategoryBadge {
    pub title: String,
    pub slug: Option<String>,
    pub class: &'static str,
    pub href: Option<String>,
    pub post_count: Option<u32>,
    pub active: bool,
}

pub fn category_badge(category: &Category, locale: Locale, active_slug: Option<&str>) -> CategoryBadge {
    let slug = category.slug.as_ref().map(|s| s.as_str().to_string());
    CategoryBadge {
        title: resolve_localized(category.title.as_ref(), locale, ""),
        href: slug.as_ref().map(|s| {
            let encoded: String = url::form_urlencoded::byte_serialize(s.as_bytes()).collect();
            format!("/{}/blog?category={}", locale, encoded)
        }),
        active: slug.is_some() && slug.as_deref() == active_slug,
        slug,
        class: CategoryColor::badge_class(category.color()),
        post_count: category.post_count,
    }
}

#[derive(Debug, Serialize)]
pub struct PostCard {
    pub title: String,
    pub excerpt: Option<String>,
    pub href: Option<String>,
    pub image_url: Option<String>,
    pub published_label: Option<String>,
    pub published_iso: Option<String>,
    pub author_name: Option<String>,
    pub categories: Vec<CategoryBadge>,
}

pub fn post_card(post: &Post, locale: Locale, images: &ImageUrlBuilder) -> PostCard {
    let excerpt = resolve_localized(post.excerpt.as_ref(), locale, "");
    PostCard {
        title: resolve_localized(post.title.as_ref(), locale, UNTITLED_PLACEHOLDER),
        excerpt: (!excerpt.is_empty()).then_some(excerpt),
        href: post.slug().map(|slug| format!("/{}/blog/{}", locale, slug)),
        image_url: post
            .cover_image
            .as_ref()
            .and_then(|img| images.image(img))
            .map(|url| url.width(CARD_IMAGE_WIDTH).height(CARD_IMAGE_HEIGHT).url()),
        published_label: post.published_at.map(|d| format_date(d, locale, false)),
        published_iso: post.published_at.map(|d| d.to_rfc3339()),
        author_name: post.author.as_ref().and_then(|a| a.name.clone()),
        categories: post
            .categories
            .iter()
            .map(|c| category_badge(c, locale, None))
            .collect(),
    }
}

pub fn post_cards(posts: &[Post], locale: Locale, images: &ImageUrlBuilder) -> Vec<PostCard> {
    posts.iter().map(|p| post_card(p, locale, images)).collect()
}
