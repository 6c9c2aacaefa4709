use actix_web::{web, HttpResponse};
use tera::{Context, Tera};

use crate::error::AppError;
use crate::helper::page_helpers::{
    self, base_context, cache_control, BLOG_CACHE_CONTROL, STATIC_CACHE_CONTROL,
};
use crate::helper::public_helpers;
use crate::middleware::RequestContext;
use crate::models::{Locale, SlugEntry};
use crate::routes::html_page;
use crate::AppState;

/// An informational page whose copy lives entirely in the message catalogs.
#[derive(Debug)]
pub struct StaticPage {
    /// Path segment below the locale prefix.
    pub path: &'static str,
    /// Key under `pages` in `messages/{locale}.json`.
    pub key: &'static str,
    pub template: &'static str,
}

pub const STATIC_PAGES: &[StaticPage] = &[
    StaticPage {
        path: "gioi-thieu",
        key: "about",
        template: "pages/static.html",
    },
    StaticPage {
        path: "dich-vu",
        key: "services",
        template: "pages/static.html",
    },
    StaticPage {
        path: "hoi-dap",
        key: "faq",
        template: "pages/faq.html",
    },
    StaticPage {
        path: "lien-he",
        key: "contact",
        template: "pages/contact.html",
    },
    StaticPage {
        path: "thu-tuc",
        key: "procedure",
        template: "pages/static.html",
    },
    StaticPage {
        path: "doi-bang",
        key: "exchange",
        template: "pages/static.html",
    },
];

pub const EXPERIENCE_PATH: &str = "kinh-nghiem";

pub fn find_static_page(path: &str) -> Option<&'static StaticPage> {
    STATIC_PAGES.iter().find(|page| page.path == path)
}

/// Every page path that can be rendered ahead of time: home, informational pages,
/// the experience page and blog index for each locale, then one path per known post.
pub fn static_paths(slugs: &[SlugEntry]) -> Vec<String> {
    let mut paths = Vec::new();
    for locale in Locale::ALL {
        paths.push(format!("/{}", locale));
        for page in STATIC_PAGES {
            paths.push(format!("/{}/{}", locale, page.path));
        }
        paths.push(format!("/{}/{}", locale, EXPERIENCE_PATH));
        paths.push(format!("/{}/blog", locale));
    }
    for entry in slugs {
        match Locale::from_path_segment(&entry.locale) {
            Some(locale) => paths.push(format!("/{}/blog/{}", locale, entry.slug)),
            None => log::debug!(
                "Skipping slug '{}' with unsupported locale '{}'",
                entry.slug,
                entry.locale
            ),
        }
    }
    paths
}

fn page_context(ctx: &RequestContext, state: &AppState, tail: &str, key: &str) -> Context {
    let mut context = base_context(ctx, tail, &state.site_url);
    let copy = &page_helpers::messages(ctx.locale)["pages"][key];
    context.insert("page", copy);
    context.insert("page_key", key);
    context.insert(
        "page_title",
        &page_helpers::message(ctx.locale, &format!("pages.{}.title", key)),
    );
    context.insert(
        "meta_description",
        &page_helpers::message(ctx.locale, &format!("pages.{}.description", key)),
    );
    context
}

pub async fn home(
    ctx: RequestContext,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let mut context = base_context(&ctx, "", &state.site_url);
    context.insert("page", &page_helpers::messages(ctx.locale)["home"]);
    context.insert("page_title", "");
    context.insert(
        "meta_description",
        &page_helpers::message(ctx.locale, "site.description"),
    );

    let body = tera.render("home.html", &context)?;
    Ok(html_page(body, cache_control(ctx.draft_mode, STATIC_CACHE_CONTROL)))
}

pub async fn static_page(
    ctx: RequestContext,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let (_, page_path) = path.into_inner();
    let page = find_static_page(&page_path)
        .ok_or_else(|| AppError::NotFound(format!("page '/{}/{}'", ctx.locale, page_path)))?;

    let context = page_context(&ctx, &state, page.path, page.key);
    let body = tera.render(page.template, &context)?;
    Ok(html_page(body, cache_control(ctx.draft_mode, STATIC_CACHE_CONTROL)))
}

/// Driving-experience page. Lists featured posts but still renders when the content API
/// is unreachable.
pub async fn experience(
    ctx: RequestContext,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let featured = match public_helpers::fetch_featured_posts(
        &state.content,
        ctx.locale,
        ctx.perspective(),
    )
    .await
    {
        Ok(posts) => posts,
        Err(e) => {
            log::warn!(
                "Featured posts unavailable for '{}', rendering an empty list: {}",
                ctx.locale,
                e
            );
            Vec::new()
        }
    };

    let mut context = page_context(&ctx, &state, EXPERIENCE_PATH, "experience");
    context.insert(
        "posts",
        &page_helpers::post_cards(&featured, ctx.locale, &state.images),
    );

    let body = tera.render("pages/experience.html", &context)?;
    Ok(html_page(body, cache_control(ctx.draft_mode, BLOG_CACHE_CONTROL)))
}
