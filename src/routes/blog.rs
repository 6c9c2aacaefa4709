use actix_web::{web, HttpResponse};
use futures_util::future::try_join;
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::content::queries::POSTS_PAGE_SIZE;
use crate::error::AppError;
use crate::helper::page_helpers::{
    self, base_context, cache_control, category_badge, format_date, post_cards, CategoryBadge,
    BLOG_CACHE_CONTROL, UNTITLED_PLACEHOLDER,
};
use crate::helper::{public_helpers, rich_text};
use crate::middleware::RequestContext;
use crate::models::{resolve_localized, Locale, Post};
use crate::routes::html_page;
use crate::AppState;

const COVER_WIDTH: u32 = 1200;
const COVER_HEIGHT: u32 = 600;
const OG_IMAGE_WIDTH: u32 = 1200;
const OG_IMAGE_HEIGHT: u32 = 630;
const AUTHOR_AVATAR_SIZE: u32 = 96;

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    /// One-based page number.
    page: Option<u32>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct Pagination {
    page: u32,
    prev_href: Option<String>,
    next_href: Option<String>,
}

fn pagination(locale: Locale, page: u32, shown: usize) -> Pagination {
    let href = |p: u32| {
        if p <= 1 {
            format!("/{}/blog", locale)
        } else {
            format!("/{}/blog?page={}", locale, p)
        }
    };
    Pagination {
        page,
        prev_href: (page > 1).then(|| href(page - 1)),
        // A full page means there may be more.
        next_href: (shown as u32 >= POSTS_PAGE_SIZE).then(|| href(page + 1)),
    }
}

pub async fn blog_index(
    ctx: RequestContext,
    query: web::Query<BlogQuery>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let perspective = ctx.perspective();

    let posts_future = async {
        match category {
            Some(slug) => {
                public_helpers::fetch_posts_by_category(&state.content, ctx.locale, slug, perspective)
                    .await
            }
            None => {
                public_helpers::fetch_posts_by_locale(&state.content, ctx.locale, page - 1, perspective)
                    .await
            }
        }
    };
    let categories_future = public_helpers::fetch_all_categories(&state.content, perspective);
    let (posts, categories) = try_join(posts_future, categories_future).await?;

    let badges: Vec<CategoryBadge> = categories
        .iter()
        .map(|c| category_badge(c, ctx.locale, category))
        .collect();
    let active_category = badges.iter().find(|b| b.active).map(|b| b.title.clone());

    let mut context = base_context(&ctx, "blog", &state.site_url);
    context.insert("page_title", &page_helpers::message(ctx.locale, "blog.title"));
    context.insert(
        "meta_description",
        &page_helpers::message(ctx.locale, "blog.description"),
    );
    context.insert("posts", &post_cards(&posts, ctx.locale, &state.images));
    context.insert("categories", &badges);
    context.insert("active_category", &active_category);
    if category.is_none() {
        context.insert("pagination", &pagination(ctx.locale, page, posts.len()));
    }

    let body = tera.render("blog/index.html", &context)?;
    Ok(html_page(body, cache_control(ctx.draft_mode, BLOG_CACHE_CONTROL)))
}

#[derive(Debug, Serialize)]
struct AuthorView {
    name: String,
    image_url: Option<String>,
    bio: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostView {
    title: String,
    excerpt: Option<String>,
    cover_url: Option<String>,
    cover_alt: String,
    published_label: Option<String>,
    published_iso: Option<String>,
    author: Option<AuthorView>,
    categories: Vec<CategoryBadge>,
    body_html: String,
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn post_view(post: &Post, locale: Locale, state: &AppState) -> PostView {
    let title = resolve_localized(post.title.as_ref(), locale, UNTITLED_PLACEHOLDER);
    let cover = post.cover_image.as_ref();
    PostView {
        cover_url: cover
            .and_then(|img| state.images.image(img))
            .map(|url| url.width(COVER_WIDTH).height(COVER_HEIGHT).url()),
        cover_alt: cover
            .and_then(|img| img.alt.clone())
            .unwrap_or_else(|| title.clone()),
        excerpt: non_empty(resolve_localized(post.excerpt.as_ref(), locale, "")),
        published_label: post.published_at.map(|d| format_date(d, locale, true)),
        published_iso: post.published_at.map(|d| d.to_rfc3339()),
        author: post.author.as_ref().and_then(|author| {
            Some(AuthorView {
                name: author.name.clone().filter(|n| !n.trim().is_empty())?,
                image_url: author.image.as_ref().and_then(|img| state.images.image(img)).map(
                    |url| url.width(AUTHOR_AVATAR_SIZE).height(AUTHOR_AVATAR_SIZE).url(),
                ),
                bio: non_empty(resolve_localized(author.bio.as_ref(), locale, "")),
            })
        }),
        categories: post
            .categories
            .iter()
            .map(|c| category_badge(c, locale, None))
            .collect(),
        body_html: rich_text::render_blocks(&post.body, &state.images),
        title,
    }
}

pub async fn blog_post(
    ctx: RequestContext,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let (_, slug) = path.into_inner();
    let perspective = ctx.perspective();

    let post = public_helpers::fetch_post_by_slug(&state.content, &slug, ctx.locale, perspective)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post '{}' in '{}'", slug, ctx.locale)))?;
    let related =
        public_helpers::fetch_related_posts(&state.content, &post, ctx.locale, perspective).await?;

    let view = post_view(&post, ctx.locale, &state);
    let seo = post.seo.as_ref();
    let page_title = non_empty(resolve_localized(
        seo.and_then(|s| s.meta_title.as_ref()),
        ctx.locale,
        "",
    ))
    .unwrap_or_else(|| view.title.clone());
    let meta_description = non_empty(resolve_localized(
        seo.and_then(|s| s.meta_description.as_ref()),
        ctx.locale,
        "",
    ))
    .or_else(|| view.excerpt.clone())
    .unwrap_or_else(|| page_helpers::message(ctx.locale, "blog.description"));
    let og_image = post
        .cover_image
        .as_ref()
        .and_then(|img| state.images.image(img))
        .map(|url| url.width(OG_IMAGE_WIDTH).height(OG_IMAGE_HEIGHT).url());

    let mut context = base_context(&ctx, &format!("blog/{}", slug), &state.site_url);
    context.insert("page_title", &page_title);
    context.insert("meta_description", &meta_description);
    context.insert("og_type", "article");
    context.insert("og_image", &og_image);
    context.insert("post", &view);
    context.insert("related", &post_cards(&related, ctx.locale, &state.images));

    let body = tera.render("blog/post.html", &context)?;
    Ok(html_page(body, cache_control(ctx.draft_mode, BLOG_CACHE_CONTROL)))
}
