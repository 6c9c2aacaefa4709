//! Draft-mode toggle used by the CMS "open preview" button.

use actix_session::Session;
use actix_web::{http::header, http::header::ContentType, web, HttpResponse};
use serde::Deserialize;

use crate::content::Perspective;
use crate::error::AppError;
use crate::helper::public_helpers;
use crate::middleware::{disable_draft_mode, enable_draft_mode};
use crate::models::Locale;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    secret: Option<String>,
    slug: Option<String>,
    locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExitPreviewQuery {
    redirect: Option<String>,
}

/// Compares without short-circuiting on the first differing byte.
fn secrets_match(supplied: &str, expected: &str) -> bool {
    let (a, b) = (supplied.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `Some(path)` when `candidate` stays on this site: an absolute path that is not
/// protocol-relative.
pub fn local_path(candidate: &str) -> Option<&str> {
    let is_local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.chars().any(char::is_control);
    is_local.then_some(candidate)
}

/// The bare document slug: `/en/blog/my-post` and `my-post` both become `my-post`.
fn lookup_slug(slug: &str, locale: Locale) -> &str {
    let prefix = format!("/{}/blog/", locale);
    slug.strip_prefix(prefix.as_str())
        .unwrap_or(slug)
        .trim_matches('/')
}

/// The locale named by a `/{locale}/blog/` prefix on `slug`.
fn locale_from_path(slug: &str) -> Option<Locale> {
    let (segment, rest) = slug.strip_prefix('/')?.split_once('/')?;
    if !rest.starts_with("blog/") {
        return None;
    }
    Locale::from_path_segment(segment)
}

/// `GET /api/preview?secret=..&slug=..&locale=..`
pub async fn enable_preview(
    query: web::Query<PreviewQuery>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let authorized = match (&state.preview_secret, query.secret.as_deref()) {
        (Some(expected), Some(supplied)) => secrets_match(supplied, expected),
        (None, _) => {
            log::warn!("Preview requested but no preview secret is configured");
            false
        }
        (Some(_), None) => false,
    };
    if !authorized {
        log::warn!("Rejected preview request with an invalid secret");
        return Err(AppError::Unauthorized);
    }

    let slug = query
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("No slug provided".to_string()))?;
    let locale = query
        .locale
        .as_deref()
        .and_then(Locale::parse)
        .or_else(|| locale_from_path(slug))
        .unwrap_or(Locale::En);

    let bare_slug = lookup_slug(slug, locale);
    if bare_slug.is_empty() {
        return Err(AppError::BadRequest("No slug provided".to_string()));
    }

    let post = public_helpers::fetch_post_by_slug(
        &state.content,
        bare_slug,
        locale,
        Perspective::Drafts,
    )
    .await?;
    if post.is_none() {
        return Err(AppError::NotFound(format!(
            "preview target '{}' in '{}'",
            bare_slug, locale
        )));
    }

    enable_draft_mode(&session)?;
    log::info!("Draft mode enabled for '{}' ({})", bare_slug, locale);

    let target = local_path(slug)
        .map(str::to_string)
        .unwrap_or_else(|| format!("/{}/blog/{}", locale, bare_slug));
    Ok(HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, target))
        .finish())
}

/// `DELETE /api/preview`
pub async fn disable_preview(session: Session) -> HttpResponse {
    disable_draft_mode(&session);
    log::info!("Draft mode disabled");
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("Preview mode disabled")
}

/// `GET /api/preview/disable?redirect=..`, the exit link on the draft-mode banner.
pub async fn exit_preview(query: web::Query<ExitPreviewQuery>, session: Session) -> HttpResponse {
    disable_draft_mode(&session);
    log::info!("Draft mode disabled");
    let target = query
        .redirect
        .as_deref()
        .and_then(local_path)
        .unwrap_or("/");
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, target))
        .finish()
}
