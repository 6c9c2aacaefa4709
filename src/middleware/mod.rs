use actix_session::{
    storage::CookieSessionStore, Session, SessionExt, SessionInsertError, SessionMiddleware,
};
use actix_web::{
    body::EitherBody,
    cookie::{Key, SameSite},
    dev::{self, forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, FromRequest, HttpRequest, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::future::{ready, Ready as StdReady};

use crate::content::Perspective;
use crate::error::AppError;
use crate::models::Locale;

pub const SESSION_COOKIE_NAME: &str = "iaa_session";

/// Session key holding the draft-mode flag.
const DRAFT_MODE_KEY: &str = "draft_mode";

/// Path prefixes that are never locale-prefixed.
const UNLOCALIZED_PREFIXES: &[&str] = &["/api", "/static", "/studio"];

/// Cookie-backed session holding nothing but the draft-mode flag.
pub fn draft_session(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

pub fn is_draft_mode(session: &Session) -> bool {
    session.get::<bool>(DRAFT_MODE_KEY).unwrap_or(None) == Some(true)
}

pub fn enable_draft_mode(session: &Session) -> Result<(), SessionInsertError> {
    session.insert(DRAFT_MODE_KEY, true)
}

pub fn disable_draft_mode(session: &Session) {
    session.remove(DRAFT_MODE_KEY);
}

/// Per-request rendering context: the active locale and whether drafts are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub locale: Locale,
    pub draft_mode: bool,
}

impl RequestContext {
    pub fn perspective(&self) -> Perspective {
        Perspective::for_draft_mode(self.draft_mode)
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        // Routes bind `{locale}` loosely, so `/favicon.ico` would otherwise render as a page.
        let locale = match req.match_info().get("locale") {
            Some(segment) => match Locale::from_path_segment(segment) {
                Some(locale) => locale,
                None => {
                    return ready(Err(
                        AppError::NotFound(format!("locale segment '{}'", segment)).into()
                    ))
                }
            },
            None => Locale::default(),
        };
        let draft_mode = is_draft_mode(&req.get_session());
        ready(Ok(RequestContext { locale, draft_mode }))
    }
}

fn is_unlocalized(path: &str) -> bool {
    UNLOCALIZED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .map_or(false, |rest| rest.starts_with('/'))
    })
}

/// Where a request without a locale prefix should be sent, or `None` to let it through.
///
/// API routes, static files and anything that looks like a file (`.` in the last segment)
/// are never redirected. Unknown first segments get the default locale prepended.
pub fn locale_redirect_target(path: &str, query: &str) -> Option<String> {
    if is_unlocalized(path) {
        return None;
    }
    if path.rsplit('/').next().map_or(false, |last| last.contains('.')) {
        return None;
    }

    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
    if Locale::from_path_segment(first_segment).is_some() {
        return None;
    }

    let rest = if path == "/" { "" } else { path };
    let mut target = format!("/{}{}", Locale::DEFAULT, rest);
    if !query.is_empty() {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}

/// Redirects every page request that lacks a supported locale prefix.
pub struct LocaleRedirect;

impl<S, B> Transform<S, ServiceRequest> for LocaleRedirect
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LocaleRedirectMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(LocaleRedirectMiddleware { service })
    }
}

pub struct LocaleRedirectMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LocaleRedirectMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match locale_redirect_target(req.path(), req.query_string()) {
            None => {
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Some(target) => Box::pin(async move {
                log::debug!("Redirecting '{}' to '{}'", req.path(), target);
                let (http_req, _payload) = req.into_parts();
                let res = HttpResponse::TemporaryRedirect()
                    .insert_header((header::LOCATION, target))
                    .finish()
                    .map_into_right_body();
                Ok(ServiceResponse::new(http_req, res))
            }),
        }
    }
}
