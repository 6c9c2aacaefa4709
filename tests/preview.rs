#[macro_use]
mod common;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::body_string;
use iaa_web::helper::page_helpers::DRAFT_CACHE_CONTROL;
use iaa_web::middleware::SESSION_COOKIE_NAME;

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.into_owned())
}

#[actix_web::test]
async fn wrong_or_missing_secret_is_rejected_regardless_of_slug() {
    let app = site!();

    for uri in [
        "/api/preview?secret=nope&slug=license-exchange&locale=en",
        "/api/preview?secret=nope&slug=does-not-exist",
        "/api/preview?secret=nope",
        "/api/preview?slug=license-exchange&locale=en",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(session_cookie(&resp).is_none());
        assert_eq!(body_string(resp).await, "Invalid token");
    }
}

#[actix_web::test]
async fn valid_secret_without_slug_is_a_bad_request() {
    let app = site!();

    let req = test::TestRequest::get().uri("/api/preview?secret=s3cret").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(resp).await, "No slug provided");
}

#[actix_web::test]
async fn unknown_slug_is_not_found_and_leaves_draft_mode_off() {
    let app = site!();

    let req = test::TestRequest::get()
        .uri("/api/preview?secret=s3cret&slug=does-not-exist&locale=en")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(session_cookie(&resp).is_none());

    // Locale defaults to English, so a Vietnamese slug does not resolve.
    let req = test::TestRequest::get()
        .uri("/api/preview?secret=s3cret&slug=doi-bang-lai")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(session_cookie(&resp).is_none());
}

#[actix_web::test]
async fn enabling_preview_shows_drafts_until_disabled() {
    let app = site!();

    // Draft-only documents resolve because the lookup reads drafts.
    let req = test::TestRequest::get()
        .uri("/api/preview?secret=s3cret&slug=upcoming-rules&locale=en")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/en/blog/upcoming-rules"
    );
    let cookie = session_cookie(&resp).expect("draft-mode cookie");

    let req = test::TestRequest::get()
        .uri("/en/blog/upcoming-rules")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), DRAFT_CACHE_CONTROL);
    let body = body_string(resp).await;
    assert!(body.contains("Upcoming rule changes"));
    assert!(body.contains("You are viewing unpublished draft content."));

    // Drafts overlay their published versions.
    let req = test::TestRequest::get()
        .uri("/en/blog/license-exchange")
        .cookie(cookie.clone())
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("How to exchange your license (draft)"));

    let req = test::TestRequest::delete()
        .uri("/api/preview")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = session_cookie(&resp);
    assert_eq!(body_string(resp).await, "Preview mode disabled");

    let mut req = test::TestRequest::get().uri("/en/blog/upcoming-rules");
    if let Some(cleared) = cleared {
        req = req.cookie(cleared);
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn slug_given_as_a_path_redirects_to_that_path() {
    let app = site!();

    let req = test::TestRequest::get()
        .uri("/api/preview?secret=s3cret&slug=/en/blog/license-exchange&locale=en")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/en/blog/license-exchange"
    );
}

#[actix_web::test]
async fn locale_is_taken_from_the_slug_path_when_not_given() {
    let app = site!();

    let req = test::TestRequest::get()
        .uri("/api/preview?secret=s3cret&slug=/vi/blog/doi-bang-lai")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/vi/blog/doi-bang-lai"
    );
    assert!(session_cookie(&resp).is_some());
}

#[actix_web::test]
async fn disable_without_a_session_still_succeeds() {
    let app = site!();

    let resp = test::call_service(&app, test::TestRequest::delete().uri("/api/preview").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "Preview mode disabled");
}

#[actix_web::test]
async fn exit_link_only_redirects_within_the_site() {
    let app = site!();

    let req = test::TestRequest::get()
        .uri("/api/preview/disable?redirect=/vi/blog")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/vi/blog");

    let req = test::TestRequest::get()
        .uri("/api/preview/disable?redirect=//evil.example.com")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
}
