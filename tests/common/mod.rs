#![allow(dead_code)]

use iaa_web::config::SanityConfig;
use iaa_web::content::{ContentClient, FixtureDataset, HttpContentClient, ImageUrlBuilder};
use iaa_web::AppState;
use std::path::Path;
use tera::Tera;

pub const PREVIEW_SECRET: &str = "s3cret";
pub const STUDIO_URL: &str = "https://studio.example.com";
pub const SITE_URL: &str = "https://iaa.test";

pub fn templates() -> Tera {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).unwrap()
}

pub fn fixture_client() -> ContentClient {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/content.ndjson");
    ContentClient::from_fixture(FixtureDataset::load(&path).unwrap())
}

/// A client whose every query fails before touching the network (the host is not a valid URL).
pub fn failing_client() -> ContentClient {
    let config = SanityConfig {
        project_id: "not a host".into(),
        dataset: "production".into(),
        api_version: "2025-02-19".into(),
        read_token: None,
        preview_secret: None,
        use_cdn: true,
        fixture_path: None,
    };
    ContentClient::Http(HttpContentClient::new(&config).unwrap())
}

pub fn state_with(content: ContentClient) -> AppState {
    AppState {
        content,
        images: ImageUrlBuilder::new("testproj", "production"),
        preview_secret: Some(PREVIEW_SECRET.to_string()),
        studio_url: STUDIO_URL.to_string(),
        site_url: SITE_URL.to_string(),
    }
}

/// Builds the site the way `iaa_server` wires it, minus logging, CORS and static files.
macro_rules! site {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(iaa_web::middleware::draft_session(
                    actix_web::cookie::Key::from(&[7u8; 64]),
                    false,
                ))
                .wrap(iaa_web::middleware::LocaleRedirect)
                .app_data(actix_web::web::Data::new($state))
                .app_data(actix_web::web::Data::new($crate::common::templates()))
                .configure(iaa_web::routes::configure),
        )
        .await
    };
    () => {
        site!($crate::common::state_with($crate::common::fixture_client()))
    };
}

pub async fn body_string<B: actix_web::body::MessageBody>(
    resp: actix_web::dev::ServiceResponse<B>,
) -> String {
    let bytes = actix_web::test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}
