use actix_web::{http::header, http::header::ContentType, web, HttpRequest, HttpResponse, Responder};

use crate::error::AppError;
use crate::helper::page_helpers::STATIC_CACHE_CONTROL;
use crate::helper::public_helpers;
use crate::routes::pages;
use crate::AppState;

pub async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("OK")
}

/// `/studio/...` and `/api/studio/...` open the hosted CMS admin UI.
pub async fn studio_redirect(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let base = state.studio_url.trim_end_matches('/');
    let target = match req.match_info().get("tail").filter(|t| !t.is_empty()) {
        Some(tail) => format!("{}/{}", base, tail),
        None => base.to_string(),
    };
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, target))
        .finish()
}

fn sitemap_xml(site_url: &str, paths: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for path in paths {
        xml.push_str("  <url><loc>");
        xml.push_str(&html_escape::encode_text(&format!("{}{}", site_url, path)));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn sitemap(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let slugs = public_helpers::fetch_all_post_slugs(&state.content).await?;
    let paths = pages::static_paths(&slugs);
    log::debug!("Sitemap lists {} paths", paths.len());

    Ok(HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .insert_header((header::CACHE_CONTROL, STATIC_CACHE_CONTROL))
        .body(sitemap_xml(&state.site_url, &paths)))
}
