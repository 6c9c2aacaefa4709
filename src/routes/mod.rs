use actix_web::{http::header, http::header::ContentType, web, HttpResponse};

pub mod blog;
pub mod pages;
pub mod preview;
pub mod public;

pub(crate) fn html_page(body: String, cache_control: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header((header::CACHE_CONTROL, cache_control))
        .body(body)
}

/// Registers every route. Fixed paths come first so the `{locale}` patterns never shadow them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(public::health))
            .route("/preview", web::get().to(preview::enable_preview))
            .route("/preview", web::delete().to(preview::disable_preview))
            .route("/preview/disable", web::get().to(preview::exit_preview))
            .route("/studio", web::get().to(public::studio_redirect))
            .route("/studio/{tail:.*}", web::get().to(public::studio_redirect)),
    )
    .route("/studio", web::get().to(public::studio_redirect))
    .route("/studio/{tail:.*}", web::get().to(public::studio_redirect))
    .route("/sitemap.xml", web::get().to(public::sitemap))
    .route("/{locale}", web::get().to(pages::home))
    .route("/{locale}/blog", web::get().to(blog::blog_index))
    .route("/{locale}/blog/{slug}", web::get().to(blog::blog_post))
    .route(
        &format!("/{{locale}}/{}", pages::EXPERIENCE_PATH),
        web::get().to(pages::experience),
    )
    .route("/{locale}/{page}", web::get().to(pages::static_page));
}
