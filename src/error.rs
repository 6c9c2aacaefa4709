use actix_session::SessionInsertError;
use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::content::ContentError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid token")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Content API error: {0}")]
    Upstream(#[from] ContentError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Session error: {0}")]
    Session(#[from] SessionInsertError),
}

fn error_page(status: StatusCode, title: &str, message: &str) -> HttpResponse {
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="vi">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>{title} | IAA Vietnam</title>
<link rel="stylesheet" href="/static/site.css">
</head>
<body>
<main class="error-page">
<h1>{status}</h1>
<h2>{title}</h2>
<p>{message}</p>
<p><a href="/vi">Trang chủ</a> · <a href="/en">Home</a></p>
</main>
</body>
</html>"#,
        status = status.as_u16(),
        title = html_escape::encode_text(title),
        message = html_escape::encode_text(message),
    );
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::Template(_) | AppError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(what) => {
                log::debug!("Not found: {}", what);
                error_page(
                    StatusCode::NOT_FOUND,
                    "Không tìm thấy trang / Page not found",
                    "The page you are looking for does not exist or has been moved.",
                )
            }
            AppError::Unauthorized => HttpResponse::Unauthorized()
                .content_type(ContentType::plaintext())
                .body("Invalid token"),
            AppError::BadRequest(message) => HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(message.clone()),
            AppError::Upstream(err) => {
                log::error!("Content API request failed: {}", err);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Đã xảy ra lỗi / Something went wrong",
                    "The content service is temporarily unavailable. Please try again later.",
                )
            }
            AppError::Template(err) => {
                log::error!("Template rendering failed: {:?}", err);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Đã xảy ra lỗi / Something went wrong",
                    "An internal error occurred. Please try again later.",
                )
            }
            AppError::Session(err) => {
                log::error!("Failed to update session: {}", err);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Đã xảy ra lỗi / Something went wrong",
                    "An internal error occurred. Please try again later.",
                )
            }
        }
    }
}
