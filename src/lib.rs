use crate::config::Config;
use crate::content::{ContentClient, ImageUrlBuilder};

/// Read-only state shared by every request handler.
pub struct AppState {
    pub content: ContentClient,
    pub images: ImageUrlBuilder,
    pub preview_secret: Option<String>,
    pub studio_url: String,
    pub site_url: String,
}

impl AppState {
    pub fn new(config: &Config, content: ContentClient) -> Self {
        Self {
            content,
            images: ImageUrlBuilder::new(&config.sanity.project_id, &config.sanity.dataset),
            preview_secret: config.sanity.preview_secret.clone(),
            studio_url: config.studio_url.clone(),
            site_url: config.site_url.clone(),
        }
    }
}

pub mod config;
pub mod content;
pub mod error;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
