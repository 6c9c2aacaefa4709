use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SanityConfig;

pub mod fixture;
pub mod http_client;
pub mod image_url;
pub mod queries;

pub use fixture::FixtureDataset;
pub use http_client::HttpContentClient;
pub use image_url::ImageUrlBuilder;
pub use queries::CatalogQuery;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Content API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Fixture I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed fixture document on line {line}: {source}")]
    Fixture {
        line: usize,
        source: serde_json::Error,
    },
}

/// Which revision of each document a read sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Perspective {
    /// Only published documents. Cacheable.
    #[default]
    Published,
    /// Drafts overlaid on published documents. Always fetched fresh.
    Drafts,
}

impl Perspective {
    pub fn as_str(self) -> &'static str {
        match self {
            Perspective::Published => "published",
            Perspective::Drafts => "drafts",
        }
    }

    pub fn for_draft_mode(draft_mode: bool) -> Self {
        if draft_mode {
            Perspective::Drafts
        } else {
            Perspective::Published
        }
    }
}

/// Handle for running catalog queries, either against the hosted API or a local export.
#[derive(Debug, Clone)]
pub enum ContentClient {
    Http(HttpContentClient),
    Fixture(Arc<FixtureDataset>),
}

impl ContentClient {
    pub fn from_config(config: &SanityConfig) -> Result<Self, ContentError> {
        match &config.fixture_path {
            Some(path) => {
                log::warn!(
                    "CONTENT_FIXTURE_PATH is set. Serving content from '{}' instead of the content API.",
                    path
                );
                Ok(Self::from_fixture(FixtureDataset::load(Path::new(path))?))
            }
            None => Ok(ContentClient::Http(HttpContentClient::new(config)?)),
        }
    }

    pub fn from_fixture(dataset: FixtureDataset) -> Self {
        ContentClient::Fixture(Arc::new(dataset))
    }

    /// Runs `query` and returns the raw JSON result (`null` when a single-document query misses).
    pub async fn fetch(
        &self,
        query: &CatalogQuery,
        perspective: Perspective,
    ) -> Result<Value, ContentError> {
        match self {
            ContentClient::Http(client) => client.fetch(query, perspective).await,
            ContentClient::Fixture(dataset) => {
                log::debug!(
                    "Running content query '{}' ({}) against fixture",
                    query.name(),
                    perspective.as_str()
                );
                Ok(dataset.execute(query, perspective))
            }
        }
    }
}
