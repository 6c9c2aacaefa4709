use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::queries::CatalogQuery;
use super::{ContentError, Perspective};
use crate::config::SanityConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// API versions older than this name the drafts perspective `previewDrafts`.
const DRAFTS_PERSPECTIVE_SINCE: &str = "2025-02-19";

/// Successful query responses wrap the data in `result`.
#[derive(Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    result: Value,
}

/// The API reports failures either as `{ "error": { "description": .. } }` or as a flat message.
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorEnvelope {
    fn describe(self) -> Option<String> {
        let from_error = match self.error {
            Some(Value::Object(obj)) => obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        from_error.or(self.message)
    }
}

/// Client for the hosted query endpoint.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    client: Client,
    project_id: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
    use_cdn: bool,
}

impl HttpContentClient {
    pub fn new(config: &SanityConfig) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("iaa_web/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.clone(),
            token: config.read_token.clone(),
            use_cdn: config.use_cdn,
        })
    }

    /// Published reads may be served from the CDN; draft reads always hit the live API.
    fn host(&self, perspective: Perspective) -> String {
        let api = if self.use_cdn && perspective == Perspective::Published {
            "apicdn"
        } else {
            "api"
        };
        format!("https://{}.{}.sanity.io", self.project_id, api)
    }

    /// Value of the `perspective` parameter for this client's API version.
    fn perspective_param(&self, perspective: Perspective) -> &'static str {
        match perspective {
            Perspective::Drafts if self.api_version.as_str() < DRAFTS_PERSPECTIVE_SINCE => {
                "previewDrafts"
            }
            other => other.as_str(),
        }
    }

    pub fn query_url(
        &self,
        query: &CatalogQuery,
        perspective: Perspective,
    ) -> Result<Url, ContentError> {
        let mut url = Url::parse(&format!(
            "{}/v{}/data/query/{}",
            self.host(perspective),
            self.api_version,
            self.dataset
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &query.groq());
            for (name, value) in query.params() {
                pairs.append_pair(&format!("${}", name), &serde_json::to_string(&value)?);
            }
            pairs.append_pair("perspective", self.perspective_param(perspective));
        }
        Ok(url)
    }

    pub async fn fetch(
        &self,
        query: &CatalogQuery,
        perspective: Perspective,
    ) -> Result<Value, ContentError> {
        let url = self.query_url(query, perspective)?;
        log::debug!(
            "Running content query '{}' ({}) against {}",
            query.name(),
            perspective.as_str(),
            url.host_str().unwrap_or_default()
        );

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &bytes));
        }

        let envelope: QueryEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.result)
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> ContentError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(ErrorEnvelope::describe)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
    ContentError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Locale;

    fn sanity_config(use_cdn: bool) -> SanityConfig {
        versioned_config("2025-02-19", use_cdn)
    }

    fn versioned_config(api_version: &str, use_cdn: bool) -> SanityConfig {
        SanityConfig {
            project_id: "vki2acig".into(),
            dataset: "production".into(),
            api_version: api_version.into(),
            read_token: Some("token".into()),
            preview_secret: None,
            use_cdn,
            fixture_path: None,
        }
    }

    #[test]
    fn published_reads_use_cdn_when_enabled() {
        let client = HttpContentClient::new(&sanity_config(true)).unwrap();
        let url = client
            .query_url(&CatalogQuery::AllCategories, Perspective::Published)
            .unwrap();
        assert_eq!(url.host_str(), Some("vki2acig.apicdn.sanity.io"));
        assert_eq!(url.path(), "/v2025-02-19/data/query/production");
    }

    #[test]
    fn draft_reads_bypass_cdn() {
        let client = HttpContentClient::new(&sanity_config(true)).unwrap();
        let url = client
            .query_url(&CatalogQuery::AllCategories, Perspective::Drafts)
            .unwrap();
        assert_eq!(url.host_str(), Some("vki2acig.api.sanity.io"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "perspective" && v == "drafts"));
    }

    #[test]
    fn older_api_versions_name_the_drafts_perspective_differently() {
        let perspective_of = |api_version: &str, perspective: Perspective| {
            let client = HttpContentClient::new(&versioned_config(api_version, false)).unwrap();
            let url = client.query_url(&CatalogQuery::AllCategories, perspective).unwrap();
            url.query_pairs()
                .find(|(k, _)| k == "perspective")
                .map(|(_, v)| v.into_owned())
        };

        assert_eq!(perspective_of("2024-06-01", Perspective::Drafts).as_deref(), Some("previewDrafts"));
        assert_eq!(perspective_of("2024-06-01", Perspective::Published).as_deref(), Some("published"));
        assert_eq!(perspective_of("2025-02-19", Perspective::Drafts).as_deref(), Some("drafts"));
        assert_eq!(perspective_of("2025-06-01", Perspective::Drafts).as_deref(), Some("drafts"));
    }

    #[test]
    fn parameters_are_json_encoded() {
        let client = HttpContentClient::new(&sanity_config(false)).unwrap();
        let query = CatalogQuery::PostBySlug {
            slug: "doi-bang".into(),
            locale: Locale::En,
        };
        let url = client.query_url(&query, Perspective::Published).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("$slug".to_string(), "\"doi-bang\"".to_string())));
        assert!(pairs.contains(&("$locale".to_string(), "\"en\"".to_string())));
        assert_eq!(url.host_str(), Some("vki2acig.api.sanity.io"));
    }

    #[test]
    fn api_errors_carry_description() {
        let body = br#"{"error":{"description":"expected ']'","type":"queryParseError"}}"#;
        match api_error(StatusCode::BAD_REQUEST, body) {
            ContentError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "expected ']'");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match api_error(StatusCode::BAD_GATEWAY, b"<html>") {
            ContentError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
