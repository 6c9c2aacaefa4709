use actix_web::cookie::Key;
use serde::Deserialize;
use std::env;
use std::path::Path;

const DEFAULT_API_VERSION: &str = "2025-02-19";

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for the hosted content API.
#[derive(Debug, Deserialize, Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub read_token: Option<String>,
    pub preview_secret: Option<String>,
    pub use_cdn: bool,
    /// When set, queries are answered from this NDJSON export instead of the network.
    pub fixture_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub sanity: SanityConfig,
    pub session_secret_key: String,
    pub studio_url: String,
    /// Public origin of the site, without a trailing slash.
    pub site_url: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub use_secure_cookies: bool,
    pub templates_glob: String,
    pub static_dir: String,
}

fn required(name: &str) -> Result<String, config::ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            name
        ))),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    match optional(name).map(|v| v.to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}

impl Config {
    /// Loads the given `.env` file into the process environment, then reads the configuration.
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        Self::from_process_env()
    }

    /// Reads the configuration from variables already present in the process environment.
    pub fn from_process_env() -> Result<Self, config::ConfigError> {
        let project_id = required("SANITY_PROJECT_ID")?;
        if !project_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(config::ConfigError::Message(format!(
                "FATAL: 'SANITY_PROJECT_ID' may only contain lowercase letters, digits and hyphens (got '{}').",
                project_id
            )));
        }

        let dataset = required("SANITY_DATASET")?;
        if dataset.len() > 64
            || !dataset
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(config::ConfigError::Message(format!(
                "FATAL: 'SANITY_DATASET' must be at most 64 lowercase letters, digits, hyphens or underscores (got '{}').",
                dataset
            )));
        }

        let session_secret_key = required("SESSION_SECRET_KEY")?;
        if session_secret_key.len() != 128
            || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes)."
                    .to_string(),
            ));
        }

        let read_token = optional("SANITY_API_READ_TOKEN");
        let preview_secret = optional("SANITY_PREVIEW_SECRET");

        let studio_url = optional("STUDIO_URL")
            .unwrap_or_else(|| format!("https://{}.sanity.studio", project_id));

        let builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8080)?
            // Non-secret overrides for host/port live in an optional TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml).required(false))
            .set_override("sanity.project_id", project_id)?
            .set_override("sanity.dataset", dataset)?
            .set_override(
                "sanity.api_version",
                optional("SANITY_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            )?
            .set_override_option("sanity.read_token", read_token)?
            .set_override_option("sanity.preview_secret", preview_secret)?
            .set_override("sanity.use_cdn", flag("SANITY_USE_CDN", true))?
            .set_override_option("sanity.fixture_path", optional("CONTENT_FIXTURE_PATH"))?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("studio_url", studio_url)?
            .set_override(
                "site_url",
                optional("SITE_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            )?
            .set_override("allowed_origins", optional("ALLOWED_ORIGINS").unwrap_or_default())?
            .set_override("log_level", optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()))?
            .set_override("use_secure_cookies", flag("USE_SECURE_COOKIES", false))?
            .set_override(
                "templates_glob",
                optional("TEMPLATES_GLOB").unwrap_or_else(|| "templates/**/*.html".to_string()),
            )?
            .set_override(
                "static_dir",
                optional("STATIC_DIR").unwrap_or_else(|| "./static".to_string()),
            )?
            .build()?;

        builder.try_deserialize()
    }

    /// Non-fatal gaps in the configuration. Logged by the binaries once logging is up.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.sanity.read_token.is_none() {
            warnings.push("SANITY_API_READ_TOKEN is not set. Draft content will not be readable in preview mode.");
        }
        if self.sanity.preview_secret.is_none() {
            warnings.push("SANITY_PREVIEW_SECRET is not set. Every preview request will be rejected.");
        }
        warnings
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }

    /// Signing key for the session cookie that carries the draft-mode flag.
    pub fn session_key(&self) -> Result<Key, config::ConfigError> {
        let bytes = hex::decode(&self.session_secret_key).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: SESSION_SECRET_KEY is not a valid hex string: {}",
                e
            ))
        })?;
        Key::try_from(bytes.as_slice()).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: SESSION_SECRET_KEY is too short for a signing key: {}",
                e
            ))
        })
    }
}
