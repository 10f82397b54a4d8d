//! Configuration types.
//!
//! Everything is read from the process environment exactly once, in `main`,
//! and handed to components as plain values.

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SHEET_TAB: &str = "Leads";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds on 0.0.0.0.
    pub port: u16,
    /// Maximum accepted request body (base64 images inflate payloads).
    pub max_body_bytes: usize,
    pub llm: LlmSettings,
    pub leads: LeadSinkConfig,
}

/// Completion service settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: SecretString,
    /// Model used when a request carries no override.
    pub model: String,
    pub base_url: String,
}

/// Where finished leads go.
#[derive(Debug, Clone)]
pub enum LeadSinkConfig {
    /// Upload photos to Drive and append rows to a Sheet directly.
    Google(GoogleConfig),
    /// Forward submissions to an external automation endpoint.
    Webhook { url: String },
    /// Nothing configured; submissions fail with the recorded error.
    Unconfigured { missing: String },
}

/// Google service account and target identifiers.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub service_account_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: SecretString,
    pub drive_folder_id: String,
    pub sheet_id: String,
    pub sheet_tab: String,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// Fails when the completion service credential is absent. Missing lead
    /// storage settings are not fatal here; they surface on each submission.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let llm = LlmSettings {
            api_key: SecretString::from(api_key),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };

        let max_body_bytes = get("MAX_BODY_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let leads = if let Some(url) = get("LEAD_WEBHOOK_URL") {
            LeadSinkConfig::Webhook { url }
        } else {
            google_config(&get)
        };

        Ok(Self {
            port,
            max_body_bytes,
            llm,
            leads,
        })
    }
}

fn google_config<F>(get: &F) -> LeadSinkConfig
where
    F: Fn(&str) -> Option<String>,
{
    let required = [
        "GOOGLE_SA_EMAIL",
        "GOOGLE_SA_KEY",
        "DRIVE_FOLDER_ID",
        "SHEET_ID",
    ];
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|&key| get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return LeadSinkConfig::Unconfigured {
            missing: missing.join(", "),
        };
    }

    LeadSinkConfig::Google(GoogleConfig {
        service_account_email: get("GOOGLE_SA_EMAIL").unwrap_or_default(),
        // Keys pasted into env files usually carry escaped newlines.
        private_key: SecretString::from(
            get("GOOGLE_SA_KEY").unwrap_or_default().replace("\\n", "\n"),
        ),
        drive_folder_id: get("DRIVE_FOLDER_ID").unwrap_or_default(),
        sheet_id: get("SHEET_ID").unwrap_or_default(),
        sheet_tab: get("SHEET_TAB").unwrap_or_else(|| DEFAULT_SHEET_TAB.to_string()),
    })
}
