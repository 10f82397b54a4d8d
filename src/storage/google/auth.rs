//! Service-account OAuth: sign a JWT assertion, trade it for an access token.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{parse_json, send_checked};
use crate::error::StorageError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str =
    "https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/spreadsheets";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Bearer token for Drive and Sheets calls.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google service account credentials.
#[derive(Clone)]
pub struct ServiceAccount {
    email: String,
    private_key: SecretString,
}

impl ServiceAccount {
    pub fn new(email: String, private_key: SecretString) -> Self {
        Self { email, private_key }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Signed RS256 assertion for the token endpoint.
    pub fn assertion(&self, issued_at: i64) -> Result<String, StorageError> {
        let claims = Claims {
            iss: &self.email,
            scope: SCOPES,
            aud: TOKEN_URL,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|e| StorageError::AuthFailed {
                service: "google".to_string(),
                reason: format!("Invalid service account key: {e}"),
            })?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
            StorageError::AuthFailed {
                service: "google".to_string(),
                reason: format!("Failed to sign assertion: {e}"),
            }
        })
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<AccessToken, StorageError> {
        let assertion = self.assertion(Utc::now().timestamp())?;
        let request = client.post(TOKEN_URL).form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ]);

        let body = send_checked(request, "token exchange")
            .await
            .map_err(|e| StorageError::AuthFailed {
                service: "google".to_string(),
                reason: e.to_string(),
            })?;
        let token: TokenResponse = parse_json(&body, "token exchange")?;
        Ok(AccessToken::new(token.access_token))
    }
}
