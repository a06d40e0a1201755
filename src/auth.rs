//! Caller authentication.
//!
//! The browser client signs in with the identity provider and sends the resulting ID
//! token as `Authorization: Bearer <token>`. The token is checked against the
//! provider's `accounts:lookup` endpoint, which answers with the account it belongs
//! to or rejects it when invalid or expired.

use crate::errors::AppError;
use crate::models::CallerIdentity;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for the identity provider's token lookup.
#[derive(Clone)]
pub struct IdentityVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
}

impl IdentityVerifier {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create identity client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Resolves an ID token to the caller it was issued for.
    pub async fn verify(&self, id_token: &str) -> Result<CallerIdentity, AppError> {
        // Build URL with proper parameter encoding; the key is never logged
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v1/accounts:lookup", self.base_url),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build identity URL: {}", e)))?;

        let response = self
            .client
            .post(url)
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Identity lookup failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AppError::ExternalApiError(format!(
                "Identity provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            tracing::debug!("Identity provider rejected token with {}", status);
            return Err(AppError::Unauthorized(
                "Token inválido o expirado.".to_string(),
            ));
        }

        let lookup: LookupResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse identity response: {}", e))
        })?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|user| CallerIdentity {
                uid: user.local_id,
                email: user.email,
            })
            .ok_or_else(|| AppError::Unauthorized("Token inválido o expirado.".to_string()))
    }
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("No se encontró token de autenticación.".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer eyJhbGciOi"));
        assert_eq!(bearer_token(&headers).unwrap(), "eyJhbGciOi");
    }
}
