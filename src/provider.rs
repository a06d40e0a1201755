use crate::circuit_breaker::{create_provider_circuit_breaker, ProviderCircuitBreaker};
use crate::errors::{AppError, ResultExt};
use crate::models::{DocumentType, ReportRequest};
use crate::report::ExternalReport;
use failsafe::futures::CircuitBreaker;
use reqwest::multipart::Form;
use std::time::Duration;

const CUIT_REPORT_PATH: &str = "/api/informeApi/obtenerInforme";
const DNI_REPORT_PATH: &str = "/api/informeApi/obtenerInformeDni";

/// Client for the InfoExperto report API.
///
/// Every call goes through a shared circuit breaker; only transport errors and
/// provider 5xx/429 answers count as failures.
#[derive(Clone)]
pub struct InfoExpertoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    breaker: ProviderCircuitBreaker,
}

impl InfoExpertoClient {
    /// Creates a new `InfoExpertoClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Provider base URL, without trailing slash.
    /// * `api_key` - The API key sent with every report request.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create InfoExperto client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            breaker: create_provider_circuit_breaker(),
        })
    }

    /// Fetches the report for a validated request.
    ///
    /// # Returns
    ///
    /// * `Result<ExternalReport, AppError>` - The `data.informe` document.
    pub async fn fetch_report(&self, request: &ReportRequest) -> Result<ExternalReport, AppError> {
        self.breaker
            .call_with(
                |err: &AppError| err.is_upstream_fault(),
                self.request_report(request),
            )
            .await
            .map_err(|e| match e {
                failsafe::Error::Inner(err) => err,
                failsafe::Error::Rejected => {
                    tracing::warn!("InfoExperto circuit open, rejecting report request");
                    AppError::ExternalApiError(
                        "Report provider temporarily unavailable".to_string(),
                    )
                }
            })
    }

    async fn request_report(&self, request: &ReportRequest) -> Result<ExternalReport, AppError> {
        let (path, form) = self.build_form(request);
        let url = format!("{}{}", self.base_url, path);
        tracing::info!(
            "Requesting InfoExperto report ({}) for {}",
            request.document_type.as_str(),
            request.masked_number()
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("InfoExperto request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("InfoExperto returned {}: {}", status, detail);
            return Err(AppError::ProviderError {
                status: status.as_u16(),
                detail,
            });
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse InfoExperto response")?;

        let report = ExternalReport::from_envelope(&envelope).ok_or_else(|| {
            tracing::error!(
                "InfoExperto response without data.informe (status field: {:?})",
                envelope.get("status")
            );
            AppError::InternalError(
                "La respuesta de InfoExperto no contiene data.informe".to_string(),
            )
        })?;

        tracing::info!("✓ InfoExperto report received for {}", request.masked_number());
        Ok(report)
    }

    /// Builds the multipart form the provider expects for each document type.
    fn build_form(&self, request: &ReportRequest) -> (&'static str, Form) {
        let form = Form::new()
            .text("apiKey", self.api_key.clone())
            .text("tipo", "normal");

        match request.document_type {
            DocumentType::Cuit | DocumentType::Cuil => {
                (CUIT_REPORT_PATH, form.text("cuit", request.number.clone()))
            }
            DocumentType::Dni => {
                let sex = request.sex.map(|s| s.as_str()).unwrap_or("M");
                (
                    DNI_REPORT_PATH,
                    form.text("dni", request.number.clone()).text("sexo", sex),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = InfoExpertoClient::new("https://example.com".to_string(), "key".to_string());
        assert!(client.is_ok());
    }
}
