use crate::assessment::RiskAssessment;
use crate::errors::AppError;
use crate::report::CoarseTier;
use crate::scoring::RiskDecision;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============ Domain Types ============

/// Identity document accepted by the report provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Tax identifier for companies and self-employed persons.
    Cuit,
    /// Labor identifier; same format and endpoint as CUIT.
    Cuil,
    /// National identity card; requires the holder's sex.
    Dni,
}

impl DocumentType {
    /// Case-insensitive parse of the `tipoDocumento` request field.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cuit" => Some(DocumentType::Cuit),
            "cuil" => Some(DocumentType::Cuil),
            "dni" => Some(DocumentType::Dni),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cuit => "cuit",
            DocumentType::Cuil => "cuil",
            DocumentType::Dni => "dni",
        }
    }
}

/// Sex of a DNI holder, as the provider expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

/// Authenticated caller, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub uid: String,
    pub email: Option<String>,
}

impl CallerIdentity {
    /// Identity attached to requests when authentication is disabled.
    pub fn anonymous() -> Self {
        Self {
            uid: "anonymous".to_string(),
            email: None,
        }
    }
}

// ============ API Request/Response Models ============

/// Request body for a report lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// "cuit", "cuil" or "dni".
    pub tipo_documento: Option<String>,
    /// Document number; separators are tolerated.
    pub numero: Option<String>,
    /// "M" or "F"; only used for DNI lookups.
    pub sexo: Option<String>,
}

/// Validated lookup ready to be sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub document_type: DocumentType,
    /// Digits only.
    pub number: String,
    /// Always set for DNI lookups, never for CUIT/CUIL.
    pub sex: Option<Sex>,
}

impl ReportRequest {
    /// Key used for the report cache.
    pub fn cache_key(&self) -> String {
        match self.sex {
            Some(sex) => format!("{}:{}:{}", self.document_type.as_str(), self.number, sex.as_str()),
            None => format!("{}:{}", self.document_type.as_str(), self.number),
        }
    }

    /// Document number for log lines; only the last three digits are kept.
    pub fn masked_number(&self) -> String {
        mask_document_number(&self.number)
    }
}

/// Replaces every character but the last three with `*`.
pub fn mask_document_number(number: &str) -> String {
    let len = number.chars().count();
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 3 < len { '*' } else { c })
        .collect()
}

fn document_number_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{7,11}$").expect("static regex is valid"))
}

impl ReportQuery {
    /// Validates the raw request.
    ///
    /// DNI lookups without a valid sex default to "M", which is what the provider
    /// assumes as well.
    pub fn validate(&self) -> Result<ReportRequest, AppError> {
        let (Some(tipo), Some(numero)) = (
            self.tipo_documento.as_deref().filter(|v| !v.trim().is_empty()),
            self.numero.as_deref().filter(|v| !v.trim().is_empty()),
        ) else {
            return Err(AppError::BadRequest(
                "Campos requeridos: tipoDocumento y numero".to_string(),
            ));
        };

        let document_type = DocumentType::parse(tipo).ok_or_else(|| {
            AppError::BadRequest("tipoDocumento debe ser 'cuit', 'cuil' o 'dni'".to_string())
        })?;

        let number: String = numero
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .collect();
        if !document_number_regex().is_match(&number) {
            return Err(AppError::BadRequest(
                "numero debe tener entre 7 y 11 dígitos".to_string(),
            ));
        }

        let sex = match document_type {
            DocumentType::Dni => Some(match self.sexo.as_deref().map(str::trim) {
                Some("F") | Some("f") => Sex::F,
                _ => Sex::M,
            }),
            DocumentType::Cuit | DocumentType::Cuil => None,
        };

        Ok(ReportRequest {
            document_type,
            number,
            sex,
        })
    }
}

/// Response of the report lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub full_name: String,
    /// Number as the provider was queried with it.
    pub numero: String,
    pub tipo_documento: DocumentType,
    pub coarse_tier: CoarseTier,
    pub decision: Option<RiskDecision>,
}

impl ReportResponse {
    pub fn new(request: &ReportRequest, assessment: RiskAssessment) -> Self {
        Self {
            full_name: assessment.full_name,
            numero: request.number.clone(),
            tipo_documento: request.document_type,
            coarse_tier: assessment.coarse_tier,
            decision: assessment.decision,
        }
    }
}
