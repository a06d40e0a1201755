//! Report normalization.
//!
//! Maps the loosely-structured InfoExperto report (`data.informe`) into the fixed
//! metric set consumed by the scoring engine. Every field goes through a single
//! extraction point that resolves missing or malformed values to a neutral default,
//! so nothing downstream ever has to ask whether a field was present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used when no section of the report carries one.
pub const DEFAULT_FULL_NAME: &str = "Sin nombre";

/// Activity flags under `scoringInforme.actividad` that count as formal activity.
const FORMAL_ACTIVITY_FLAGS: [&str; 4] = ["empleado", "monotributista", "autonomo", "empleador"];

/// Raw report document as returned by the provider.
///
/// The wrapped value is never mutated; all reads go through [`ExternalReport::path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalReport(Value);

impl ExternalReport {
    /// Wraps a report document (the contents of `data.informe`).
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Extracts the report from a provider envelope (`{ data: { informe: {...} } }`).
    ///
    /// Returns `None` when the envelope carries no report object.
    pub fn from_envelope(envelope: &Value) -> Option<Self> {
        envelope
            .get("data")
            .and_then(|data| data.get("informe"))
            .filter(|informe| informe.is_object())
            .map(|informe| Self(informe.clone()))
    }

    /// Accepts either a provider envelope or a bare report object.
    pub fn from_payload(payload: Value) -> Option<Self> {
        if let Some(report) = Self::from_envelope(&payload) {
            return Some(report);
        }
        payload.is_object().then(|| Self(payload))
    }

    /// Borrows the raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Walks a chain of object keys, yielding `None` as soon as a segment is missing.
    pub fn path(&self, segments: &[&str]) -> Option<&Value> {
        segments
            .iter()
            .try_fold(&self.0, |current, segment| current.get(*segment))
    }
}

/// Provider risk rating derived from `scoringInforme.scoring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoarseTier {
    #[serde(rename = "ALTO")]
    High,
    #[serde(rename = "MEDIO")]
    Medium,
    #[serde(rename = "BAJO")]
    Low,
}

impl CoarseTier {
    /// Maps a provider scoring value onto a tier.
    ///
    /// 1–2 is high risk, 3–4 medium, 5 low. A missing or non-numeric value lands on
    /// `Medium` so the case always goes through the decision engine.
    pub fn from_scoring(scoring: Option<f64>) -> Self {
        match scoring {
            Some(value) if value <= 2.0 => CoarseTier::High,
            Some(value) if value <= 4.0 => CoarseTier::Medium,
            Some(_) => CoarseTier::Low,
            None => CoarseTier::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseTier::High => "ALTO",
            CoarseTier::Medium => "MEDIO",
            CoarseTier::Low => "BAJO",
        }
    }
}

impl std::fmt::Display for CoarseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized view of a report. Built once by [`normalize`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalMetrics {
    pub full_name: String,
    pub coarse_tier: CoarseTier,
    /// Provider credit figure.
    pub total_capacity: f64,
    /// Provider debt figure spread over twelve months.
    pub monthly_commitment: f64,
    /// Declared annual tax amount spread over twelve months.
    pub monthly_income_estimate: f64,
    pub formal_activity_months: u32,
    /// Highest (worst) bureau situation in the 24-month history; `None` when there is
    /// no history at all, which is not the same as a clean one.
    pub worst_bureau_status_24m: Option<i64>,
    pub has_formal_activity: bool,
    pub has_registered_vehicles: bool,
    pub has_registered_real_estate: bool,
}

/// Builds the internal metric set. Total over every input shape.
pub fn normalize(report: &ExternalReport) -> InternalMetrics {
    let total_capacity = positive_number(report.path(&["scoringInforme", "credito"])).unwrap_or(0.0);

    let monthly_commitment = positive_number(report.path(&["scoringInforme", "deuda"]))
        .map(|debt| debt / 12.0)
        .unwrap_or(0.0);

    let monthly_income_estimate =
        positive_number(report.path(&["condicionTributaria", "monto_anual"]))
            .map(|annual| annual / 12.0)
            .unwrap_or(0.0);

    let formal_activity_months =
        positive_number(report.path(&["identidad", "anios_inscripcion"]))
            .map(|years| (years * 12.0).floor().min(u32::MAX as f64) as u32)
            .unwrap_or(0);

    InternalMetrics {
        full_name: full_name(report),
        coarse_tier: coarse_tier(report),
        total_capacity,
        monthly_commitment,
        monthly_income_estimate,
        formal_activity_months,
        worst_bureau_status_24m: worst_bureau_status_24m(report),
        has_formal_activity: has_formal_activity(report),
        has_registered_vehicles: non_empty_list(report.path(&["rodados"])),
        has_registered_real_estate: non_empty_list(report.path(&["inmuebles"])),
    }
}

/// Tier derivation on its own; does not look at anything but the scoring value.
pub fn coarse_tier(report: &ExternalReport) -> CoarseTier {
    CoarseTier::from_scoring(finite_number(report.path(&["scoringInforme", "scoring"])))
}

/// Scans every period of `bcra.resumen_historico` for the worst situation code.
///
/// Fractional codes from 1 upwards are rounded up, towards the worse standing.
/// Values below 1 are rounded down so they never pass for a normal situation.
pub fn worst_bureau_status_24m(report: &ExternalReport) -> Option<i64> {
    let history = report.path(&["bcra", "resumen_historico"])?;

    let situation = |entry: &Value| {
        finite_number(entry.get("peor_situacion")).map(|situation| {
            if situation >= 1.0 {
                situation.ceil() as i64
            } else {
                situation.floor() as i64
            }
        })
    };

    match history {
        Value::Object(periods) => periods.values().filter_map(situation).max(),
        Value::Array(periods) => periods.iter().filter_map(situation).max(),
        _ => None,
    }
}

fn full_name(report: &ExternalReport) -> String {
    [
        report.path(&["identidad", "nombre_completo"]),
        report.path(&["soaAfipA4Online", "nombreCompleto"]),
        report.path(&["condicionTributaria", "nombre"]),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|name| !name.is_empty())
    .unwrap_or(DEFAULT_FULL_NAME)
    .to_string()
}

fn has_formal_activity(report: &ExternalReport) -> bool {
    let Some(activity) = report.path(&["scoringInforme", "actividad"]) else {
        return false;
    };

    FORMAL_ACTIVITY_FLAGS
        .iter()
        .any(|flag| is_affirmative(activity.get(*flag)))
}

fn is_affirmative(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(flag)) => {
            let flag = flag.trim().to_uppercase();
            flag == "SI" || flag == "SÍ"
        }
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    }
}

fn non_empty_list(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// Coerces a JSON number or numeric string into a finite `f64`.
pub(crate) fn finite_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn positive_number(value: Option<&Value>) -> Option<f64> {
    finite_number(value).filter(|n| *n > 0.0)
}
