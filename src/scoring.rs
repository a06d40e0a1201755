//! Risk decision engine for the ambiguous (`MEDIO`) tier.
//!
//! The engine folds an ordered list of independent [`ScoringRule`]s over the
//! normalized metrics. Each rule contributes one score delta and exactly one reason,
//! so every decision carries a full explanation regardless of which data was missing.
//! Weights and thresholds are policy constants; changing them is a policy revision.

use crate::report::InternalMetrics;
use serde::{Deserialize, Serialize};

/// Starting point for every evaluation, the center of the 0–100 range.
pub const BASE_SCORE: i32 = 50;
/// Minimum final score for automatic approval.
pub const APPROVAL_THRESHOLD: u8 = 70;
/// Minimum final score for manual review; anything below is rejected.
pub const REVIEW_THRESHOLD: u8 = 55;

const MIN_SCORE: i32 = 0;
const MAX_SCORE: i32 = 100;

/// Final three-way outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionStatus {
    #[serde(rename = "APROBADO")]
    Approved,
    #[serde(rename = "REVISION")]
    ManualReview,
    #[serde(rename = "RECHAZADO")]
    Rejected,
}

impl DecisionStatus {
    pub fn from_score(score: u8) -> Self {
        if score >= APPROVAL_THRESHOLD {
            DecisionStatus::Approved
        } else if score >= REVIEW_THRESHOLD {
            DecisionStatus::ManualReview
        } else {
            DecisionStatus::Rejected
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Approved => "APROBADO",
            DecisionStatus::ManualReview => "REVISION",
            DecisionStatus::Rejected => "RECHAZADO",
        }
    }
}

/// Inputs the rules actually looked at, including the derived ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetrics {
    pub usage: Option<f64>,
    pub dti: Option<f64>,
    pub worst_bureau_status_24m: Option<i64>,
    pub has_formal_activity: bool,
    pub formal_activity_months: u32,
    pub has_registered_vehicles: bool,
    pub has_registered_real_estate: bool,
}

impl DecisionMetrics {
    fn snapshot(metrics: &InternalMetrics) -> Self {
        Self {
            usage: capacity_usage(metrics),
            dti: debt_to_income(metrics),
            worst_bureau_status_24m: metrics.worst_bureau_status_24m,
            has_formal_activity: metrics.has_formal_activity,
            formal_activity_months: metrics.formal_activity_months,
            has_registered_vehicles: metrics.has_registered_vehicles,
            has_registered_real_estate: metrics.has_registered_real_estate,
        }
    }
}

/// Engine output: bounded score, status and the ordered explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub score: u8,
    pub status: DecisionStatus,
    pub reasons: Vec<String>,
    pub metrics: DecisionMetrics,
}

/// Contribution of a single rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub rule: &'static str,
    pub delta: i32,
    pub reason: String,
}

/// One scoring dimension. Must be total over its input.
pub trait ScoringRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the score delta and the reason explaining it.
    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String);
}

/// Monthly commitment over total credit capacity, when capacity is known.
pub fn capacity_usage(metrics: &InternalMetrics) -> Option<f64> {
    (metrics.total_capacity > 0.0).then(|| metrics.monthly_commitment / metrics.total_capacity)
}

/// Monthly commitment over estimated monthly income, when income is known.
pub fn debt_to_income(metrics: &InternalMetrics) -> Option<f64> {
    (metrics.monthly_income_estimate > 0.0)
        .then(|| metrics.monthly_commitment / metrics.monthly_income_estimate)
}

/// Renders a ratio as a percentage with one decimal (0.327 -> "32.7%").
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Worst BCRA situation over the last 24 months.
pub struct BureauHistoryRule;

impl ScoringRule for BureauHistoryRule {
    fn name(&self) -> &'static str {
        "bureau_history"
    }

    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String) {
        match metrics.worst_bureau_status_24m {
            Some(status) if status >= 3 => (
                -30,
                format!(
                    "Registro de situación BCRA {} (3 o superior) en los últimos 24 meses.",
                    status
                ),
            ),
            Some(2) => (5, "Alguna situación 2 regularizada en BCRA.".to_string()),
            Some(1) => (
                15,
                "Historial BCRA en situación 1 (normal) últimos 24 meses.".to_string(),
            ),
            // Codes start at 1; anything lower is not a BCRA situation
            Some(status) => (
                0,
                format!("Situación BCRA {} no reconocida (neutro).", status),
            ),
            None => (
                0,
                "Sin información clara de situación BCRA (neutro).".to_string(),
            ),
        }
    }
}

/// Registered formal activity and its tenure.
pub struct FormalActivityRule;

impl ScoringRule for FormalActivityRule {
    fn name(&self) -> &'static str {
        "formal_activity"
    }

    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String) {
        if !metrics.has_formal_activity {
            return (
                -30,
                "No se detecta actividad formal registrable.".to_string(),
            );
        }

        let months = metrics.formal_activity_months;
        match months {
            36.. => (
                15,
                format!("Actividad formal con antigüedad ≥ 36 meses ({} meses).", months),
            ),
            12..=35 => (
                5,
                format!(
                    "Actividad formal con antigüedad entre 12 y 36 meses ({} meses).",
                    months
                ),
            ),
            _ => (
                0,
                format!("Actividad formal con antigüedad < 12 meses ({} meses).", months),
            ),
        }
    }
}

/// Share of the credit capacity taken by the monthly commitment.
pub struct CapacityUsageRule;

impl ScoringRule for CapacityUsageRule {
    fn name(&self) -> &'static str {
        "capacity_usage"
    }

    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String) {
        match capacity_usage(metrics) {
            Some(usage) if usage <= 0.30 => (
                15,
                format!("Uso de capacidad crediticia bajo ({}).", format_percent(usage)),
            ),
            Some(usage) if usage <= 0.50 => (
                5,
                format!("Uso de capacidad crediticia moderado ({}).", format_percent(usage)),
            ),
            Some(usage) if usage <= 0.80 => (
                -10,
                format!("Uso de capacidad crediticia alto ({}).", format_percent(usage)),
            ),
            Some(usage) => (
                -20,
                format!("Uso de capacidad crediticia crítico ({}).", format_percent(usage)),
            ),
            None if metrics.monthly_commitment > 0.0 => (
                -25,
                "Compromiso mensual con capacidad crediticia total nula o no informada."
                    .to_string(),
            ),
            None => (
                0,
                "Sin deudas registradas y sin capacidad informada (neutro).".to_string(),
            ),
        }
    }
}

/// Monthly commitment against estimated monthly income.
pub struct DebtToIncomeRule;

impl ScoringRule for DebtToIncomeRule {
    fn name(&self) -> &'static str {
        "debt_to_income"
    }

    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String) {
        let Some(dti) = debt_to_income(metrics) else {
            return (
                0,
                "Sin información de ingresos estimados (neutro).".to_string(),
            );
        };

        let (delta, label) = if dti <= 0.30 {
            (15, "cómoda")
        } else if dti <= 0.40 {
            (5, "moderada")
        } else if dti <= 0.50 {
            (-10, "elevada")
        } else {
            (-20, "crítica")
        };

        (
            delta,
            format!(
                "Relación cuota/ingreso {} ({} del ingreso).",
                label,
                format_percent(dti)
            ),
        )
    }
}

/// Vehicles and real estate registered to the subject. Bonuses stack.
pub struct RegisteredAssetsRule;

impl ScoringRule for RegisteredAssetsRule {
    fn name(&self) -> &'static str {
        "registered_assets"
    }

    fn evaluate(&self, metrics: &InternalMetrics) -> (i32, String) {
        match (
            metrics.has_registered_vehicles,
            metrics.has_registered_real_estate,
        ) {
            (true, true) => (
                15,
                "Posee vehículos e inmuebles/domicilios registrados a su nombre.".to_string(),
            ),
            (true, false) => (5, "Posee vehículos registrados a su nombre.".to_string()),
            (false, true) => (
                10,
                "Posee inmuebles/domicilios registrados a su nombre.".to_string(),
            ),
            (false, false) => (
                0,
                "No se detectan vehículos ni inmuebles registrados (neutro).".to_string(),
            ),
        }
    }
}

/// Stateless evaluator folding an ordered rule list into a decision.
pub struct RiskDecisionEngine {
    rules: Vec<Box<dyn ScoringRule>>,
}

impl RiskDecisionEngine {
    pub fn new(rules: Vec<Box<dyn ScoringRule>>) -> Self {
        Self { rules }
    }

    /// The five policy dimensions, in evaluation order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BureauHistoryRule),
            Box::new(FormalActivityRule),
            Box::new(CapacityUsageRule),
            Box::new(DebtToIncomeRule),
            Box::new(RegisteredAssetsRule),
        ])
    }

    /// Runs every rule in order without folding.
    pub fn evaluate_rules(&self, metrics: &InternalMetrics) -> Vec<RuleOutcome> {
        self.rules
            .iter()
            .map(|rule| {
                let (delta, reason) = rule.evaluate(metrics);
                RuleOutcome {
                    rule: rule.name(),
                    delta,
                    reason,
                }
            })
            .collect()
    }

    pub fn decide(&self, metrics: &InternalMetrics) -> RiskDecision {
        let outcomes = self.evaluate_rules(metrics);

        // Clamped once at the end; intermediate totals may leave the range.
        let raw_score = outcomes
            .iter()
            .fold(BASE_SCORE, |total, outcome| total + outcome.delta);
        let score = raw_score.clamp(MIN_SCORE, MAX_SCORE) as u8;
        let status = DecisionStatus::from_score(score);

        tracing::debug!(
            raw_score,
            score,
            status = status.as_str(),
            "Risk decision computed"
        );

        RiskDecision {
            score,
            status,
            reasons: outcomes.into_iter().map(|outcome| outcome.reason).collect(),
            metrics: DecisionMetrics::snapshot(metrics),
        }
    }
}

impl Default for RiskDecisionEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Evaluates metrics with the standard rule set.
pub fn decide(metrics: &InternalMetrics) -> RiskDecision {
    RiskDecisionEngine::standard().decide(metrics)
}
