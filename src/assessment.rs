//! End-to-end evaluation of one report: normalize, then decide when the tier is
//! ambiguous.

use crate::report::{normalize, CoarseTier, ExternalReport, InternalMetrics};
use crate::scoring::{RiskDecision, RiskDecisionEngine};
use serde::{Deserialize, Serialize};

/// Output document of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub full_name: String,
    pub coarse_tier: CoarseTier,
    /// Present only for the `MEDIO` tier.
    pub decision: Option<RiskDecision>,
}

impl RiskAssessment {
    /// Builds the assessment from already-normalized metrics.
    pub fn from_metrics(metrics: &InternalMetrics, engine: &RiskDecisionEngine) -> Self {
        let decision = match metrics.coarse_tier {
            CoarseTier::Medium => Some(engine.decide(metrics)),
            CoarseTier::High | CoarseTier::Low => None,
        };

        Self {
            full_name: metrics.full_name.clone(),
            coarse_tier: metrics.coarse_tier,
            decision,
        }
    }
}

/// Runs the standard pipeline over a report.
pub fn assess(report: &ExternalReport) -> RiskAssessment {
    let metrics = normalize(report);
    RiskAssessment::from_metrics(&metrics, &RiskDecisionEngine::standard())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DecisionStatus;
    use serde_json::json;

    #[test]
    fn test_empty_report_goes_to_decision() {
        let assessment = assess(&ExternalReport::new(json!({})));

        assert_eq!(assessment.coarse_tier, CoarseTier::Medium);
        let decision = assessment.decision.expect("medium tier must be decided");
        assert_eq!(decision.score, 20);
        assert_eq!(decision.status, DecisionStatus::Rejected);
    }

    #[test]
    fn test_high_and_low_tiers_skip_decision() {
        for (scoring, tier) in [(1, CoarseTier::High), (5, CoarseTier::Low)] {
            let assessment = assess(&ExternalReport::new(json!({
                "scoringInforme": { "scoring": scoring, "deuda": 999999 }
            })));
            assert_eq!(assessment.coarse_tier, tier);
            assert!(assessment.decision.is_none());
        }
    }

    #[test]
    fn test_wire_format() {
        let assessment = assess(&ExternalReport::new(json!({
            "identidad": { "nombre_completo": "PEREZ JUAN" },
            "scoringInforme": { "scoring": 1 }
        })));

        let wire = serde_json::to_value(&assessment).unwrap();
        assert_eq!(
            wire,
            json!({ "fullName": "PEREZ JUAN", "coarseTier": "ALTO", "decision": null })
        );
    }

    #[test]
    fn test_unknown_tier_is_a_contract_violation() {
        let parsed = serde_json::from_value::<RiskAssessment>(json!({
            "fullName": "X", "coarseTier": "EXTREMO", "decision": null
        }));
        assert!(parsed.is_err());
    }
}
