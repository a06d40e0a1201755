/// End-to-end scenarios for the normalize + decide pipeline.
/// Reports are written in the provider's own shape so the field mapping is exercised too.
use credit_risk_api::assessment::assess;
use credit_risk_api::report::{normalize, CoarseTier, ExternalReport};
use credit_risk_api::scoring::DecisionStatus;
use serde_json::{json, Value};

fn fixture() -> Value {
    serde_json::from_str(include_str!("fixtures/informe_medio.json")).unwrap()
}

fn report(value: Value) -> ExternalReport {
    ExternalReport::new(value)
}

#[test]
fn scenario_empty_report_is_rejected_at_20() {
    let assessment = assess(&report(json!({})));

    assert_eq!(assessment.full_name, "Sin nombre");
    assert_eq!(assessment.coarse_tier, CoarseTier::Medium);

    let decision = assessment.decision.unwrap();
    assert_eq!(decision.score, 20);
    assert_eq!(decision.status, DecisionStatus::Rejected);
    assert_eq!(decision.reasons.len(), 5);
    assert!(decision.reasons[0].contains("Sin información clara de situación BCRA"));
    assert!(decision.reasons[1].contains("No se detecta actividad formal"));
}

#[test]
fn scenario_scoring_1_is_high_without_decision() {
    let assessment = assess(&report(json!({ "scoringInforme": { "scoring": 1 } })));
    assert_eq!(assessment.coarse_tier, CoarseTier::High);
    assert!(assessment.decision.is_none());
}

#[test]
fn scenario_scoring_5_is_low_without_decision() {
    let assessment = assess(&report(json!({ "scoringInforme": { "scoring": "5" } })));
    assert_eq!(assessment.coarse_tier, CoarseTier::Low);
    assert!(assessment.decision.is_none());
}

#[test]
fn scenario_strong_medium_profile_is_approved_at_100() {
    let report = ExternalReport::from_envelope(&fixture()).unwrap();

    let metrics = normalize(&report);
    assert_eq!(metrics.total_capacity, 100_000.0);
    assert_eq!(metrics.monthly_commitment, 10_000.0);
    assert_eq!(metrics.monthly_income_estimate, 50_000.0);
    assert_eq!(metrics.formal_activity_months, 48);
    assert_eq!(metrics.worst_bureau_status_24m, Some(1));

    let assessment = assess(&report);
    assert_eq!(assessment.full_name, "GARCIA MARIA LAURA");

    let decision = assessment.decision.unwrap();
    assert_eq!(decision.score, 100);
    assert_eq!(decision.status, DecisionStatus::Approved);
    assert_eq!(decision.reasons.len(), 5);
    assert!(decision.reasons[2].contains("10.0%"), "{}", decision.reasons[2]);
    assert!(decision.reasons[3].contains("20.0%"), "{}", decision.reasons[3]);
}

#[test]
fn manual_review_band() {
    // 50 + 5 (situation 2) + 5 (18 months) + 5 (usage 40%) + 0 (no income) + 0 (no assets)
    let mut value = fixture()["data"]["informe"].clone();
    value["bcra"]["resumen_historico"]["2024-10"]["peor_situacion"] = json!(2);
    value["identidad"]["anios_inscripcion"] = json!(1.5);
    value["scoringInforme"]["deuda"] = json!(480_000);
    value["condicionTributaria"] = json!({});
    value["inmuebles"] = json!([]);
    value["rodados"] = json!([]);

    let decision = assess(&report(value)).decision.unwrap();
    assert_eq!(decision.score, 65);
    assert_eq!(decision.status, DecisionStatus::ManualReview);
    assert_eq!(decision.metrics.usage, Some(0.4));
    assert_eq!(decision.metrics.dti, None);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let report = ExternalReport::from_envelope(&fixture()).unwrap();

    let first = serde_json::to_string(&assess(&report)).unwrap();
    let second = serde_json::to_string(&assess(&report)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn debt_without_capacity_is_penalized() {
    let decision = assess(&report(json!({
        "scoringInforme": { "scoring": 4, "deuda": 60000 }
    })))
    .decision
    .unwrap();

    // 50 - 30 (no activity) - 25 (debt, no capacity) = -5 -> clamped to 0
    assert_eq!(decision.score, 0);
    assert_eq!(decision.status, DecisionStatus::Rejected);
    assert_eq!(decision.metrics.usage, None);
}

#[test]
fn serialized_decision_uses_closed_vocabulary() {
    let wire = serde_json::to_value(assess(&report(json!({})))).unwrap();

    assert_eq!(wire["coarseTier"], "MEDIO");
    assert_eq!(wire["decision"]["status"], "RECHAZADO");
    assert_eq!(wire["decision"]["metrics"]["usage"], Value::Null);
    assert_eq!(wire["decision"]["metrics"]["worstBureauStatus24m"], Value::Null);
}

#[test]
fn out_of_range_bureau_codes_score_like_missing_history() {
    for code in [json!(0), json!("-2"), json!(0.4)] {
        let decision = assess(&report(json!({
            "bcra": { "resumen_historico": { "2024-01": { "peor_situacion": code.clone() } } }
        })))
        .decision
        .unwrap();

        assert_eq!(decision.score, 20, "code {}", code);
        assert_eq!(decision.reasons.len(), 5);
        assert!(
            !decision.reasons[0].contains("situación 1 (normal)"),
            "code {}: {}",
            code,
            decision.reasons[0]
        );
    }
}
