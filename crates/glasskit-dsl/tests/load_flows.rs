use glasskit_dsl::{load_flow, load_flow_json, validation::error_codes, DslError};
use glasskit_flow::{FlowData, FlowEngine};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const ONBOARDING: &str = r#"
dsl_version: "1.0"
flow:
  id: onboarding
  name: Onboarding
  initial_step: welcome
  steps:
    - id: welcome
      component: WelcomeCard
      props:
        title: "Hello"
      next: plan
    - id: plan
      component: PlanPicker
      next:
        branches:
          - when: { key: plan, one_of: [pro, team] }
            goto: billing
          - when: { key: coupon, exists: true }
            goto: redeem
        otherwise: done
    - id: billing
      component: BillingForm
      next: done
    - id: redeem
      component: CouponForm
      next: done
    - id: done
      component: Finished
"#;

fn payload(value: serde_json::Value) -> FlowData {
    value.as_object().cloned().unwrap_or_default()
}

fn walk(data: serde_json::Value) -> Vec<String> {
    let flow = Arc::new(load_flow(ONBOARDING).unwrap());
    let mut engine = FlowEngine::new();
    engine.start(flow, None).unwrap();
    engine.next(None).unwrap();
    engine.next(Some(payload(data))).unwrap();
    engine.history().iter().map(|id| id.to_string()).collect()
}

#[test]
fn yaml_flow_drives_the_engine() {
    assert_eq!(walk(json!({"plan": "team"})), vec!["welcome", "plan", "billing"]);
    assert_eq!(walk(json!({"coupon": "SPRING"})), vec!["welcome", "plan", "redeem"]);
    assert_eq!(walk(json!({"plan": "free"})), vec!["welcome", "plan", "done"]);
}

#[test]
fn props_are_carried_to_steps() {
    let flow = load_flow(ONBOARDING).unwrap();
    assert_eq!(flow.step("welcome").unwrap().props, Some(json!({"title": "Hello"})));
    assert_eq!(flow.steps.len(), 5);
}

#[test]
fn json_documents_are_accepted() {
    let flow = load_flow_json(
        r#"{
            "dsl_version": "1.0",
            "flow": {
                "id": "mini",
                "name": "Mini",
                "initial_step": "a",
                "steps": [
                    {"id": "a", "component": "A", "next": "b"},
                    {"id": "b", "component": "B"}
                ]
            }
        }"#,
    )
    .unwrap();

    let mut engine = FlowEngine::new();
    engine.start(Arc::new(flow), None).unwrap();
    engine.next(None).unwrap();
    assert_eq!(engine.progress(), 100);
    engine.next(None).unwrap();
    assert!(engine.current_step().is_none());
}

#[test]
fn broken_document_reports_all_problems() {
    let yaml = r#"
dsl_version: "1.0"
flow:
  id: broken
  name: Broken
  initial_step: start
  steps:
    - id: a
      component: A
      next: missing
    - id: a
      component: A2
"#;

    let err = load_flow(yaml).unwrap_err();
    let codes: Vec<&str> = err.validation_errors().iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            error_codes::DUPLICATE_ID,
            error_codes::INVALID_REFERENCE,
            error_codes::INVALID_REFERENCE,
        ]
    );
    assert!(matches!(err, DslError::MultipleValidationErrors(_)));
}

#[test]
fn unsupported_version_is_rejected() {
    let err = load_flow("dsl_version: \"0.9\"\nflow: {id: x, name: X, initial_step: a}\n").unwrap_err();
    assert_eq!(err.error_code(), "ERR_DSL_UNSUPPORTED_VERSION");
}
