//! Built-in scenario catalog
//!
//! The suite's scenarios ship as YAML under `scenarios/` and are embedded at
//! compile time so the runner works without a checkout.

use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::scenario::Scenario;

const BUILTIN: &[(&str, &str)] = &[
    ("tc001_professor_signup.yaml", include_str!("../scenarios/tc001_professor_signup.yaml")),
    ("tc002_student_signup.yaml", include_str!("../scenarios/tc002_student_signup.yaml")),
    ("tc003_missing_university_id.yaml", include_str!("../scenarios/tc003_missing_university_id.yaml")),
    ("tc005_invalid_email.yaml", include_str!("../scenarios/tc005_invalid_email.yaml")),
    ("tc006_weak_password.yaml", include_str!("../scenarios/tc006_weak_password.yaml")),
    ("tc007_role_not_selected.yaml", include_str!("../scenarios/tc007_role_not_selected.yaml")),
    (
        "tc010_student_denied_professor_dashboard.yaml",
        include_str!("../scenarios/tc010_student_denied_professor_dashboard.yaml"),
    ),
    ("tc015_booked_slot_disabled.yaml", include_str!("../scenarios/tc015_booked_slot_disabled.yaml")),
];

/// Parse every built-in scenario, in catalog order
pub fn builtin() -> E2eResult<Vec<Scenario>> {
    BUILTIN
        .iter()
        .map(|(file, yaml)| {
            Scenario::from_yaml(yaml)
                .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", file, e)))
        })
        .collect()
}

/// Scenarios from `dir`, or the built-in catalog when no directory is given
pub fn load(dir: Option<&Path>) -> E2eResult<Vec<Scenario>> {
    match dir {
        Some(dir) => Scenario::load_all(dir),
        None => builtin(),
    }
}

/// Pick scenarios by id (case-insensitive), keeping the order of `ids`
pub fn select(scenarios: Vec<Scenario>, ids: &[String]) -> E2eResult<Vec<Scenario>> {
    if ids.is_empty() {
        return Ok(scenarios);
    }

    ids.iter()
        .map(|id| {
            scenarios
                .iter()
                .find(|s| s.id.eq_ignore_ascii_case(id))
                .cloned()
                .ok_or_else(|| E2eError::ScenarioNotFound(id.clone()))
        })
        .collect()
}
