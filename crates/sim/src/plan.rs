use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

pub(crate) type PlanResult<T> = Result<T, String>;

/// Describes one simulated session: which indicators to create, which fake
/// messages to schedule, and how long to run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionPlan {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_step_delta")]
    pub step_delta: f32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub indicators: Vec<PlannedIndicator>,
    #[serde(default)]
    pub schedule: Vec<PlannedMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlannedIndicator {
    pub label: String,
    pub variant: String,
}

/// Either a fixed `delay` or an inclusive `min_delay`/`max_delay` range.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlannedMessage {
    pub category: String,
    #[serde(default)]
    pub delay: Option<i64>,
    #[serde(default)]
    pub min_delay: Option<i64>,
    #[serde(default)]
    pub max_delay: Option<i64>,
}

fn default_steps() -> u32 {
    60
}

fn default_step_delta() -> f32 {
    0.02
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            step_delta: default_step_delta(),
            seed: None,
            indicators: vec![
                PlannedIndicator {
                    label: "Applying settings".to_string(),
                    variant: "stuck".to_string(),
                },
                PlannedIndicator {
                    label: "Verifying configuration".to_string(),
                    variant: "nested".to_string(),
                },
            ],
            schedule: vec![PlannedMessage {
                category: "system".to_string(),
                delay: None,
                min_delay: Some(5),
                max_delay: Some(20),
            }],
        }
    }
}

pub(crate) fn load_plan(path: &Path) -> PlanResult<SessionPlan> {
    if !path.exists() {
        info!(path = %path.display(), "no session plan file; using the built-in plan");
        return Ok(SessionPlan::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read plan '{}': {error}", path.display()))?;
    parse_plan_json(&raw)
}

pub(crate) fn parse_plan_json(raw: &str) -> PlanResult<SessionPlan> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SessionPlan>(&mut deserializer) {
        Ok(plan) => Ok(plan),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse plan json: {source}"))
            } else {
                Err(format!("parse plan json at {path}: {source}"))
            }
        }
    }
}
