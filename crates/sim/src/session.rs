use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use feign_engine::{
    load_config, EngineConfig, FakeMessage, FakeMessageGenerator, FeignRng, IndicatorFactory,
    IndicatorSnapshot, MessageScheduler, ProgressIndicator,
};

use crate::plan::{self, PlanResult, PlannedMessage, SessionPlan};

pub(crate) const CONFIG_ENV_VAR: &str = "FEIGN_CONFIG";
pub(crate) const PLAN_ENV_VAR: &str = "FEIGN_PLAN";
pub(crate) const SUMMARY_ENV_VAR: &str = "FEIGN_SUMMARY";

const DEFAULT_CONFIG_PATH: &str = "assets/feign.xml";
const DEFAULT_PLAN_PATH: &str = "assets/session_plan.json";
const DEFAULT_SUMMARY_PATH: &str = "feign_session.json";

/// Simple event accumulation: the engine is polled, nothing is pushed.
#[derive(Debug, Default)]
pub(crate) struct SessionRecorder {
    update_count: u64,
    release_count: u64,
    history: Vec<FakeMessage>,
}

impl SessionRecorder {
    pub(crate) fn record_updates(&mut self, indicator_count: usize) {
        self.update_count += indicator_count as u64;
    }

    pub(crate) fn record_releases(&mut self, released: Vec<FakeMessage>) {
        self.release_count += released.len() as u64;
        self.history.extend(released);
    }

    pub(crate) fn update_count(&self) -> u64 {
        self.update_count
    }

    pub(crate) fn release_count(&self) -> u64 {
        self.release_count
    }

    pub(crate) fn history(&self) -> &[FakeMessage] {
        &self.history
    }
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    ticks: u64,
    step_delta: f32,
    indicator_update_count: u64,
    released_message_count: u64,
    indicators: Vec<IndicatorSnapshot>,
    released_messages: Vec<FakeMessage>,
}

pub(crate) fn run() -> PlanResult<PathBuf> {
    let config = load_session_config();
    let plan = plan::load_plan(&env_path(PLAN_ENV_VAR, DEFAULT_PLAN_PATH))?;

    let mut rng = match plan.seed {
        Some(seed) => FeignRng::seeded(seed),
        None => FeignRng::from_os(),
    };
    let mut factory = IndicatorFactory::new(&config, rng.fork());
    let mut generator = FakeMessageGenerator::new(rng.fork());
    generator.load_from_config(&config);
    let mut scheduler = MessageScheduler::new(rng.fork());

    let mut indicators = build_indicators(&plan, &mut factory)?;
    schedule_messages(&plan, &mut scheduler, &mut generator)?;

    info!(
        steps = plan.steps,
        indicators = indicators.len(),
        pending_messages = scheduler.pending_len(),
        "session start"
    );

    let mut recorder = SessionRecorder::default();
    for _ in 0..plan.steps {
        for indicator in &mut indicators {
            indicator
                .update(plan.step_delta)
                .map_err(|error| format!("indicator update: {error}"))?;
        }
        recorder.record_updates(indicators.len());

        let released = scheduler.tick();
        for message in &released {
            info!(
                tick = scheduler.current_tick(),
                severity = %message.severity,
                "{}",
                message.text
            );
        }
        recorder.record_releases(released);
    }

    for indicator in &indicators {
        for line in indicator.render() {
            info!("{line}");
        }
    }

    let summary = SessionSummary {
        ticks: scheduler.current_tick(),
        step_delta: plan.step_delta,
        indicator_update_count: recorder.update_count(),
        released_message_count: recorder.release_count(),
        indicators: indicators.iter().map(|i| i.snapshot()).collect(),
        released_messages: recorder.history().to_vec(),
    };
    write_summary(&summary, &env_path(SUMMARY_ENV_VAR, DEFAULT_SUMMARY_PATH))
}

fn load_session_config() -> EngineConfig {
    let path = env_path(CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH);
    if !path.exists() {
        warn!(path = %path.display(), "no engine config file; running with defaults");
        return EngineConfig::default();
    }
    match load_config(&path) {
        Ok(config) => config,
        Err(error) => {
            warn!(error = %error, "config load failed; running with defaults");
            EngineConfig::default()
        }
    }
}

fn build_indicators(
    plan: &SessionPlan,
    factory: &mut IndicatorFactory,
) -> PlanResult<Vec<Box<dyn ProgressIndicator>>> {
    plan.indicators
        .iter()
        .map(|planned| {
            factory
                .create(&planned.label, &planned.variant)
                .map_err(|error| format!("indicator '{}': {error}", planned.label))
        })
        .collect()
}

fn schedule_messages(
    plan: &SessionPlan,
    scheduler: &mut MessageScheduler,
    generator: &mut FakeMessageGenerator,
) -> PlanResult<()> {
    for planned in &plan.schedule {
        match planned {
            PlannedMessage {
                category,
                delay: Some(delay),
                min_delay: None,
                max_delay: None,
            } => scheduler
                .schedule_message(generator, *delay, category)
                .map_err(|error| format!("schedule '{category}': {error}"))?,
            PlannedMessage {
                category,
                delay: None,
                min_delay: Some(min_delay),
                max_delay: Some(max_delay),
            } => scheduler
                .schedule_random(generator, *min_delay, *max_delay, category)
                .map_err(|error| format!("schedule '{category}': {error}"))?,
            PlannedMessage { category, .. } => {
                return Err(format!(
                    "schedule entry '{category}' needs either delay or min_delay+max_delay"
                ))
            }
        }
    }
    Ok(())
}

fn write_summary(summary: &SessionSummary, path: &Path) -> PlanResult<PathBuf> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|error| format!("encode summary json: {error}"))?;
    fs::write(path, json).map_err(|error| format!("write summary '{}': {error}", path.display()))?;
    Ok(path.to_path_buf())
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
