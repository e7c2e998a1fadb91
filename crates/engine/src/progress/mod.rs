mod factory;
mod nested;
mod variants;

pub use factory::{FactoryError, IndicatorFactory, IndicatorKind};
pub use nested::NestedIndicator;
pub use variants::{
    OscillatingIndicator, ReliableIndicator, StuckIndicator, UnreliableIndicator,
};

use serde::Serialize;
use thiserror::Error;

use crate::config::IndicatorTuning;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum UpdateError {
    #[error("update delta must be finite and >= 0, got {delta}")]
    InvalidDelta { delta: f32 },
}

/// Shared capability set for all deceptive progress behaviors: a [0,1]
/// progress value, a per-variant update rule and a line-based rendering.
pub trait ProgressIndicator {
    fn label(&self) -> &str;

    fn progress(&self) -> f32;

    /// Advances the indicator by a non-negative step quantity and returns the
    /// new progress value. Negative or non-finite deltas are rejected before
    /// any state changes.
    fn update(&mut self, delta: f32) -> Result<f32, UpdateError>;

    /// Display lines at the given indent level. Never mutates state.
    fn render_indented(&self, indent: usize) -> Vec<String>;

    fn render(&self) -> Vec<String> {
        self.render_indented(0)
    }

    /// Read-only view for collaborators that record or persist session state.
    fn snapshot(&self) -> IndicatorSnapshot;
}

/// Serializable snapshot of one indicator (and its children, for composites).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub label: String,
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_stuck: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<i8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndicatorSnapshot>,
}

impl IndicatorSnapshot {
    pub(crate) fn leaf(label: &str, progress: f32) -> Self {
        Self {
            label: label.to_string(),
            progress,
            is_stuck: None,
            direction: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarStyle {
    pub width: usize,
    pub fill: char,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            width: crate::config::DEFAULT_BAR_WIDTH,
            fill: crate::config::DEFAULT_BAR_FILL,
        }
    }
}

impl From<&IndicatorTuning> for BarStyle {
    fn from(tuning: &IndicatorTuning) -> Self {
        Self {
            width: tuning.bar_width,
            fill: tuning.bar_fill,
        }
    }
}

pub(crate) fn ensure_valid_delta(delta: f32) -> Result<(), UpdateError> {
    if !delta.is_finite() || delta < 0.0 {
        return Err(UpdateError::InvalidDelta { delta });
    }
    Ok(())
}

pub(crate) fn render_bar_line(
    label: &str,
    progress: f32,
    style: BarStyle,
    indent: usize,
) -> String {
    let percentage = (progress * 100.0).round() as u32;
    let filled = ((style.width as f32) * progress) as usize;
    let filled = filled.min(style.width);
    let mut bar = style.fill.to_string().repeat(filled);
    bar.push_str(&" ".repeat(style.width - filled));
    format!("{}{}: [{}] {}%", " ".repeat(indent), label, bar, percentage)
}
