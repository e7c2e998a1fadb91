use crate::config::IndicatorTuning;

use super::{
    ensure_valid_delta, render_bar_line, BarStyle, IndicatorSnapshot, ProgressIndicator,
    ReliableIndicator, UpdateError,
};

/// Composite over a fixed, exclusively-owned set of child indicators. Its own
/// progress is always the arithmetic mean of the children, recomputed on read;
/// there is no independent state to desynchronize.
pub struct NestedIndicator {
    label: String,
    style: BarStyle,
    children: Vec<Box<dyn ProgressIndicator>>,
}

impl NestedIndicator {
    pub fn new(
        label: impl Into<String>,
        tuning: &IndicatorTuning,
        children: Vec<Box<dyn ProgressIndicator>>,
    ) -> Self {
        Self {
            label: label.into(),
            style: BarStyle::from(tuning),
            children,
        }
    }

    /// Default construction rule: `child_count` reliable children.
    pub fn with_reliable_children(
        label: impl Into<String>,
        tuning: &IndicatorTuning,
        child_count: usize,
    ) -> Self {
        let children = (1..=child_count)
            .map(|index| {
                Box::new(ReliableIndicator::new(format!("Subtask {index}"), tuning))
                    as Box<dyn ProgressIndicator>
            })
            .collect();
        Self::new(label, tuning, children)
    }

    pub fn children(&self) -> &[Box<dyn ProgressIndicator>] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl ProgressIndicator for NestedIndicator {
    fn label(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> f32 {
        if self.children.is_empty() {
            return 0.0;
        }
        let total: f32 = self.children.iter().map(|child| child.progress()).sum();
        total / self.children.len() as f32
    }

    fn update(&mut self, delta: f32) -> Result<f32, UpdateError> {
        ensure_valid_delta(delta)?;
        for child in &mut self.children {
            child.update(delta)?;
        }
        Ok(self.progress())
    }

    fn render_indented(&self, indent: usize) -> Vec<String> {
        let mut lines = vec![render_bar_line(&self.label, self.progress(), self.style, indent)];
        for child in &self.children {
            lines.extend(child.render_indented(indent + 2));
        }
        lines
    }

    fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            children: self.children.iter().map(|child| child.snapshot()).collect(),
            ..IndicatorSnapshot::leaf(&self.label, self.progress())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{OscillatingIndicator, StuckIndicator};
    use super::*;

    fn tuning() -> IndicatorTuning {
        IndicatorTuning::default()
    }

    #[test]
    fn progress_is_the_mean_of_children() {
        let mut nested = NestedIndicator::with_reliable_children("overall", &tuning(), 2);
        nested.update(0.5).expect("update");
        assert_eq!(nested.progress(), 0.5);
    }

    #[test]
    fn zero_children_means_zero_progress() {
        let mut nested = NestedIndicator::new("empty", &tuning(), Vec::new());
        assert_eq!(nested.progress(), 0.0);
        assert_eq!(nested.update(0.5).expect("update"), 0.0);
    }

    #[test]
    fn update_forwards_to_every_child_in_order() {
        let children: Vec<Box<dyn ProgressIndicator>> = vec![
            Box::new(ReliableIndicator::new("a", &tuning())),
            Box::new(StuckIndicator::with_stuck_at("b", &tuning(), 0.25)),
        ];
        let mut nested = NestedIndicator::new("overall", &tuning(), children);
        nested.update(0.5).expect("update");
        assert_eq!(nested.children()[0].progress(), 0.5);
        assert_eq!(nested.children()[1].progress(), 0.25);
        assert_eq!(nested.progress(), 0.375);
    }

    #[test]
    fn mean_is_recomputed_on_read() {
        let children: Vec<Box<dyn ProgressIndicator>> = vec![
            Box::new(ReliableIndicator::new("a", &tuning())),
            Box::new(OscillatingIndicator::new("b", &tuning())),
        ];
        let mut nested = NestedIndicator::new("overall", &tuning(), children);
        nested.update(1.0).expect("update");
        assert_eq!(nested.progress(), 1.0);
        // The oscillating child flips and descends; the mean follows.
        nested.update(0.1).expect("update");
        nested.update(0.5).expect("update");
        assert!(nested.progress() < 1.0);
    }

    #[test]
    fn rejects_negative_delta_before_touching_children() {
        let mut nested = NestedIndicator::with_reliable_children("overall", &tuning(), 2);
        assert!(nested.update(-1.0).is_err());
        assert_eq!(nested.progress(), 0.0);
    }

    #[test]
    fn render_indents_children_by_two_spaces() {
        let mut nested = NestedIndicator::with_reliable_children("overall", &tuning(), 2);
        nested.update(0.5).expect("update");
        let lines = nested.render();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("overall:"));
        assert!(lines[1].starts_with("  Subtask 1:"));
        assert!(lines[2].starts_with("  Subtask 2:"));
    }

    #[test]
    fn snapshot_includes_children() {
        let nested = NestedIndicator::with_reliable_children("overall", &tuning(), 3);
        let snapshot = nested.snapshot();
        assert_eq!(snapshot.children.len(), 3);
        assert_eq!(snapshot.children[0].label, "Subtask 1");
    }
}
