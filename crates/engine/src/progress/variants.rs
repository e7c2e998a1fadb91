use crate::config::IndicatorTuning;
use crate::rng::FeignRng;

use super::{
    ensure_valid_delta, render_bar_line, BarStyle, IndicatorSnapshot, ProgressIndicator,
    UpdateError,
};

/// The one honest variant: progress climbs by exactly the delta and clamps at
/// the ceiling.
#[derive(Debug, Clone)]
pub struct ReliableIndicator {
    label: String,
    progress: f32,
    style: BarStyle,
}

impl ReliableIndicator {
    pub fn new(label: impl Into<String>, tuning: &IndicatorTuning) -> Self {
        Self {
            label: label.into(),
            progress: 0.0,
            style: BarStyle::from(tuning),
        }
    }
}

impl ProgressIndicator for ReliableIndicator {
    fn label(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn update(&mut self, delta: f32) -> Result<f32, UpdateError> {
        ensure_valid_delta(delta)?;
        self.progress = (self.progress + delta).min(1.0);
        Ok(self.progress)
    }

    fn render_indented(&self, indent: usize) -> Vec<String> {
        vec![render_bar_line(&self.label, self.progress, self.style, indent)]
    }

    fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot::leaf(&self.label, self.progress)
    }
}

/// Stalls with a configured probability; otherwise jumps by the delta scaled
/// with a random factor. Never decreases.
#[derive(Debug, Clone)]
pub struct UnreliableIndicator {
    label: String,
    progress: f32,
    stall_probability: f32,
    jump_factor_min: f32,
    jump_factor_max: f32,
    style: BarStyle,
    rng: FeignRng,
}

impl UnreliableIndicator {
    pub fn new(label: impl Into<String>, tuning: &IndicatorTuning, rng: FeignRng) -> Self {
        Self {
            label: label.into(),
            progress: 0.0,
            stall_probability: tuning.stall_probability,
            jump_factor_min: tuning.jump_factor_min,
            jump_factor_max: tuning.jump_factor_max,
            style: BarStyle::from(tuning),
            rng,
        }
    }
}

impl ProgressIndicator for UnreliableIndicator {
    fn label(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn update(&mut self, delta: f32) -> Result<f32, UpdateError> {
        ensure_valid_delta(delta)?;
        if self.progress < 1.0 && !self.rng.chance(self.stall_probability) {
            let factor = self
                .rng
                .uniform_f32(self.jump_factor_min, self.jump_factor_max);
            self.progress = (self.progress + delta * factor).min(1.0);
        }
        Ok(self.progress)
    }

    fn render_indented(&self, indent: usize) -> Vec<String> {
        vec![render_bar_line(&self.label, self.progress, self.style, indent)]
    }

    fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot::leaf(&self.label, self.progress)
    }
}

/// Climbs like a reliable indicator until the threshold, then freezes there
/// forever. The freeze is one-directional.
#[derive(Debug, Clone)]
pub struct StuckIndicator {
    label: String,
    progress: f32,
    stuck_at: f32,
    is_stuck: bool,
    style: BarStyle,
}

impl StuckIndicator {
    pub fn new(label: impl Into<String>, tuning: &IndicatorTuning) -> Self {
        Self::with_stuck_at(label, tuning, tuning.default_stuck_at)
    }

    /// `stuck_at` must already be within [0, 1]; config parsing and the
    /// factory guarantee it.
    pub fn with_stuck_at(label: impl Into<String>, tuning: &IndicatorTuning, stuck_at: f32) -> Self {
        debug_assert!((0.0..=1.0).contains(&stuck_at));
        Self {
            label: label.into(),
            progress: 0.0,
            stuck_at,
            is_stuck: false,
            style: BarStyle::from(tuning),
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.is_stuck
    }

    pub fn stuck_at(&self) -> f32 {
        self.stuck_at
    }
}

impl ProgressIndicator for StuckIndicator {
    fn label(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn update(&mut self, delta: f32) -> Result<f32, UpdateError> {
        ensure_valid_delta(delta)?;
        if self.is_stuck {
            return Ok(self.progress);
        }
        let next = (self.progress + delta).min(self.stuck_at);
        self.progress = next;
        if next >= self.stuck_at {
            // Pinned from this call on.
            self.progress = self.stuck_at;
            self.is_stuck = true;
        }
        Ok(self.progress)
    }

    fn render_indented(&self, indent: usize) -> Vec<String> {
        vec![render_bar_line(&self.label, self.progress, self.style, indent)]
    }

    fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            is_stuck: Some(self.is_stuck),
            ..IndicatorSnapshot::leaf(&self.label, self.progress)
        }
    }
}

/// Bounces between the bounds; the only variant whose progress legitimately
/// decreases. Deterministic.
#[derive(Debug, Clone)]
pub struct OscillatingIndicator {
    label: String,
    progress: f32,
    direction: i8,
    style: BarStyle,
}

impl OscillatingIndicator {
    pub fn new(label: impl Into<String>, tuning: &IndicatorTuning) -> Self {
        Self {
            label: label.into(),
            progress: 0.0,
            direction: 1,
            style: BarStyle::from(tuning),
        }
    }

    pub fn direction(&self) -> i8 {
        self.direction
    }
}

impl ProgressIndicator for OscillatingIndicator {
    fn label(&self) -> &str {
        &self.label
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn update(&mut self, delta: f32) -> Result<f32, UpdateError> {
        ensure_valid_delta(delta)?;
        let next = self.progress + f32::from(self.direction) * delta;
        // Flip exactly at the bound crossing; landing on a bound does not flip.
        if next > 1.0 {
            self.progress = 1.0;
            self.direction = -1;
        } else if next < 0.0 {
            self.progress = 0.0;
            self.direction = 1;
        } else {
            self.progress = next;
        }
        Ok(self.progress)
    }

    fn render_indented(&self, indent: usize) -> Vec<String> {
        vec![render_bar_line(&self.label, self.progress, self.style, indent)]
    }

    fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            direction: Some(self.direction),
            ..IndicatorSnapshot::leaf(&self.label, self.progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> IndicatorTuning {
        IndicatorTuning::default()
    }

    #[test]
    fn reliable_accumulates_delta_and_clamps() {
        let mut bar = ReliableIndicator::new("load", &tuning());
        assert_eq!(bar.update(0.4).expect("update"), 0.4);
        assert_eq!(bar.update(0.4).expect("update"), 0.8);
        assert_eq!(bar.update(0.4).expect("update"), 1.0);
    }

    #[test]
    fn reliable_is_idempotent_at_the_ceiling() {
        let mut bar = ReliableIndicator::new("load", &tuning());
        bar.update(2.0).expect("update");
        assert_eq!(bar.progress(), 1.0);
        assert_eq!(bar.update(0.5).expect("update"), 1.0);
        assert_eq!(bar.update(0.0).expect("update"), 1.0);
    }

    #[test]
    fn reliable_rejects_negative_delta() {
        let mut bar = ReliableIndicator::new("load", &tuning());
        assert_eq!(
            bar.update(-0.5),
            Err(UpdateError::InvalidDelta { delta: -0.5 })
        );
        assert_eq!(bar.progress(), 0.0);
    }

    #[test]
    fn unreliable_never_decreases_and_stays_in_bounds() {
        let mut bar = UnreliableIndicator::new("load", &tuning(), FeignRng::seeded(42));
        let mut previous = bar.progress();
        for _ in 0..500 {
            let next = bar.update(0.01).expect("update");
            assert!(next >= previous, "progress must be non-decreasing");
            assert!((0.0..=1.0).contains(&next));
            previous = next;
        }
    }

    #[test]
    fn unreliable_stalls_sometimes() {
        let stall_heavy = IndicatorTuning {
            stall_probability: 0.9,
            ..tuning()
        };
        let mut bar = UnreliableIndicator::new("load", &stall_heavy, FeignRng::seeded(7));
        let mut stalled = 0;
        for _ in 0..100 {
            let before = bar.progress();
            bar.update(0.001).expect("update");
            if bar.progress() == before {
                stalled += 1;
            }
        }
        assert!(stalled > 50, "expected mostly stalls, saw {stalled}");
    }

    #[test]
    fn unreliable_is_deterministic_for_the_same_seed() {
        let mut first = UnreliableIndicator::new("a", &tuning(), FeignRng::seeded(9));
        let mut second = UnreliableIndicator::new("b", &tuning(), FeignRng::seeded(9));
        for _ in 0..50 {
            let left = first.update(0.02).expect("update");
            let right = second.update(0.02).expect("update");
            assert_eq!(left, right);
        }
    }

    #[test]
    fn stuck_pins_at_the_threshold_permanently() {
        let mut bar = StuckIndicator::with_stuck_at("load", &tuning(), 0.6);
        assert!(!bar.is_stuck());
        assert_eq!(bar.update(0.5).expect("update"), 0.5);
        assert!(!bar.is_stuck());
        assert_eq!(bar.update(0.5).expect("update"), 0.6);
        assert!(bar.is_stuck());
        assert_eq!(bar.update(10.0).expect("update"), 0.6);
        assert!(bar.is_stuck());
        assert_eq!(bar.progress(), 0.6);
    }

    #[test]
    fn stuck_reports_threshold_reached_on_the_exact_call() {
        let mut bar = StuckIndicator::with_stuck_at("load", &tuning(), 0.4);
        bar.update(0.2).expect("update");
        assert!(!bar.is_stuck());
        bar.update(0.2).expect("update");
        assert!(bar.is_stuck());
    }

    #[test]
    fn stuck_uses_default_threshold_from_tuning() {
        let bar = StuckIndicator::new("load", &tuning());
        assert_eq!(bar.stuck_at(), 0.99);
    }

    #[test]
    fn oscillating_flips_direction_only_past_the_bound() {
        let mut bar = OscillatingIndicator::new("load", &tuning());
        assert_eq!(bar.direction(), 1);
        // Landing exactly on 1.0 keeps the direction.
        assert_eq!(bar.update(1.0).expect("update"), 1.0);
        assert_eq!(bar.direction(), 1);
        // The next step would cross, so it clamps and flips.
        assert_eq!(bar.update(0.1).expect("update"), 1.0);
        assert_eq!(bar.direction(), -1);
    }

    #[test]
    fn oscillating_descends_and_flips_at_zero() {
        let mut bar = OscillatingIndicator::new("load", &tuning());
        bar.update(1.0).expect("update");
        bar.update(0.1).expect("update");
        assert_eq!(bar.direction(), -1);
        assert!((bar.update(0.4).expect("update") - 0.6).abs() < 1e-6);
        assert_eq!(bar.direction(), -1);
        bar.update(0.8).expect("update");
        assert_eq!(bar.progress(), 0.0);
        assert_eq!(bar.direction(), 1);
    }

    #[test]
    fn non_oscillating_variants_are_monotonic_over_random_deltas() {
        let mut rng = FeignRng::seeded(13);
        let deltas: Vec<f32> = (0..200).map(|_| rng.uniform_f32(0.0, 0.1)).collect();

        let mut reliable = ReliableIndicator::new("r", &tuning());
        let mut unreliable = UnreliableIndicator::new("u", &tuning(), FeignRng::seeded(5));
        let mut stuck = StuckIndicator::with_stuck_at("s", &tuning(), 0.8);

        let mut last = [0.0f32; 3];
        for delta in deltas {
            let values = [
                reliable.update(delta).expect("update"),
                unreliable.update(delta).expect("update"),
                stuck.update(delta).expect("update"),
            ];
            for (previous, value) in last.iter().zip(values.iter()) {
                assert!(value >= previous);
                assert!((0.0..=1.0).contains(value));
            }
            last = values;
        }
    }

    #[test]
    fn render_produces_a_single_bar_line() {
        let mut bar = ReliableIndicator::new("Initializing", &tuning());
        bar.update(0.25).expect("update");
        let lines = bar.render();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Initializing"));
        assert!(lines[0].contains("25%"));
    }

    #[test]
    fn snapshots_expose_variant_specific_state() {
        let stuck = StuckIndicator::new("s", &tuning());
        assert_eq!(stuck.snapshot().is_stuck, Some(false));
        assert_eq!(stuck.snapshot().direction, None);

        let oscillating = OscillatingIndicator::new("o", &tuning());
        assert_eq!(oscillating.snapshot().direction, Some(1));
        assert_eq!(oscillating.snapshot().is_stuck, None);
    }
}
