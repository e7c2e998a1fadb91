use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::config::{BehaviorWeights, EngineConfig, IndicatorTuning};
use crate::rng::FeignRng;

use super::{
    NestedIndicator, OscillatingIndicator, ProgressIndicator, ReliableIndicator, StuckIndicator,
    UnreliableIndicator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Reliable,
    Unreliable,
    Stuck,
    Oscillating,
    Nested,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Reliable,
        IndicatorKind::Unreliable,
        IndicatorKind::Stuck,
        IndicatorKind::Oscillating,
        IndicatorKind::Nested,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Reliable => "reliable",
            Self::Unreliable => "unreliable",
            Self::Stuck => "stuck",
            Self::Oscillating => "oscillating",
            Self::Nested => "nested",
        }
    }

    pub fn parse(name: &str) -> Result<Self, FactoryError> {
        match name {
            "reliable" => Ok(Self::Reliable),
            "unreliable" => Ok(Self::Unreliable),
            "stuck" => Ok(Self::Stuck),
            "oscillating" => Ok(Self::Oscillating),
            "nested" => Ok(Self::Nested),
            _ => Err(FactoryError::UnknownVariant {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error(
        "unknown indicator variant '{name}'; expected one of: reliable, unreliable, stuck, \
oscillating, nested"
    )]
    UnknownVariant { name: String },
}

/// The single registration point for deceptive behaviors: adding one means one
/// arm in `build` plus one conforming indicator type.
pub struct IndicatorFactory {
    tuning: IndicatorTuning,
    weights: BehaviorWeights,
    rng: FeignRng,
}

impl IndicatorFactory {
    pub fn new(config: &EngineConfig, rng: FeignRng) -> Self {
        Self {
            tuning: config.tuning,
            weights: config.weights,
            rng,
        }
    }

    pub fn tuning(&self) -> &IndicatorTuning {
        &self.tuning
    }

    pub fn create(
        &mut self,
        label: &str,
        variant_name: &str,
    ) -> Result<Box<dyn ProgressIndicator>, FactoryError> {
        let kind = IndicatorKind::parse(variant_name)?;
        Ok(self.create_kind(label, kind))
    }

    pub fn create_kind(&mut self, label: &str, kind: IndicatorKind) -> Box<dyn ProgressIndicator> {
        debug!(label, kind = %kind, "creating indicator");
        match kind {
            IndicatorKind::Reliable => Box::new(ReliableIndicator::new(label, &self.tuning)),
            IndicatorKind::Unreliable => Box::new(UnreliableIndicator::new(
                label,
                &self.tuning,
                self.rng.fork(),
            )),
            IndicatorKind::Stuck => Box::new(StuckIndicator::new(label, &self.tuning)),
            IndicatorKind::Oscillating => Box::new(OscillatingIndicator::new(label, &self.tuning)),
            IndicatorKind::Nested => Box::new(self.build_nested(label)),
        }
    }

    /// Variant drawn from the configured behavior weights. Oscillating is
    /// deliberately excluded from the draw; it is only created by name.
    pub fn create_random(&mut self, label: &str) -> Box<dyn ProgressIndicator> {
        const DRAWABLE: [IndicatorKind; 4] = [
            IndicatorKind::Reliable,
            IndicatorKind::Unreliable,
            IndicatorKind::Stuck,
            IndicatorKind::Nested,
        ];
        let weights = [
            self.weights.reliable,
            self.weights.unreliable,
            self.weights.stuck,
            self.weights.nested,
        ];
        let kind = match self.rng.pick_weighted(&weights) {
            Some(index) => DRAWABLE[index],
            None => IndicatorKind::Reliable,
        };
        self.create_kind(label, kind)
    }

    fn build_nested(&mut self, label: &str) -> NestedIndicator {
        // Children come from the leaf set only, so the tree stays one level
        // deep when built by the factory.
        const CHILD_KINDS: [IndicatorKind; 3] = [
            IndicatorKind::Reliable,
            IndicatorKind::Unreliable,
            IndicatorKind::Stuck,
        ];

        let child_count = self.tuning.nested_child_count;
        let mut children: Vec<Box<dyn ProgressIndicator>> = Vec::with_capacity(child_count);
        for index in 0..child_count {
            let child_label = format!("Subtask {}", index + 1);
            let kind = match self.rng.pick(&CHILD_KINDS) {
                Some(kind) => *kind,
                None => IndicatorKind::Reliable,
            };
            let child: Box<dyn ProgressIndicator> = match kind {
                IndicatorKind::Stuck => {
                    let stuck_at = self.rng.uniform_f32(0.7, 0.99);
                    Box::new(StuckIndicator::with_stuck_at(
                        child_label,
                        &self.tuning,
                        stuck_at,
                    ))
                }
                IndicatorKind::Unreliable => Box::new(UnreliableIndicator::new(
                    child_label,
                    &self.tuning,
                    self.rng.fork(),
                )),
                _ => Box::new(ReliableIndicator::new(child_label, &self.tuning)),
            };
            children.push(child);
        }

        NestedIndicator::new(label, &self.tuning, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> IndicatorFactory {
        IndicatorFactory::new(&EngineConfig::default(), FeignRng::seeded(42))
    }

    #[test]
    fn parses_every_known_variant_name() {
        for kind in IndicatorKind::ALL {
            assert_eq!(IndicatorKind::parse(kind.name()).expect("known name"), kind);
        }
    }

    #[test]
    fn unknown_variant_name_is_an_error() {
        let error = IndicatorKind::parse("spinning").unwrap_err();
        assert_eq!(
            error,
            FactoryError::UnknownVariant {
                name: "spinning".to_string()
            }
        );
    }

    #[test]
    fn create_rejects_unknown_variants_without_falling_back() {
        let mut factory = factory();
        assert!(factory.create("x", "definitely_not_a_variant").is_err());
    }

    #[test]
    fn created_indicators_carry_the_label() {
        let mut factory = factory();
        for kind in IndicatorKind::ALL {
            let indicator = factory.create_kind("Updating drivers", kind);
            assert_eq!(indicator.label(), "Updating drivers");
        }
    }

    #[test]
    fn nested_children_honor_the_configured_count() {
        let config = EngineConfig {
            tuning: IndicatorTuning {
                nested_child_count: 5,
                ..IndicatorTuning::default()
            },
            ..EngineConfig::default()
        };
        let mut factory = IndicatorFactory::new(&config, FeignRng::seeded(1));
        let nested = factory.create("overall", "nested").expect("create");
        assert_eq!(nested.snapshot().children.len(), 5);
    }

    #[test]
    fn create_random_respects_degenerate_weights() {
        let config = EngineConfig {
            weights: BehaviorWeights {
                reliable: 0.0,
                unreliable: 0.0,
                stuck: 1.0,
                nested: 0.0,
            },
            ..EngineConfig::default()
        };
        let mut factory = IndicatorFactory::new(&config, FeignRng::seeded(3));
        for _ in 0..20 {
            let indicator = factory.create_random("x");
            assert_eq!(indicator.snapshot().is_stuck, Some(false));
        }
    }

    #[test]
    fn create_random_with_all_zero_weights_falls_back_to_reliable() {
        let config = EngineConfig {
            weights: BehaviorWeights {
                reliable: 0.0,
                unreliable: 0.0,
                stuck: 0.0,
                nested: 0.0,
            },
            ..EngineConfig::default()
        };
        let mut factory = IndicatorFactory::new(&config, FeignRng::seeded(3));
        let indicator = factory.create_random("x");
        let snapshot = indicator.snapshot();
        assert_eq!(snapshot.is_stuck, None);
        assert_eq!(snapshot.direction, None);
        assert!(snapshot.children.is_empty());
    }

    #[test]
    fn same_seed_builds_the_same_random_sequence() {
        let mut first = IndicatorFactory::new(&EngineConfig::default(), FeignRng::seeded(77));
        let mut second = IndicatorFactory::new(&EngineConfig::default(), FeignRng::seeded(77));
        for index in 0..10 {
            let label = format!("bar {index}");
            let left = first.create_random(&label).snapshot();
            let right = second.create_random(&label).snapshot();
            assert_eq!(left, right);
        }
    }
}
