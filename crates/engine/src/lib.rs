pub mod config;
pub mod messages;
pub mod progress;
mod rng;

pub use config::{
    load_config, parse_config, BehaviorWeights, ConfigError, EngineConfig, IndicatorTuning,
};
pub use messages::{
    FakeMessage, FakeMessageGenerator, MessageScheduler, ScheduleError, DEFAULT_FALLBACK_TEXT,
    DEFAULT_SEVERITY, FAKE_ERROR_TYPE, GENERIC_CATEGORY,
};
pub use progress::{
    BarStyle, FactoryError, IndicatorFactory, IndicatorKind, IndicatorSnapshot, NestedIndicator,
    OscillatingIndicator, ProgressIndicator, ReliableIndicator, StuckIndicator,
    UnreliableIndicator, UpdateError,
};
pub use rng::FeignRng;
