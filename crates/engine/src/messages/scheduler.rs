use thiserror::Error;
use tracing::debug;

use crate::rng::FeignRng;

use super::{FakeMessage, FakeMessageGenerator};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("message delay must be >= 0 ticks, got {delay}")]
    NegativeDelay { delay: i64 },
    #[error("delay range [{min}, {max}] is inverted")]
    InvertedRange { min: i64, max: i64 },
}

#[derive(Debug, Clone)]
struct ScheduledEntry {
    target_tick: u64,
    message: FakeMessage,
}

/// Queues pre-generated messages against a logical tick counter and releases
/// them when their tick arrives. Message randomness is resolved at schedule
/// time, never at release time, so recorded schedules replay exactly.
pub struct MessageScheduler {
    pending: Vec<ScheduledEntry>,
    tick_count: u64,
    rng: FeignRng,
}

impl MessageScheduler {
    pub fn new(rng: FeignRng) -> Self {
        Self {
            pending: Vec::new(),
            tick_count: 0,
            rng,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.tick_count
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Generates a message now and queues it `delay` ticks ahead. A zero
    /// delay releases on the very next `tick()`, never at schedule time.
    pub fn schedule_message(
        &mut self,
        generator: &mut FakeMessageGenerator,
        delay: i64,
        category: &str,
    ) -> Result<(), ScheduleError> {
        if delay < 0 {
            return Err(ScheduleError::NegativeDelay { delay });
        }
        let message = generator.generate(category);
        let target_tick = self.tick_count + delay as u64;
        debug!(category, target_tick, "scheduled fake message");
        self.pending.push(ScheduledEntry {
            target_tick,
            message,
        });
        Ok(())
    }

    /// Integer delay drawn uniformly from `[min_delay, max_delay]` inclusive.
    pub fn schedule_random(
        &mut self,
        generator: &mut FakeMessageGenerator,
        min_delay: i64,
        max_delay: i64,
        category: &str,
    ) -> Result<(), ScheduleError> {
        if min_delay < 0 {
            return Err(ScheduleError::NegativeDelay { delay: min_delay });
        }
        if max_delay < min_delay {
            return Err(ScheduleError::InvertedRange {
                min: min_delay,
                max: max_delay,
            });
        }
        let delay = self.rng.int_inclusive(min_delay, max_delay);
        self.schedule_message(generator, delay, category)
    }

    /// Advances the clock by exactly one tick and returns the messages whose
    /// tick has arrived, in their original scheduling order.
    pub fn tick(&mut self) -> Vec<FakeMessage> {
        self.tick_count += 1;
        let mut ready = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for entry in std::mem::take(&mut self.pending) {
            if entry.target_tick <= self.tick_count {
                ready.push(entry.message);
            } else {
                still_pending.push(entry);
            }
        }
        self.pending = still_pending;
        ready
    }

    /// Drops every pending entry. The tick counter is deliberately untouched.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
