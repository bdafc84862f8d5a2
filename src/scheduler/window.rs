use chrono::{DateTime, Local, Timelike};
use rand::Rng;
use std::time::Duration;

/// Local hours during which the proactive path stays silent. A window whose
/// start is after its end wraps midnight; equal bounds mean never quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietWindow {
    start: u32,
    end: u32,
}

impl QuietWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start > self.end {
            hour >= self.start || hour < self.end
        } else {
            self.start <= hour && hour < self.end
        }
    }

    pub fn is_quiet(&self, now: DateTime<Local>) -> bool {
        self.contains_hour(now.hour())
    }
}

/// Uniformly random delay between ticks, re-rolled for every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInterval {
    min: Duration,
    max: Duration,
}

impl TickInterval {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        Duration::from_secs_f64(rng.random_range(self.min.as_secs_f64()..=self.max.as_secs_f64()))
    }

    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::rng())
    }
}
