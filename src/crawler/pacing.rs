//! Adaptive delay between page requests
//!
//! The delay grows with the error count when errors outnumber successes and
//! shrinks with the success count otherwise. A uniform jitter in [0.8, 1.2]
//! is applied and the result is clamped to the configured bounds.

use crate::config::PacingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const ERROR_STEP: f64 = 0.1;
const SUCCESS_STEP: f64 = 0.05;
const JITTER_LOW: f64 = 0.8;
const JITTER_HIGH: f64 = 1.2;

/// Delay bounds shared by every pacing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayBounds {
    pub min: Duration,
    pub max: Duration,
}

impl DelayBounds {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Caps at `max` last, so inverted bounds yield `max` instead of panicking
    pub fn clamp(&self, delay: Duration) -> Duration {
        delay.max(self.min).min(self.max)
    }
}

/// Delay before jitter, from the base delay and the extraction counters
pub fn pressure_delay(
    base: Duration,
    bounds: DelayBounds,
    errors: u32,
    successes: u32,
) -> Duration {
    let base = base.as_secs_f64();
    let seconds = if errors > successes {
        (base * (1.0 + f64::from(errors) * ERROR_STEP)).min(bounds.max.as_secs_f64())
    } else {
        (base * (1.0 - f64::from(successes) * SUCCESS_STEP)).max(bounds.min.as_secs_f64())
    };
    duration_from_secs(seconds)
}

/// Final delay: pressure delay times `jitter`, clamped to the bounds
pub fn jittered_delay(
    base: Duration,
    bounds: DelayBounds,
    errors: u32,
    successes: u32,
    jitter: f64,
) -> Duration {
    let pressured = pressure_delay(base, bounds, errors, successes).as_secs_f64();
    bounds.clamp(duration_from_secs(pressured * jitter))
}

/// Computes delays and row jitter from a (seedable) random source
///
/// Holds no crawl state: every decision is a function of its arguments and
/// the RNG stream.
#[derive(Debug)]
pub struct PacingController {
    bounds: DelayBounds,
    row_jitter: (Duration, Duration),
    rng: StdRng,
}

impl PacingController {
    pub fn new(bounds: DelayBounds, row_jitter: (Duration, Duration), rng: StdRng) -> Self {
        Self {
            bounds,
            row_jitter,
            rng,
        }
    }

    /// Builds a controller from config; a configured seed makes it deterministic
    pub fn from_config(config: &PacingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(
            DelayBounds::new(config.min_delay(), config.max_delay()),
            (
                Duration::from_millis(config.row_jitter_min_ms),
                Duration::from_millis(config.row_jitter_max_ms),
            ),
            rng,
        )
    }

    pub fn bounds(&self) -> DelayBounds {
        self.bounds
    }

    /// Clamps a caller-supplied base delay into the configured bounds
    pub fn bound_base(&self, base: Duration) -> Duration {
        self.bounds.clamp(base)
    }

    /// Delay before the next page request
    pub fn next_delay(&mut self, base: Duration, errors: u32, successes: u32) -> Duration {
        let jitter = self.rng.gen_range(JITTER_LOW..=JITTER_HIGH);
        let delay = jittered_delay(base, self.bounds, errors, successes, jitter);
        tracing::debug!(
            "Pacing delay {:.2}s (errors={}, successes={}, jitter={:.3})",
            delay.as_secs_f64(),
            errors,
            successes,
            jitter
        );
        delay
    }

    /// Short random pause between two row extractions
    pub fn row_pause(&mut self) -> Duration {
        let (low, high) = self.row_jitter;
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

fn duration_from_secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}
