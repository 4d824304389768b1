//! Random piecewise-linear drive plan.
//!
//! The robot picks random target duties for both wheels and a random time to
//! reach them, ramps linearly towards them, then picks the next target. The
//! varied motion gives the training data a wide spread of turn rates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MotionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycles {
    pub left: u8,
    pub right: u8,
}

/// One stage of the drive plan. `end_time > start_time` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionProfile {
    pub start_time: u32,
    pub start_left: u8,
    pub start_right: u8,
    pub end_time: u32,
    pub end_left: u8,
    pub end_right: u8,
}

impl MotionProfile {
    /// Fraction of the stage completed at `now`, in [0, 1].
    pub fn progress(&self, now: u32) -> f64 {
        let elapsed = now.saturating_sub(self.start_time) as f64;
        let length = self.end_time.saturating_sub(self.start_time).max(1) as f64;
        (elapsed / length).clamp(0.0, 1.0)
    }

    /// Interpolated duties at `now`, rounded and clamped to [min_duty, max_duty].
    pub fn duty_at(&self, now: u32, min_duty: u8, max_duty: u8) -> DutyCycles {
        let s = self.progress(now);
        let lerp = |start: u8, end: u8| {
            let duty = (start as f64 + s * (end as f64 - start as f64)).round();
            duty.clamp(min_duty as f64, max_duty as f64) as u8
        };
        DutyCycles {
            left: lerp(self.start_left, self.end_left),
            right: lerp(self.start_right, self.end_right),
        }
    }
}

pub struct MotionProfileGenerator<R = StdRng> {
    profile: MotionProfile,
    config: MotionConfig,
    rng: R,
}

impl MotionProfileGenerator<StdRng> {
    /// Seeded from `config.seed` when set, otherwise from OS entropy.
    pub fn from_config(config: &MotionConfig, now: u32) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(config, now, rng)
    }
}

impl<R: Rng> MotionProfileGenerator<R> {
    /// Start both wheels at the initial duty and draw the first target.
    pub fn new(config: &MotionConfig, now: u32, rng: R) -> Self {
        let placeholder = MotionProfile {
            start_time: now,
            start_left: config.initial_duty,
            start_right: config.initial_duty,
            end_time: now,
            end_left: config.initial_duty,
            end_right: config.initial_duty,
        };
        let mut generator = Self::with_profile(placeholder, config, rng);
        generator.draw_target(now);
        generator
    }

    pub fn with_profile(profile: MotionProfile, config: &MotionConfig, rng: R) -> Self {
        Self {
            profile,
            config: config.clone(),
            rng,
        }
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    /// Duties to apply at `now`. Moves on to a new stage first when the
    /// current one has ended.
    pub fn tick(&mut self, now: u32) -> DutyCycles {
        if now > self.profile.end_time {
            self.profile.start_time = self.profile.end_time;
            self.profile.start_left = self.profile.end_left;
            self.profile.start_right = self.profile.end_right;
            self.draw_target(now);

            log::debug!(
                "New drive stage: left {} -> {}, right {} -> {}, until t={}ms",
                self.profile.start_left,
                self.profile.end_left,
                self.profile.start_right,
                self.profile.end_right,
                self.profile.end_time
            );
        }

        self.profile
            .duty_at(now, self.config.min_duty, self.config.max_duty)
    }

    fn draw_target(&mut self, now: u32) {
        let config = &self.config;
        let stage_ms = self
            .rng
            .random_range(config.min_stage_ms..config.max_stage_ms);
        // Saturates instead of wrapping: the plan holds its last stage once the
        // u32 millisecond clock passes ~49 days, while the tick gate keeps going.
        self.profile.end_time = now.saturating_add(stage_ms);
        self.profile.end_left = self.rng.random_range(config.min_duty..=config.max_duty);
        self.profile.end_right = self.rng.random_range(config.min_duty..=config.max_duty);
    }
}
