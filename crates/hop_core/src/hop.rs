//! Per-entity idle/hop timer.
//!
//! Each hopping entity owns one `HopTimer`. The timer cycles through three
//! phases driven only by the frame delta and the entity's current height:
//!
//!   Idle    -- `cooldown` ticks down; at `<= 0` the hop starts this same frame
//!   Rising  -- height climbs at `speed` until it reaches `peak_height`
//!   Falling -- height drops at `speed` until it reaches `base_height`,
//!              then a fresh rest cooldown is drawn from `rest_range`
//!
//! Rise and fall are position-driven, not time-driven, so a full hop takes
//! `(peak - base) / speed` seconds each way regardless of frame size. Height
//! changes are clamped to `[base_height, peak_height]`; a large `dt` lands on
//! the bound instead of overshooting it.

use fastrand::Rng;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopConfig {
    pub base_height: f32,
    pub peak_height: f32,
    /// Vertical speed in units/second, shared by rise and fall.
    pub speed: f32,
    /// Rest cooldown is drawn uniformly from this inclusive range on landing.
    pub rest_range: (f32, f32),
    /// Value written to `cooldown` when a hop starts. It is overwritten on
    /// landing before it is ever read.
    pub rise_reset: f32,
}

impl Default for HopConfig {
    fn default() -> Self {
        Self {
            base_height: 1.0,
            peak_height: 1.5,
            speed: 4.0,
            rest_range: (0.1, 0.5),
            rise_reset: 0.2,
        }
    }
}

impl HopConfig {
    /// Time one leg (rise or fall) takes with an infinitely small frame.
    pub fn leg_duration(&self) -> f32 {
        (self.peak_height - self.base_height) / self.speed
    }

    pub fn sample_rest(&self, rng: &mut Rng) -> f32 {
        let (min, max) = self.rest_range;
        min + rng.f32() * (max - min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HopPhase {
    #[default]
    Idle,
    Rising,
    Falling,
}

impl HopPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rising => "rising",
            Self::Falling => "falling",
        }
    }
}

impl std::fmt::Display for HopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Result of one `advance` call: how far to move the entity vertically and
/// which phase the timer ended the frame in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopStep {
    pub height_delta: f32,
    pub phase: HopPhase,
}

#[derive(Debug, Clone)]
pub struct HopTimer {
    cooldown: f32,
    phase: HopPhase,
    config: HopConfig,
}

impl HopTimer {
    pub fn new(initial_cooldown: f32) -> Self {
        Self::with_config(initial_cooldown, HopConfig::default())
    }

    pub fn with_config(initial_cooldown: f32, config: HopConfig) -> Self {
        Self {
            cooldown: initial_cooldown,
            phase: HopPhase::Idle,
            config,
        }
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn phase(&self) -> HopPhase {
        self.phase
    }

    pub fn config(&self) -> &HopConfig {
        &self.config
    }

    /// Advance one frame. `current_height` is the entity's vertical coordinate
    /// before this frame; the caller applies `height_delta` to it.
    pub fn advance(&mut self, dt: f32, current_height: f32, rng: &mut Rng) -> HopStep {
        if self.phase == HopPhase::Idle {
            if self.cooldown > 0.0 {
                self.cooldown -= dt;
            }
            if self.cooldown > 0.0 {
                return HopStep {
                    height_delta: 0.0,
                    phase: HopPhase::Idle,
                };
            }
            self.phase = HopPhase::Rising;
            self.cooldown = self.config.rise_reset;
            log::debug!("hop: idle -> rising at height {current_height:.3}");
        }

        let cfg = self.config;
        let mut height = current_height;
        match self.phase {
            HopPhase::Rising => {
                if height < cfg.peak_height {
                    height = (height + cfg.speed * dt).min(cfg.peak_height);
                }
                if height >= cfg.peak_height {
                    self.phase = HopPhase::Falling;
                    log::debug!("hop: rising -> falling");
                }
            }
            HopPhase::Falling => {
                if height > cfg.base_height {
                    height = (height - cfg.speed * dt).max(cfg.base_height);
                }
                if height <= cfg.base_height {
                    self.phase = HopPhase::Idle;
                    self.cooldown = cfg.sample_rest(rng);
                    log::debug!("hop: falling -> idle, resting {:.3}s", self.cooldown);
                }
            }
            // Left above, either by returning or by entering Rising.
            HopPhase::Idle => {}
        }

        HopStep {
            height_delta: height - current_height,
            phase: self.phase,
        }
    }

    /// Advance one frame and apply the result to `position.z` in place.
    pub fn tick(&mut self, dt: f32, position: &mut Vec3, rng: &mut Rng) -> HopPhase {
        let step = self.advance(dt, position.z, rng);
        position.z += step.height_delta;
        step.phase
    }
}
