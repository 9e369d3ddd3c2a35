//! Variable-step frame clock.
//!
//! Every rendered frame produces one `dt` that all per-frame logic shares.
//! Wall-clock deltas are capped at `max_dt` so a stall (window drag, debugger
//! break) does not teleport the player or launch hoppers past their bounds.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

pub struct FrameClock {
    pub max_dt: f32,
    pub dt: f32,
    pub total_time: f64,
    pub frame_count: u64,
    last_instant: Instant,

    fps_samples: [f32; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f32,
    pub smoothed_frame_time_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            max_dt: 0.25,
            dt: 0.0,
            total_time: 0.0,
            frame_count: 0,
            last_instant: Instant::now(),
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Measure the wall-clock delta since the previous frame and advance by it.
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.advance(real_dt)
    }

    /// Advance by an externally supplied delta (replays, tests). Returns the
    /// delta actually used after capping.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let mut dt = real_dt.max(0.0);
        if dt > self.max_dt {
            log::warn!(
                "Frame took {:.1}ms, capping delta to {}ms",
                dt * 1000.0,
                self.max_dt * 1000.0
            );
            dt = self.max_dt;
        }

        self.dt = dt;
        self.total_time += dt as f64;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt = self.fps_samples.iter().sum::<f32>() / FPS_SAMPLE_COUNT as f32;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
