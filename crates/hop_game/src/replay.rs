use fastrand::Rng;
use hop_core::input::{InputState, Key};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::controller::FrameInput;
use crate::level::DemoLevel;
use crate::scene::Scene;

/// Scripted keyboard input for a headless run. Each frame lists the keys held
/// during it; press/release edges come from the difference between frames.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    /// Seeds the hop rest sampler so a run can be reproduced exactly.
    #[serde(default)]
    pub seed: Option<u64>,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// One key set per simulated frame.
    pub fn expanded_frames(&self) -> Vec<HashSet<Key>> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let keys: HashSet<Key> = frame.keys.iter().copied().collect();
            for _ in 0..frame.repeat.max(1) {
                out.push(keys.clone());
            }
        }
        out
    }

    /// Drive `level` through every frame at `fixed_dt`. Returns the number of
    /// frames simulated; a held Escape stops the run early.
    pub fn run(&self, level: &mut DemoLevel, scene: &mut Scene, rng: &mut Rng) -> usize {
        let mut input = InputState::new();
        let mut frames = 0;
        for keys in self.expanded_frames() {
            input.set_held(&keys);
            if input.is_held(Key::Escape) {
                log::info!("Replay stopped by Escape after {frames} frames");
                break;
            }
            let frame = FrameInput::from_input(&input);
            level.update(self.fixed_dt, &frame, scene, rng);
            input.end_frame();
            frames += 1;
        }
        frames
    }
}

/// Read a replay script. Key names outside `Key` fail the parse.
pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read replay script {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw).map_err(|e| {
        format!(
            "Failed to parse replay script {} (frames hold key-name lists): {e}",
            path.display()
        )
    })?;
    check_replay(&replay).map_err(|e| format!("Replay script {} rejected: {e}", path.display()))?;
    Ok(replay)
}

fn check_replay(replay: &ReplaySequence) -> Result<(), String> {
    if !replay.fixed_dt.is_finite() || replay.fixed_dt <= 0.0 {
        return Err(format!(
            "frame step fixed_dt must be a positive number of seconds, got {}",
            replay.fixed_dt
        ));
    }
    if replay.frames.is_empty() {
        return Err("no key-set frames to play".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

/// A key set listed once is held for one frame.
const fn default_repeat() -> u32 {
    1
}
