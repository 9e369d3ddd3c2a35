//! Hop Scene -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Each
//! `RedrawRequested` is one variable-step frame:
//!
//!   1. `begin_frame()` -- measure the capped wall-clock delta
//!   2. Capture one `FrameInput` from the keyboard state
//!   3. `DemoLevel::update` -- player, camera, lighting, hoppers
//!   4. Clear edge-triggered input
//!
//! The level is built procedurally on first launch and saved as
//! `scene.json` + `scene-manifest.json`; with `LOAD_SCENE_FROM_DISK` set, later
//! launches load those files instead. `--replay <file>` runs the same update
//! path headlessly from scripted input and saves the end state to
//! `scene-replay.json`.

mod assets;
mod controller;
mod hopping;
mod level;
mod replay;
mod scene;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fastrand::Rng;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::AssetStore;
use controller::FrameInput;
use hop_core::hop::HopPhase;
use hop_core::input::{InputState, Key};
use hop_core::time::FrameClock;
use hop_platform::window::PlatformConfig;
use level::DemoLevel;
use replay::load_replay_from_path;
use scene::Scene;

const SCENE_PATH: &str = "scene.json";
const MANIFEST_PATH: &str = "scene-manifest.json";
/// Headless runs save their final state here, leaving the built level intact.
const REPLAY_SCENE_PATH: &str = "scene-replay.json";
const LOAD_SCENE_FROM_DISK: bool = false;

#[derive(Debug, PartialEq)]
enum LaunchMode {
    Windowed,
    Headless { replay_path: PathBuf },
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<LaunchMode, String> {
    let mut args = args.into_iter();
    let mut mode = LaunchMode::Windowed;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--replay" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--replay expects a path to a replay JSON file".to_string())?;
                mode = LaunchMode::Headless {
                    replay_path: PathBuf::from(path),
                };
            }
            other => {
                return Err(format!(
                    "Unknown argument '{other}'. Usage: hop_game [--replay <replay.json>]"
                ))
            }
        }
    }
    Ok(mode)
}

/// All mutable per-run state. Constructed in `ApplicationHandler::resumed`
/// once the window exists.
struct EngineState {
    window: Arc<Window>,
    clock: FrameClock,
    input: InputState,
    rng: Rng,
    assets: AssetStore,
    scene: Scene,
    level: DemoLevel,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Result<Self, String> {
        let (assets, scene, level) = DemoLevel::load_or_build(
            Path::new(SCENE_PATH),
            Path::new(MANIFEST_PATH),
            LOAD_SCENE_FROM_DISK,
        )?;
        Ok(Self {
            window,
            clock: FrameClock::new(),
            input: InputState::new(),
            rng: Rng::new(),
            assets,
            scene,
            level,
        })
    }

    fn frame(&mut self) {
        let dt = self.clock.begin_frame();
        let frame = FrameInput::from_input(&self.input);
        self.level.update(dt, &frame, &mut self.scene, &mut self.rng);
        self.input.end_frame();
    }
}

#[derive(Default)]
struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
    failed: bool,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let started = hop_platform::window::create_window(event_loop, &self.config)
            .and_then(EngineState::new);
        match started {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.input.is_just_pressed(Key::Escape) {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                state.frame();
                if state.clock.frame_count % 600 == 0 {
                    log::debug!(
                        "{:.1} fps ({:.2} ms), {} objects, {} assets",
                        state.clock.smoothed_fps,
                        state.clock.smoothed_frame_time_ms,
                        state.scene.len(),
                        state.assets.len()
                    );
                }
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyF => Some(Key::F),
        KeyCode::Digit1 => Some(Key::Digit1),
        KeyCode::Digit2 => Some(Key::Digit2),
        KeyCode::Digit3 => Some(Key::Digit3),
        KeyCode::Digit4 => Some(Key::Digit4),
        KeyCode::Digit5 => Some(Key::Digit5),
        KeyCode::Digit6 => Some(Key::Digit6),
        KeyCode::Digit7 => Some(Key::Digit7),
        KeyCode::Digit8 => Some(Key::Digit8),
        KeyCode::Digit9 => Some(Key::Digit9),
        KeyCode::Digit0 => Some(Key::Digit0),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

fn run_windowed() -> Result<(), String> {
    let event_loop = EventLoop::new().map_err(|e| format!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    event_loop
        .run_app(&mut app)
        .map_err(|e| format!("Event loop error: {e}"))?;
    if app.failed {
        return Err("Hop Scene exited after a startup failure".to_string());
    }
    Ok(())
}

/// Paths a headless run reads the level from and writes its end state to.
struct HeadlessPaths<'a> {
    scene: &'a Path,
    manifest: &'a Path,
    output: &'a Path,
}

fn run_headless(replay_path: &Path, paths: &HeadlessPaths) -> Result<(), String> {
    let replay = load_replay_from_path(replay_path)?;
    let (_assets, mut scene, mut level) =
        DemoLevel::load_or_build(paths.scene, paths.manifest, LOAD_SCENE_FROM_DISK)?;
    let mut rng = match replay.seed {
        Some(seed) => Rng::with_seed(seed),
        None => Rng::new(),
    };

    let frames = replay.run(&mut level, &mut scene, &mut rng);
    log::info!(
        "Replay {} finished: {frames} frames at {}s",
        replay_path.display(),
        replay.fixed_dt
    );
    if let Some(player) = scene.position(level.player) {
        log::info!("Player at ({:.3}, {:.3}, {:.3})", player.x, player.y, player.z);
    }
    log::info!("Camera: {} | Lighting: {}", level.controller.camera_mode, level.lighting);
    log::info!(
        "Hoppers: {} idle, {} rising, {} falling",
        level.hoppers.count_in(HopPhase::Idle),
        level.hoppers.count_in(HopPhase::Rising),
        level.hoppers.count_in(HopPhase::Falling)
    );
    for entity in level.hoppers.entities() {
        let (Some(object), Some(timer), Some(world)) = (
            scene.object(entity),
            level.hoppers.get(entity),
            scene.world_position(entity),
        ) else {
            continue;
        };
        log::info!("  {:<22} {:<8} height {:.3}", object.name, timer.phase(), world.z);
    }

    scene.save(paths.output)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Hop Scene starting...");

    let result = parse_args(std::env::args().skip(1)).and_then(|mode| match mode {
        LaunchMode::Windowed => run_windowed(),
        LaunchMode::Headless { replay_path } => run_headless(
            &replay_path,
            &HeadlessPaths {
                scene: Path::new(SCENE_PATH),
                manifest: Path::new(MANIFEST_PATH),
                output: Path::new(REPLAY_SCENE_PATH),
            },
        ),
    });
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hop_main_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_opens_a_window() {
        assert_eq!(parse_args(args(&[])), Ok(LaunchMode::Windowed));
    }

    #[test]
    fn replay_argument_selects_headless_mode() {
        assert_eq!(
            parse_args(args(&["--replay", "runs/walk.json"])),
            Ok(LaunchMode::Headless {
                replay_path: PathBuf::from("runs/walk.json")
            })
        );
    }

    #[test]
    fn replay_without_path_is_rejected() {
        let err = parse_args(args(&["--replay"])).expect_err("missing path");
        assert!(err.contains("--replay expects a path"));
        assert!(parse_args(args(&["--fullscreen"])).is_err());
    }

    #[test]
    fn headless_run_leaves_built_scene_untouched() {
        let replay_path = temp_file_path("replay");
        let scene_path = temp_file_path("scene");
        let manifest_path = temp_file_path("manifest");
        let output_path = temp_file_path("output");
        fs::write(
            &replay_path,
            r#"{ "fixed_dt": 0.1, "seed": 9, "frames": [ { "keys": ["d"], "repeat": 5 } ] }"#,
        )
        .expect("write replay file");

        run_headless(
            &replay_path,
            &HeadlessPaths {
                scene: &scene_path,
                manifest: &manifest_path,
                output: &output_path,
            },
        )
        .expect("headless run");

        let built = scene::load_scene_from_path(&scene_path).expect("built scene");
        let replayed = scene::load_scene_from_path(&output_path).expect("replay scene");
        let built_player = built
            .find_by_name(level::PLAYER_NAME)
            .and_then(|id| built.position(id))
            .expect("built player");
        let replayed_player = replayed
            .find_by_name(level::PLAYER_NAME)
            .and_then(|id| replayed.position(id))
            .expect("replayed player");
        assert_eq!(built_player.x, 1.5);
        assert!((replayed_player.x - 4.0).abs() < 1e-4);

        for path in [replay_path, scene_path, manifest_path, output_path] {
            let _ = fs::remove_file(path);
        }
    }

    #[test]
    fn every_engine_key_has_a_physical_key() {
        let mapped: Vec<Key> = [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::KeyF,
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
            KeyCode::Digit6,
            KeyCode::Digit7,
            KeyCode::Digit8,
            KeyCode::Digit9,
            KeyCode::Digit0,
            KeyCode::Escape,
        ]
        .into_iter()
        .filter_map(map_key)
        .collect();
        assert_eq!(mapped.as_slice(), Key::ALL);
        assert_eq!(map_key(KeyCode::Space), None);
    }
}
