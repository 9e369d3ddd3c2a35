use glam::{Vec2, Vec3};
use hop_core::input::{InputState, Key};
use hop_core::lighting::{ColorGrading, LightingMode, LightingRequest};

/// Everything the level needs from the keyboard for one frame, captured once
/// so update code never polls raw key state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// -1 (A) .. 1 (D)
    pub move_x: f32,
    /// -1 (S) .. 1 (W)
    pub move_y: f32,
    pub toggle_camera: bool,
    pub lighting: LightingRequest,
}

/// Hotkeys 1-5 in order.
const LIGHTING_KEYS: [(Key, LightingMode); 5] = [
    (Key::Digit1, LightingMode::None),
    (Key::Digit2, LightingMode::AmbientOnly),
    (Key::Digit3, LightingMode::SpecularOnly),
    (Key::Digit4, LightingMode::AmbientSpecular),
    (Key::Digit5, LightingMode::AmbientSpecularCustom),
];

const GRADING_KEYS: [(Key, ColorGrading); 3] = [
    (Key::Digit8, ColorGrading::Warm),
    (Key::Digit9, ColorGrading::Cool),
    (Key::Digit0, ColorGrading::Custom),
];

impl FrameInput {
    pub fn from_input(input: &InputState) -> Self {
        // When several mode keys land on one frame the highest key wins.
        let mode = LIGHTING_KEYS
            .iter()
            .filter(|(key, _)| input.is_just_pressed(*key))
            .map(|&(_, mode)| mode)
            .last();
        let grading = GRADING_KEYS
            .iter()
            .filter(|(key, _)| input.is_just_pressed(*key))
            .map(|&(_, grading)| grading)
            .last();

        Self {
            move_x: input.axis(Key::A, Key::D),
            move_y: input.axis(Key::S, Key::W),
            toggle_camera: input.is_just_pressed(Key::F),
            lighting: LightingRequest {
                mode,
                toggle_diffuse_ramp: input.is_just_pressed(Key::Digit6),
                toggle_specular_ramp: input.is_just_pressed(Key::Digit7),
                grading,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Units/second along each held axis.
    pub move_speed: f32,
    /// Camera position relative to the player in follow mode.
    pub follow_offset: Vec3,
    pub fixed_position: Vec3,
    pub fixed_target: Vec3,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            follow_offset: Vec3::new(0.0, -3.0, 4.5),
            fixed_position: Vec3::new(-9.0, -6.0, 15.0),
            fixed_target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    #[default]
    Follow,
    Fixed,
}

impl CameraMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Follow => "follow player",
            Self::Fixed => "fixed overview",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Follow => Self::Fixed,
            Self::Fixed => Self::Follow,
        }
    }
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerController {
    pub config: ControllerConfig,
    pub camera_mode: CameraMode,
}

impl PlayerController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            camera_mode: CameraMode::default(),
        }
    }

    /// Move the player in the ground plane. Height is left untouched.
    pub fn step(&self, input: &FrameInput, dt: f32, position: Vec3) -> Vec3 {
        let axes = Vec2::new(input.move_x, input.move_y);
        let delta = axes * self.config.move_speed * dt;
        position + delta.extend(0.0)
    }

    pub fn toggle_camera(&mut self) -> CameraMode {
        self.camera_mode = self.camera_mode.next();
        self.camera_mode
    }

    pub fn camera_pose(&self, player: Vec3) -> CameraPose {
        match self.camera_mode {
            CameraMode::Follow => CameraPose {
                position: player + self.config.follow_offset,
                target: player,
            },
            CameraMode::Fixed => CameraPose {
                position: self.config.fixed_position,
                target: self.config.fixed_target,
            },
        }
    }
}
