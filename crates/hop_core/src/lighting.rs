/// Which lighting terms the scene shader evaluates. Selected with keys 1-5.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightingMode {
    None,
    AmbientOnly,
    SpecularOnly,
    #[default]
    AmbientSpecular,
    /// Ambient + specular + the custom toon pass.
    AmbientSpecularCustom,
}

impl LightingMode {
    /// All modes in hotkey order (key 1 is index 0).
    pub const ALL: &'static [LightingMode] = &[
        LightingMode::None,
        LightingMode::AmbientOnly,
        LightingMode::SpecularOnly,
        LightingMode::AmbientSpecular,
        LightingMode::AmbientSpecularCustom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "No lighting",
            Self::AmbientOnly => "Ambient only",
            Self::SpecularOnly => "Specular only",
            Self::AmbientSpecular => "Ambient + specular",
            Self::AmbientSpecularCustom => "Ambient + specular + custom",
        }
    }

    /// Integer passed to the shader as `u_LightingMode`.
    pub fn shader_index(self) -> i32 {
        match self {
            Self::None => 0,
            Self::AmbientOnly => 1,
            Self::SpecularOnly => 2,
            Self::AmbientSpecular => 3,
            Self::AmbientSpecularCustom => 4,
        }
    }
}

impl std::fmt::Display for LightingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-process color grading, applied through a 3D lookup table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorGrading {
    #[default]
    Neutral,
    Warm,
    Cool,
    Custom,
}

impl ColorGrading {
    pub const ALL: &'static [ColorGrading] = &[
        ColorGrading::Neutral,
        ColorGrading::Warm,
        ColorGrading::Cool,
        ColorGrading::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Custom => "Custom",
        }
    }

    pub fn shader_index(self) -> i32 {
        match self {
            Self::Neutral => 0,
            Self::Warm => 1,
            Self::Cool => 2,
            Self::Custom => 3,
        }
    }

    /// Selecting the active grading again switches grading off.
    pub fn toggled(self, requested: ColorGrading) -> Self {
        if self == requested {
            Self::Neutral
        } else {
            requested
        }
    }
}

impl std::fmt::Display for ColorGrading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Complete render-facing lighting state. Replaces a scatter of global flags
/// with one value that changes only through `apply`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LightingState {
    pub mode: LightingMode,
    pub diffuse_ramp: bool,
    pub specular_ramp: bool,
    pub grading: ColorGrading,
}

/// One frame's worth of lighting hotkey requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LightingRequest {
    pub mode: Option<LightingMode>,
    pub toggle_diffuse_ramp: bool,
    pub toggle_specular_ramp: bool,
    pub grading: Option<ColorGrading>,
}

impl LightingRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl LightingState {
    /// Apply a request. Returns true when anything changed.
    pub fn apply(&mut self, request: LightingRequest) -> bool {
        let before = *self;
        if let Some(mode) = request.mode {
            self.mode = mode;
        }
        if request.toggle_diffuse_ramp {
            self.diffuse_ramp = !self.diffuse_ramp;
        }
        if request.toggle_specular_ramp {
            self.specular_ramp = !self.specular_ramp;
        }
        if let Some(grading) = request.grading {
            self.grading = self.grading.toggled(grading);
        }
        *self != before
    }
}

impl std::fmt::Display for LightingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | diffuse ramp {} | specular ramp {} | grading {}",
            self.mode,
            if self.diffuse_ramp { "on" } else { "off" },
            if self.specular_ramp { "on" } else { "off" },
            self.grading
        )
    }
}
