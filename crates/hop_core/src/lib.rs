pub mod hop;
pub mod input;
pub mod lighting;
pub mod time;

pub use hop::{HopConfig, HopPhase, HopStep, HopTimer};
pub use input::{InputState, Key};
pub use lighting::{ColorGrading, LightingMode, LightingRequest, LightingState};
pub use time::FrameClock;
