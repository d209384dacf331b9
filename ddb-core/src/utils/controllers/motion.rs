//! Motion controller: operator intent in, wheel speeds out.

use crate::utils::config::ControllerConfig;
use crate::utils::math::mixing::{ArcadeMixer, DriveCommand, JoystickInput};

/// PWM magnitude for each operator-selectable speed level.
const LEVEL_SPEEDS: [i32; 5] = [100, 140, 180, 220, 255];

/// Discrete speed level `1..=5` used by the single-byte grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    pub const DEFAULT: Self = Self(3);

    /// `None` unless `level` is in `1..=5`.
    pub fn from_digit(level: u8) -> Option<Self> {
        (1..=LEVEL_SPEEDS.len() as u8)
            .contains(&level)
            .then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// PWM magnitude driven at this level.
    pub fn speed(self) -> i32 {
        LEVEL_SPEEDS[(self.0 - 1) as usize]
    }
}

impl Default for SpeedLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Movement requests the controller knows how to turn into wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionIntent {
    /// Explicit per-wheel speeds.
    Direct { left: i32, right: i32 },
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    Stop,
    Joystick(JoystickInput),
}

/// Maps a [`MotionIntent`] to a clamped [`DriveCommand`].
#[derive(Debug, Clone)]
pub struct MotionController {
    level: SpeedLevel,
    mixer: ArcadeMixer,
}

impl MotionController {
    pub fn new(config: &ControllerConfig) -> Self {
        let level = SpeedLevel::from_digit(config.speed_level).unwrap_or_else(|| {
            tracing::warn!(
                level = config.speed_level,
                "invalid speed level in config, using default"
            );
            SpeedLevel::DEFAULT
        });
        Self {
            level,
            mixer: ArcadeMixer::new(
                config.stick_axis_max,
                config.stick_dead_zone,
                config.boost_threshold,
            ),
        }
    }

    pub fn level(&self) -> SpeedLevel {
        self.level
    }

    /// Select a new speed level; takes effect with the next motion command.
    pub fn set_level(
        &mut self,
        level: SpeedLevel,
    ) {
        tracing::info!(level = level.level(), "speed level selected");
        self.level = level;
    }

    pub fn resolve(
        &self,
        intent: MotionIntent,
    ) -> DriveCommand {
        let speed = self.level.speed();
        match intent {
            MotionIntent::Direct { left, right } => DriveCommand::new(left, right),
            MotionIntent::Forward => DriveCommand::straight(speed),
            MotionIntent::Backward => DriveCommand::straight(-speed),
            MotionIntent::RotateLeft => DriveCommand::spin(-speed),
            MotionIntent::RotateRight => DriveCommand::spin(speed),
            MotionIntent::Stop => DriveCommand::STOP,
            MotionIntent::Joystick(input) => self.mixer.mix(input),
        }
    }
}
