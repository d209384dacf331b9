//! Drive mixing for a two-wheeled differential-drive robot.
//!
//! Everything that turns an operator intent into a pair of wheel speeds lives
//! here: the clamp to the PWM range, arcade (forward/turn) mixing, stick dead
//! zones and the trigger boost.
//!
//! # Example
//! ```rust
//! use ddb_core::utils::math::mixing::{ArcadeMixer, JoystickInput};
//! let mixer = ArcadeMixer::new(128, 20, 10);
//! let cmd = mixer.mix(JoystickInput { x: 0, y: 128, trigger: 0 });
//! assert_eq!((cmd.left(), cmd.right()), (255, 255));
//! ```

/// Largest PWM magnitude a wheel can be driven with.
pub const MAX_SPEED: i32 = 255;
/// Largest turn contribution produced from the X stick axis.
pub const MAX_TURN: i32 = 200;
/// Full-scale value of an analog trigger.
pub const TRIGGER_FULL_SCALE: i32 = 255;

/// Clamp any integer to the signed PWM range `[-255, 255]`.
pub fn clamp_speed(v: i32) -> i16 {
    v.clamp(-MAX_SPEED, MAX_SPEED) as i16
}

/// Signed speeds for the left and right wheels.
///
/// The fields are private so every value in circulation has already been
/// clamped to `[-255, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    left: i16,
    right: i16,
}

impl DriveCommand {
    /// Both wheels stopped.
    pub const STOP: Self = Self { left: 0, right: 0 };

    /// Build a command, clamping each side to `[-255, 255]`.
    pub fn new(
        left: i32,
        right: i32,
    ) -> Self {
        Self {
            left: clamp_speed(left),
            right: clamp_speed(right),
        }
    }

    /// Both wheels at the same signed speed.
    pub fn straight(speed: i32) -> Self {
        Self::new(speed, speed)
    }

    /// Spin in place; positive `speed` turns clockwise (right).
    pub fn spin(speed: i32) -> Self {
        Self::new(speed, -speed)
    }

    pub fn left(&self) -> i16 {
        self.left
    }

    pub fn right(&self) -> i16 {
        self.right
    }

    pub fn is_stopped(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Raw values read from a game controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoystickInput {
    /// Stick X deflection, positive to the right.
    pub x: i16,
    /// Stick Y deflection, positive forward.
    pub y: i16,
    /// Analog trigger, `0..=255`.
    pub trigger: u8,
}

/// Arcade-style mixer: one stick axis drives forward speed, the other turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcadeMixer {
    /// Magnitude of a fully deflected stick axis.
    axis_max: i16,
    /// Deflections smaller than this are treated as zero.
    dead_zone: i16,
    /// Trigger values at or below this do not boost.
    boost_threshold: u8,
}

impl ArcadeMixer {
    pub fn new(
        axis_max: i16,
        dead_zone: i16,
        boost_threshold: u8,
    ) -> Self {
        Self {
            axis_max: axis_max.max(1),
            dead_zone,
            boost_threshold,
        }
    }

    /// Zero out deflections that fall inside the dead zone.
    pub fn apply_dead_zone(
        &self,
        v: i16,
    ) -> i16 {
        if v.unsigned_abs() < self.dead_zone.unsigned_abs() {
            0
        } else {
            v
        }
    }

    /// Linearly rescale an axis value from `±axis_max` onto `±out_max`.
    pub fn map_axis(
        &self,
        v: i16,
        out_max: i32,
    ) -> i32 {
        let max = self.axis_max as i32;
        (v as i32).clamp(-max, max) * out_max / max
    }

    /// Mix stick and trigger input into a clamped drive command.
    ///
    /// The boost is applied after the first clamp and followed by a second
    /// one, so a boosted command still never leaves `[-255, 255]`.
    pub fn mix(
        &self,
        input: JoystickInput,
    ) -> DriveCommand {
        let forward = self.map_axis(self.apply_dead_zone(input.y), MAX_SPEED);
        let turn = self.map_axis(self.apply_dead_zone(input.x), MAX_TURN);

        let mixed = DriveCommand::new(forward + turn, forward - turn);
        boost(mixed, input.trigger, self.boost_threshold)
    }
}

/// Scale both wheels by `1 + trigger / 255` when the trigger is past `threshold`.
pub fn boost(
    cmd: DriveCommand,
    trigger: u8,
    threshold: u8,
) -> DriveCommand {
    if trigger <= threshold {
        return cmd;
    }
    let scale = |v: i16| v as i32 * (TRIGGER_FULL_SCALE + trigger as i32) / TRIGGER_FULL_SCALE;
    DriveCommand::new(scale(cmd.left), scale(cmd.right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer() -> ArcadeMixer {
        ArcadeMixer::new(128, 20, 10)
    }

    #[test]
    fn test_new_clamps_both_sides() {
        let cmd = DriveCommand::new(300, -999);
        assert_eq!((cmd.left(), cmd.right()), (255, -255));
        let cmd = DriveCommand::new(i32::MAX, i32::MIN);
        assert_eq!((cmd.left(), cmd.right()), (255, -255));
    }

    #[test]
    fn test_spin_is_equal_and_opposite() {
        let cmd = DriveCommand::spin(-140);
        assert_eq!((cmd.left(), cmd.right()), (-140, 140));
    }

    #[test]
    fn test_dead_zone_zeroes_small_deflection() {
        let cmd = mixer().mix(JoystickInput {
            x: 19,
            y: -19,
            trigger: 0,
        });
        assert!(cmd.is_stopped());
    }

    #[test]
    fn test_full_forward_with_turn_saturates_outer_wheel() {
        let cmd = mixer().mix(JoystickInput {
            x: 64,
            y: 128,
            trigger: 0,
        });
        // forward 255, turn 100
        assert_eq!((cmd.left(), cmd.right()), (255, 155));
    }

    #[test]
    fn test_turn_only_spins() {
        let cmd = mixer().mix(JoystickInput {
            x: -128,
            y: 0,
            trigger: 0,
        });
        assert_eq!((cmd.left(), cmd.right()), (-200, 200));
    }

    #[test]
    fn test_boost_below_threshold_is_ignored() {
        let base = DriveCommand::new(100, -100);
        assert_eq!(boost(base, 10, 10), base);
    }

    #[test]
    fn test_boost_scales_and_reclamps() {
        let cmd = boost(DriveCommand::new(100, 200), 255, 10);
        assert_eq!((cmd.left(), cmd.right()), (200, 255));
    }

    #[test]
    fn test_mix_boosts_once() {
        let cmd = mixer().mix(JoystickInput {
            x: 0,
            y: 32,
            trigger: 255,
        });
        // forward = 32 * 255 / 128 = 63, doubled once
        assert_eq!((cmd.left(), cmd.right()), (126, 126));
    }
}
