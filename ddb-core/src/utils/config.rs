//! Runtime configuration for the Differential-Drive Bot.
//!
//! All fields have defaults matching the stock robot, so a partial JSON
//! document (or none at all) yields a working configuration.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Wire grammar spoken on the serial link. Exactly one is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// Newline-delimited tokens (`L:<l>,R:<r>`, `S:<a>`, `D`, `STOP`, `STATUS`).
    #[default]
    Token,
    /// Single-character commands (`W`, `A`, `S`, `D`, `X`, `1`..`5`).
    Byte,
}

impl ProtocolKind {
    /// Serial speed the host side expects for this grammar.
    pub fn baud_rate(self) -> u32 {
        match self {
            ProtocolKind::Token => 115_200,
            ProtocolKind::Byte => 9_600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub protocol: ProtocolKind,
    /// Enables the servo nudge/center, honk and measure byte commands.
    pub extended_commands: bool,
    pub watchdog_timeout_ms: u64,
    pub telemetry_period_ms: u64,
    pub scan_enabled: bool,
    pub scan_step_ms: u64,
    pub scan_settle_ms: u64,
    pub echo_timeout_us: u32,
    /// Speed level selected at power-up, `1..=5`.
    pub speed_level: u8,
    pub servo_nudge_deg: u8,
    pub horn_ms: u64,
    pub stick_axis_max: i16,
    pub stick_dead_zone: i16,
    pub boost_threshold: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolKind::Token,
            extended_commands: false,
            watchdog_timeout_ms: 500,
            telemetry_period_ms: 100,
            scan_enabled: true,
            scan_step_ms: 500,
            scan_settle_ms: 100,
            echo_timeout_us: 30_000,
            speed_level: 3,
            servo_nudge_deg: 15,
            horn_ms: 200,
            stick_axis_max: 128,
            stick_dead_zone: 20,
            boost_threshold: 10,
        }
    }
}

impl ControllerConfig {
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms)
    }

    pub fn telemetry_period(&self) -> Duration {
        Duration::from_millis(self.telemetry_period_ms)
    }

    pub fn scan_step(&self) -> Duration {
        Duration::from_millis(self.scan_step_ms)
    }

    pub fn scan_settle(&self) -> Duration {
        Duration::from_millis(self.scan_settle_ms)
    }

    pub fn horn_duration(&self) -> Duration {
        Duration::from_millis(self.horn_ms)
    }
}
