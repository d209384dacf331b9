//! Outbound messages and the periodic telemetry timer.
//!
//! Every line the robot sends is a [`Report`]; its `Display` impl is the wire
//! format (without the trailing newline, which the link adds).

use core::fmt;

use embassy_time::{Duration, Instant};

use crate::utils::controllers::{
    actuators::ServoAngle,
    motion::SpeedLevel,
    ranging::RangeReading,
    scan::position_tag,
};
use crate::utils::math::mixing::DriveCommand;

/// Actuator and sensor values carried by the compact telemetry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub drive: DriveCommand,
    pub servo: ServoAngle,
    pub distance: RangeReading,
}

/// Contents of the verbose status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub snapshot: Snapshot,
    pub level: SpeedLevel,
    pub scanning: bool,
    /// A recognized command arrived within the watchdog timeout.
    pub link_active: bool,
    pub uptime_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Ready,
    Motors(DriveCommand),
    Servo(ServoAngle),
    Distance(RangeReading),
    ScanDistance {
        angle: ServoAngle,
        reading: RangeReading,
    },
    Speed(SpeedLevel),
    Telemetry(Snapshot),
    TimeoutStop,
    EmergencyStop,
    Status(StatusReport),
}

impl fmt::Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Report::Ready => f.write_str("READY"),
            Report::Motors(drive) => write!(f, "MOTORS:{},{}", drive.left(), drive.right()),
            Report::Servo(angle) => write!(f, "SERVO:{}", angle.degrees()),
            Report::Distance(reading) => write!(f, "DIST:{}", reading),
            Report::ScanDistance { angle, reading } => write!(
                f,
                "DIST:{}{}:{}",
                position_tag(*angle),
                angle.degrees(),
                reading
            ),
            Report::Speed(level) => write!(f, "SPEED:{}", level.level()),
            Report::Telemetry(s) => write!(
                f,
                "ST:{},{},{},{}",
                s.drive.left(),
                s.drive.right(),
                s.servo.degrees(),
                s.distance
            ),
            Report::TimeoutStop => f.write_str("TIMEOUT_STOP"),
            Report::EmergencyStop => f.write_str("EMERGENCY_STOP"),
            Report::Status(status) => {
                let s = &status.snapshot;
                writeln!(f, "=== STATUS ===")?;
                writeln!(f, "Motors: {},{}", s.drive.left(), s.drive.right())?;
                writeln!(f, "Servo: {}", s.servo.degrees())?;
                writeln!(f, "Distance: {}", s.distance)?;
                writeln!(f, "Speed level: {}", status.level.level())?;
                writeln!(
                    f,
                    "Scanning: {}",
                    if status.scanning { "on" } else { "off" }
                )?;
                writeln!(
                    f,
                    "Link: {}",
                    if status.link_active { "active" } else { "idle" }
                )?;
                writeln!(f, "Uptime ms: {}", status.uptime_ms)?;
                f.write_str("=== END ===")
            }
        }
    }
}

/// Fires once per period, independent of everything else in the loop.
#[derive(Debug, Clone)]
pub struct TelemetryTimer {
    period: Duration,
    last: Instant,
}

impl TelemetryTimer {
    pub fn new(
        period: Duration,
        now: Instant,
    ) -> Self {
        Self { period, last: now }
    }

    pub fn due(
        &mut self,
        now: Instant,
    ) -> bool {
        if now.saturating_duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}
