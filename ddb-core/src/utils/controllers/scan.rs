//! Servo sweep for the ranging sensor.
//!
//! The sweep visits left, center, right, center on a fixed period. After each
//! servo move the scanner waits in a settling sub-state until the servo has
//! had time to arrive, and only then asks for a measurement. Nothing here
//! blocks: [`Scanner::step`] just reports what is due.

use embassy_time::{Duration, Instant};

use crate::utils::config::ControllerConfig;
use crate::utils::controllers::actuators::ServoAngle;

/// Position of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Left,
    CenterFromLeft,
    Right,
    CenterFromRight,
}

impl ScanPhase {
    pub fn next(self) -> Self {
        match self {
            ScanPhase::Left => ScanPhase::CenterFromLeft,
            ScanPhase::CenterFromLeft => ScanPhase::Right,
            ScanPhase::Right => ScanPhase::CenterFromRight,
            ScanPhase::CenterFromRight => ScanPhase::Left,
        }
    }

    pub fn angle(self) -> ServoAngle {
        match self {
            ScanPhase::Left => ServoAngle::new(30),
            ScanPhase::CenterFromLeft | ScanPhase::CenterFromRight => ServoAngle::CENTER,
            ScanPhase::Right => ServoAngle::new(150),
        }
    }
}

/// Position letter reported alongside a scan measurement.
pub fn position_tag(angle: ServoAngle) -> char {
    match angle.degrees() {
        a if a < 60 => 'L',
        a if a > 120 => 'R',
        _ => 'C',
    }
}

/// What the controller should do for the sweep on this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    /// Command the servo to this angle.
    MoveServo(ServoAngle),
    /// The servo has settled at this angle; take a reading.
    Measure(ServoAngle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Settling { until: Instant, angle: ServoAngle },
}

#[derive(Debug, Clone)]
pub struct Scanner {
    enabled: bool,
    phase: ScanPhase,
    stage: Stage,
    last_step: Instant,
    step_interval: Duration,
    settle: Duration,
}

impl Scanner {
    /// The first step happens one interval after `now`.
    ///
    /// Starts in `CenterFromRight` so the first move is to the left.
    pub fn new(
        config: &ControllerConfig,
        now: Instant,
    ) -> Self {
        Self {
            enabled: config.scan_enabled,
            phase: ScanPhase::CenterFromRight,
            stage: Stage::Idle,
            last_step: now,
            step_interval: config.scan_step(),
            settle: config.scan_settle(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Turning the sweep off drops any pending measurement.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        now: Instant,
    ) {
        if enabled && !self.enabled {
            self.last_step = now;
        }
        self.enabled = enabled;
        self.stage = Stage::Idle;
    }

    pub fn step(
        &mut self,
        now: Instant,
    ) -> Option<ScanAction> {
        if !self.enabled {
            return None;
        }

        match self.stage {
            Stage::Settling { until, angle } => {
                if now >= until {
                    self.stage = Stage::Idle;
                    Some(ScanAction::Measure(angle))
                } else {
                    None
                }
            }
            Stage::Idle => {
                if now.saturating_duration_since(self.last_step) <= self.step_interval {
                    return None;
                }
                self.phase = self.phase.next();
                self.last_step = now;
                let angle = self.phase.angle();
                self.stage = Stage::Settling {
                    until: now + self.settle,
                    angle,
                };
                tracing::trace!(phase = ?self.phase, angle = angle.degrees(), "scan step");
                Some(ScanAction::MoveServo(angle))
            }
        }
    }
}
