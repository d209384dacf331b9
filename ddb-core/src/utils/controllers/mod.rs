//! Module Exports
//!
//! This file exports the modules of the control system and the
//! [`SystemController`] that multiplexes them onto one loop.
//!
//! - `actuators`: drive motors, servo and horn over GPIO/PWM pins.
//! - `pca9685`: the same outputs over an I2C PWM board.
//! - `motion`: operator intent to wheel speeds.
//! - `ranging`: ultrasonic distance measurement.
//! - `scan`: non-blocking servo sweep.
//! - `watchdog`: connection-loss detection.

pub mod actuators;
pub mod motion;
pub mod pca9685;
pub mod ranging;
pub mod scan;
pub mod watchdog;

use embassy_time::Instant;
use embedded_io::{Read, ReadReady, Write};

pub use actuators::{Actuators, GpioActuators, ServoAngle};
pub use motion::{MotionController, MotionIntent, SpeedLevel};
pub use ranging::{Hcsr04, RangeFinder, RangeReading};
pub use scan::{ScanAction, ScanPhase, Scanner};
pub use watchdog::Watchdog;

use crate::utils::config::ControllerConfig;
use crate::utils::connection::{
    link::{SerialLink, RX_CHUNK},
    protocol::{Command, Protocol},
    telemetry::{Report, Snapshot, StatusReport, TelemetryTimer},
};
use crate::utils::math::mixing::{DriveCommand, JoystickInput};

/// Everything the robot currently commands or knows.
///
/// Duties read and update this one struct; nothing lives in globals.
#[derive(Debug, Clone, Default)]
pub struct RobotState {
    /// Last speeds handed to the actuators.
    pub drive: DriveCommand,
    pub servo: ServoAngle,
    /// Most recent ranging result from either path.
    pub distance: RangeReading,
    /// When the horn should be switched off, if it is sounding.
    pub horn_until: Option<Instant>,
}

impl RobotState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            drive: self.drive,
            servo: self.servo,
            distance: self.distance,
        }
    }
}

/// Errors that stop the controller from running at all.
#[derive(Debug)]
pub enum ControllerError<E: core::fmt::Debug> {
    /// The actuator backend could not be brought to a safe state.
    ActuatorInit(E),
}

pub struct SystemController<P, A, R, RX, TX> {
    config: ControllerConfig,
    protocol: P,
    actuators: A,
    ranger: R,
    link: SerialLink<RX, TX>,
    state: RobotState,
    motion: MotionController,
    watchdog: Watchdog,
    scanner: Scanner,
    telemetry: TelemetryTimer,
    started: Instant,
}

impl<P, A, R, RX, TX> SystemController<P, A, R, RX, TX>
where
    P: Protocol,
    A: Actuators,
    R: RangeFinder,
    RX: Read + ReadReady,
    TX: Write,
{
    pub fn new(
        config: ControllerConfig,
        protocol: P,
        actuators: A,
        ranger: R,
        link: SerialLink<RX, TX>,
        now: Instant,
    ) -> Self {
        SystemController {
            motion: MotionController::new(&config),
            watchdog: Watchdog::new(config.watchdog_timeout(), now),
            scanner: Scanner::new(&config, now),
            telemetry: TelemetryTimer::new(config.telemetry_period(), now),
            state: RobotState::default(),
            started: now,
            config,
            protocol,
            actuators,
            ranger,
            link,
        }
    }

    /// Put the actuators into their idle state and announce readiness.
    ///
    /// An error here is the one unrecoverable condition: the caller is
    /// expected to halt rather than run the loop.
    pub fn start(
        &mut self,
        now: Instant,
    ) -> Result<(), ControllerError<A::Error>> {
        self.actuators.init().map_err(|e| {
            tracing::error!(error = ?e, "actuator init failed");
            ControllerError::ActuatorInit(e)
        })?;
        self.state = RobotState::default();
        self.apply_drive(DriveCommand::STOP);
        self.set_servo(ServoAngle::CENTER);
        self.watchdog.feed(now);
        tracing::info!(
            protocol = ?self.config.protocol,
            baud = self.config.protocol.baud_rate(),
            scanning = self.scanner.is_enabled(),
            "controller ready"
        );
        self.link.send(&Report::Ready);
        Ok(())
    }

    /// Run every duty once. Call this from the main loop with a fresh `now`.
    pub fn poll(
        &mut self,
        now: Instant,
    ) {
        self.service_link(now);
        self.service_watchdog(now);
        self.service_horn(now);
        self.service_scan(now);
        self.service_telemetry(now);
    }

    /// Decode every byte the link already has and act on the commands.
    fn service_link(
        &mut self,
        now: Instant,
    ) {
        let mut buf = [0u8; RX_CHUNK];
        loop {
            let n = self.link.read_available(&mut buf);
            if n == 0 {
                break;
            }
            for &byte in &buf[..n] {
                if let Some(cmd) = self.protocol.push(byte) {
                    self.handle(cmd, now);
                }
            }
        }
    }

    /// Execute one decoded command. Recognized commands feed the watchdog.
    pub fn handle(
        &mut self,
        cmd: Command,
        now: Instant,
    ) {
        tracing::debug!(?cmd, "command");
        self.watchdog.feed(now);

        match cmd {
            Command::Motors { left, right } => {
                let drive = self.motion.resolve(MotionIntent::Direct { left, right });
                self.apply_drive(drive);
                self.link.send(&Report::Motors(drive));
            }
            Command::Forward => self.apply_intent(MotionIntent::Forward),
            Command::Backward => self.apply_intent(MotionIntent::Backward),
            Command::RotateLeft => self.apply_intent(MotionIntent::RotateLeft),
            Command::RotateRight => self.apply_intent(MotionIntent::RotateRight),
            Command::Stop => {
                self.apply_intent(MotionIntent::Stop);
                tracing::info!("operator stop");
                self.link.send(&Report::EmergencyStop);
            }
            Command::SpeedLevel(level) => {
                self.motion.set_level(level);
                self.link.send(&Report::Speed(level));
            }
            Command::Servo(degrees) => self.command_servo(ServoAngle::new(degrees)),
            Command::ServoLeft => {
                let step = self.config.servo_nudge_deg as i32;
                self.command_servo(self.state.servo.nudge(-step));
            }
            Command::ServoRight => {
                let step = self.config.servo_nudge_deg as i32;
                self.command_servo(self.state.servo.nudge(step));
            }
            Command::ServoCenter => self.command_servo(ServoAngle::CENTER),
            Command::Measure => {
                let reading = self.measure();
                self.link.send(&Report::Distance(reading));
            }
            Command::Honk => self.start_horn(now),
            Command::Status => {
                let status = self.status(now);
                self.link.send(&Report::Status(status));
            }
        }
    }

    /// Drive from game-controller input (external controller deployments).
    pub fn apply_joystick(
        &mut self,
        input: JoystickInput,
        now: Instant,
    ) {
        self.watchdog.feed(now);
        self.apply_intent(MotionIntent::Joystick(input));
    }

    pub fn set_scanning(
        &mut self,
        enabled: bool,
        now: Instant,
    ) {
        tracing::info!(enabled, "scanning toggled");
        self.scanner.set_enabled(enabled, now);
    }

    pub fn status(
        &self,
        now: Instant,
    ) -> StatusReport {
        StatusReport {
            snapshot: self.state.snapshot(),
            level: self.motion.level(),
            scanning: self.scanner.is_enabled(),
            link_active: self.watchdog.silence(now) <= self.config.watchdog_timeout(),
            uptime_ms: now.saturating_duration_since(self.started).as_millis(),
        }
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn link(&mut self) -> &mut SerialLink<RX, TX> {
        &mut self.link
    }

    fn service_watchdog(
        &mut self,
        now: Instant,
    ) {
        if self.watchdog.expired(now, self.state.drive) {
            tracing::warn!(
                silence_ms = self.watchdog.silence(now).as_millis(),
                "link silent, stopping"
            );
            self.apply_drive(DriveCommand::STOP);
            self.link.send(&Report::TimeoutStop);
        }
    }

    fn service_horn(
        &mut self,
        now: Instant,
    ) {
        if let Some(until) = self.state.horn_until {
            if now >= until {
                self.state.horn_until = None;
                if let Err(e) = self.actuators.set_horn(false) {
                    tracing::error!(error = ?e, "horn off failed");
                }
            }
        }
    }

    fn service_scan(
        &mut self,
        now: Instant,
    ) {
        match self.scanner.step(now) {
            Some(ScanAction::MoveServo(angle)) => self.set_servo(angle),
            Some(ScanAction::Measure(angle)) if self.state.servo != angle => {
                tracing::debug!(
                    scan = angle.degrees(),
                    servo = self.state.servo.degrees(),
                    "servo moved while settling, skipping sample"
                );
            }
            Some(ScanAction::Measure(angle)) => {
                let reading = self.measure();
                self.link.send(&Report::ScanDistance { angle, reading });
            }
            None => {}
        }
    }

    fn service_telemetry(
        &mut self,
        now: Instant,
    ) {
        if self.telemetry.due(now) {
            self.link.send(&Report::Telemetry(self.state.snapshot()));
        }
    }

    fn apply_intent(
        &mut self,
        intent: MotionIntent,
    ) {
        let drive = self.motion.resolve(intent);
        self.apply_drive(drive);
    }

    /// The only place wheel speeds reach the actuators.
    fn apply_drive(
        &mut self,
        drive: DriveCommand,
    ) {
        self.state.drive = drive;
        tracing::debug!(left = drive.left(), right = drive.right(), "drive");
        if let Err(e) = self.actuators.drive(drive) {
            tracing::error!(error = ?e, "drive failed");
        }
    }

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) {
        self.state.servo = angle;
        if let Err(e) = self.actuators.set_servo(angle) {
            tracing::error!(error = ?e, "servo failed");
        }
    }

    fn command_servo(
        &mut self,
        angle: ServoAngle,
    ) {
        self.set_servo(angle);
        self.link.send(&Report::Servo(angle));
    }

    fn start_horn(
        &mut self,
        now: Instant,
    ) {
        self.state.horn_until = Some(now + self.config.horn_duration());
        if let Err(e) = self.actuators.set_horn(true) {
            tracing::error!(error = ?e, "horn on failed");
        }
    }

    fn measure(&mut self) -> RangeReading {
        let reading = self.ranger.measure();
        self.state.distance = reading;
        reading
    }
}
