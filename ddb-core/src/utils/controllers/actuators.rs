//! Actuator driver for the drive motors, sensor servo and horn.
//!
//! [`Actuators`] is the seam between the controller and the hardware. The
//! GPIO backend here drives two H-bridge channels (two direction pins and a
//! PWM enable each, as on an L298N) plus a hobby servo and a horn pin, all
//! through `embedded-hal` traits.

use embedded_hal::{
    digital::{self, ErrorKind as PinErrorKind, OutputPin},
    pwm::{self, ErrorKind as PwmErrorKind, SetDutyCycle},
};

use crate::utils::math::mixing::{DriveCommand, MAX_SPEED};

/// Servo period at 50 Hz, in microseconds.
pub const SERVO_PERIOD_US: u16 = 20_000;
/// Pulse width commanding 0°.
pub const SERVO_MIN_PULSE_US: u16 = 500;
/// Pulse width commanding 180°.
pub const SERVO_MAX_PULSE_US: u16 = 2_500;

/// Servo position in whole degrees, always within `[0, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServoAngle(u8);

impl ServoAngle {
    pub const MAX: u8 = 180;
    pub const CENTER: Self = Self(90);

    /// Clamp any integer into the servo's travel.
    pub fn new(degrees: i32) -> Self {
        Self(degrees.clamp(0, Self::MAX as i32) as u8)
    }

    pub fn degrees(self) -> u8 {
        self.0
    }

    /// Move by `delta` degrees, stopping at the end stops.
    pub fn nudge(
        self,
        delta: i32,
    ) -> Self {
        Self::new(self.0 as i32 + delta)
    }

    /// Pulse width for this angle.
    pub fn pulse_us(self) -> u16 {
        let span = (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) as u32;
        SERVO_MIN_PULSE_US + (self.0 as u32 * span / Self::MAX as u32) as u16
    }
}

impl Default for ServoAngle {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Output stage driven by the controller.
pub trait Actuators {
    type Error: core::fmt::Debug;

    /// Bring outputs to a safe idle state. Called once before the loop starts.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Apply signed speeds to both wheels.
    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error>;

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), Self::Error>;

    fn set_horn(
        &mut self,
        on: bool,
    ) -> Result<(), Self::Error>;
}

/// Errors from the GPIO backend, reduced to the HAL error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    Pin(PinErrorKind),
    Pwm(PwmErrorKind),
}

fn pin_err<E: digital::Error>(e: E) -> ActuatorError {
    ActuatorError::Pin(digital::Error::kind(&e))
}

fn pwm_err<E: pwm::Error>(e: E) -> ActuatorError {
    ActuatorError::Pwm(pwm::Error::kind(&e))
}

/// One H-bridge channel: two direction inputs and a PWM enable.
pub struct Motor<A, B, P> {
    in1: A,
    in2: B,
    enable: P,
}

impl<A, B, P> Motor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    pub fn new(
        in1: A,
        in2: B,
        enable: P,
    ) -> Self {
        Self { in1, in2, enable }
    }

    /// Positive speeds drive forward, negative reverse, zero coasts.
    pub fn drive(
        &mut self,
        speed: i16,
    ) -> Result<(), ActuatorError> {
        match speed.signum() {
            1 => {
                self.in1.set_high().map_err(pin_err)?;
                self.in2.set_low().map_err(pin_err)?;
            }
            -1 => {
                self.in1.set_low().map_err(pin_err)?;
                self.in2.set_high().map_err(pin_err)?;
            }
            _ => {
                self.in1.set_low().map_err(pin_err)?;
                self.in2.set_low().map_err(pin_err)?;
            }
        }
        self.enable
            .set_duty_cycle_fraction(speed.unsigned_abs(), MAX_SPEED as u16)
            .map_err(pwm_err)
    }

    pub fn release(self) -> (A, B, P) {
        (self.in1, self.in2, self.enable)
    }
}

/// Hobby servo on a 50 Hz PWM output.
pub struct Servo<S> {
    pwm: S,
}

impl<S: SetDutyCycle> Servo<S> {
    pub fn new(pwm: S) -> Self {
        Self { pwm }
    }

    pub fn set_angle(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(angle.pulse_us(), SERVO_PERIOD_US)
            .map_err(pwm_err)
    }

    pub fn release(self) -> S {
        self.pwm
    }
}

/// Actuators wired straight to MCU pins.
pub struct GpioActuators<A, B, P, S, H> {
    left: Motor<A, B, P>,
    right: Motor<A, B, P>,
    servo: Servo<S>,
    horn: H,
}

impl<A, B, P, S, H> GpioActuators<A, B, P, S, H>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
    S: SetDutyCycle,
    H: OutputPin,
{
    pub fn new(
        left: Motor<A, B, P>,
        right: Motor<A, B, P>,
        servo: Servo<S>,
        horn: H,
    ) -> Self {
        Self {
            left,
            right,
            servo,
            horn,
        }
    }

    pub fn release(self) -> (Motor<A, B, P>, Motor<A, B, P>, Servo<S>, H) {
        (self.left, self.right, self.servo, self.horn)
    }
}

impl<A, B, P, S, H> Actuators for GpioActuators<A, B, P, S, H>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
    S: SetDutyCycle,
    H: OutputPin,
{
    type Error = ActuatorError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.drive(DriveCommand::STOP)?;
        self.set_servo(ServoAngle::CENTER)?;
        self.set_horn(false)
    }

    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        self.left.drive(cmd.left())?;
        self.right.drive(cmd.right())
    }

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), Self::Error> {
        self.servo.set_angle(angle)
    }

    fn set_horn(
        &mut self,
        on: bool,
    ) -> Result<(), Self::Error> {
        if on {
            self.horn.set_high().map_err(pin_err)
        } else {
            self.horn.set_low().map_err(pin_err)
        }
    }
}
