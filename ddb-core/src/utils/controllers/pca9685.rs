//! PCA9685 actuator backend.
//!
//! Drives both wheels, the servo and the horn from a PCA9685 16-channel PWM
//! board on a shared I2C bus. Each wheel uses a phase/enable pair of channels
//! (DRV8835-style bridge); the servo and horn get one channel each.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::controllers::actuators::{Actuators, ServoAngle, SERVO_PERIOD_US};
use crate::utils::math::mixing::{DriveCommand, MAX_SPEED};

/// Default I2C address of the PWM board.
pub const DEFAULT_ADDRESS: u8 = 0x40;
/// Full-scale PCA9685 off-count.
const MAX_DUTY: u16 = 4095;
/// Prescaler for a 50 Hz output period from the 25 MHz internal clock.
const PRESCALE_50HZ: u8 = 121;

/// Errors that can occur when driving the PWM board.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
}

/// Channel assignment on the PWM board.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMap {
    /// `(phase, enable)` for the left wheel.
    pub left: (Channel, Channel),
    /// `(phase, enable)` for the right wheel.
    pub right: (Channel, Channel),
    pub servo: Channel,
    pub horn: Channel,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            left: (Channel::C0, Channel::C1),
            right: (Channel::C2, Channel::C3),
            servo: Channel::C4,
            horn: Channel::C5,
        }
    }
}

pub struct Pca9685Actuators<'a, I2C: 'static> {
    pwm: Pca9685<RefCellDevice<'a, I2C>>,
    channels: ChannelMap,
}

impl<'a, I2C, E> Pca9685Actuators<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Attach to the board at `address` on the shared bus.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
        channels: ChannelMap,
    ) -> Result<Self, DeviceError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address))
            .map_err(DeviceError::PwmError)?;
        Ok(Self { pwm, channels })
    }

    fn set_wheel(
        &mut self,
        (phase, enable): (Channel, Channel),
        speed: i16,
    ) -> Result<(), DeviceError<E>> {
        let duty = (speed.unsigned_abs() as u32 * MAX_DUTY as u32 / MAX_SPEED as u32) as u16;
        let reverse = speed < 0;

        self.pwm
            .set_channel_on_off(phase, 0, if reverse { MAX_DUTY } else { 0 })
            .map_err(DeviceError::PwmError)?;
        self.pwm
            .set_channel_on_off(enable, 0, duty)
            .map_err(DeviceError::PwmError)
    }
}

impl<I2C, E> Actuators for Pca9685Actuators<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = DeviceError<E>;

    /// Wake the oscillator, set a 50 Hz period for the servo, then park every output.
    fn init(&mut self) -> Result<(), Self::Error> {
        self.pwm.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        self.pwm
            .set_prescale(PRESCALE_50HZ)
            .map_err(DeviceError::PwmError)?;
        tracing::info!("PWM prescale set to 50Hz");
        self.drive(DriveCommand::STOP)?;
        self.set_servo(ServoAngle::CENTER)?;
        self.set_horn(false)
    }

    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        self.set_wheel(self.channels.left, cmd.left())?;
        self.set_wheel(self.channels.right, cmd.right())
    }

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), Self::Error> {
        let ticks = (angle.pulse_us() as u32 * (MAX_DUTY as u32 + 1) / SERVO_PERIOD_US as u32) as u16;
        self.pwm
            .set_channel_on_off(self.channels.servo, 0, ticks)
            .map_err(DeviceError::PwmError)
    }

    fn set_horn(
        &mut self,
        on: bool,
    ) -> Result<(), Self::Error> {
        self.pwm
            .set_channel_on_off(self.channels.horn, 0, if on { MAX_DUTY } else { 0 })
            .map_err(DeviceError::PwmError)
    }
}
