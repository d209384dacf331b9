//! Ultrasonic ranging (HC-SR04 style trigger/echo sensor).
//!
//! A measurement pulses the trigger pin and times how long the echo pin stays
//! high. Every wait is bounded by the echo timeout, so a missing echo costs at
//! most that long and never hangs the control loop.

use core::fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// Speed of sound in cm/µs.
const SOUND_CM_PER_US: f32 = 0.034;
/// Trigger line settle time before the pulse.
const TRIGGER_SETTLE_US: u32 = 2;
/// Trigger pulse width.
const TRIGGER_PULSE_US: u32 = 10;
/// Echo polling granularity.
pub const ECHO_POLL_US: u32 = 10;
/// Wire value for "nothing within range".
pub const OUT_OF_RANGE_CM: u32 = 999;

/// Result of one ranging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeReading {
    /// Distance to the nearest echo, in centimetres.
    Measured(u32),
    /// No echo before the timeout: nothing in range.
    OutOfRange,
    /// The sensor could not be read, or no measurement has been taken yet.
    #[default]
    SensorFault,
}

impl RangeReading {
    /// Numeric form used on the wire: centimetres, `999` or `0`.
    pub fn wire_value(self) -> u32 {
        match self {
            RangeReading::Measured(cm) => cm,
            RangeReading::OutOfRange => OUT_OF_RANGE_CM,
            RangeReading::SensorFault => 0,
        }
    }

    /// Convert an echo pulse width to a reading.
    pub fn from_echo_us(width_us: u32) -> Self {
        let cm = libm::roundf(width_us as f32 * SOUND_CM_PER_US / 2.0) as u32;
        if cm == 0 {
            RangeReading::SensorFault
        } else {
            RangeReading::Measured(cm)
        }
    }
}

impl fmt::Display for RangeReading {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.wire_value())
    }
}

/// Anything that can produce a distance reading on request.
pub trait RangeFinder {
    fn measure(&mut self) -> RangeReading;
}

/// Trigger/echo ultrasonic sensor.
pub struct Hcsr04<T, E, D> {
    trigger: T,
    echo: E,
    delay: D,
    timeout_us: u32,
}

impl<T, E, D> Hcsr04<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    pub fn new(
        trigger: T,
        echo: E,
        delay: D,
        timeout_us: u32,
    ) -> Self {
        Self {
            trigger,
            echo,
            delay,
            timeout_us,
        }
    }

    pub fn release(self) -> (T, E, D) {
        (self.trigger, self.echo, self.delay)
    }

    fn pulse_trigger(&mut self) -> Result<(), ()> {
        self.trigger.set_low().map_err(drop)?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high().map_err(drop)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low().map_err(drop)
    }

    /// Width of the echo pulse, or `None` if the timeout ran out first.
    fn echo_width_us(&mut self) -> Result<Option<u32>, ()> {
        let mut waited = 0;
        while !self.echo.is_high().map_err(drop)? {
            if waited >= self.timeout_us {
                return Ok(None);
            }
            self.delay.delay_us(ECHO_POLL_US);
            waited += ECHO_POLL_US;
        }

        let mut width = 0;
        while self.echo.is_high().map_err(drop)? {
            if waited + width >= self.timeout_us {
                return Ok(None);
            }
            self.delay.delay_us(ECHO_POLL_US);
            width += ECHO_POLL_US;
        }
        Ok(Some(width))
    }
}

impl<T, E, D> RangeFinder for Hcsr04<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    fn measure(&mut self) -> RangeReading {
        let result = self.pulse_trigger().and_then(|()| self.echo_width_us());
        let reading = match result {
            Ok(Some(width)) => RangeReading::from_echo_us(width),
            Ok(None) => RangeReading::OutOfRange,
            Err(()) => {
                tracing::warn!("ranging sensor pin error");
                RangeReading::SensorFault
            }
        };
        tracing::trace!(?reading, "range measured");
        reading
    }
}
