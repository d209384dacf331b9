//! Connection watchdog.
//!
//! The link has no disconnect signal; silence is the only symptom. The
//! watchdog remembers when the last recognized command arrived and reports a
//! timeout while the wheels are still being driven.

use embassy_time::{Duration, Instant};

use crate::utils::math::mixing::DriveCommand;

#[derive(Debug, Clone)]
pub struct Watchdog {
    last_command: Instant,
    timeout: Duration,
}

impl Watchdog {
    pub fn new(
        timeout: Duration,
        now: Instant,
    ) -> Self {
        Self {
            last_command: now,
            timeout,
        }
    }

    /// Record that a recognized command arrived.
    pub fn feed(
        &mut self,
        now: Instant,
    ) {
        self.last_command = now;
    }

    /// Time since the last recognized command.
    pub fn silence(
        &self,
        now: Instant,
    ) -> Duration {
        now.saturating_duration_since(self.last_command)
    }

    /// True when the link has been silent too long while `drive` is moving.
    ///
    /// Once the caller stops the wheels this stays false until a new command
    /// starts them again and the link falls silent once more.
    pub fn expired(
        &self,
        now: Instant,
        drive: DriveCommand,
    ) -> bool {
        !drive.is_stopped() && self.silence(now) > self.timeout
    }
}
