//! Utility re-exports for the Differential-Drive Bot.
//!
//! This module re-exports the controller, protocol and configuration types:
//!
//! - `config`: runtime configuration with serde defaults
//! - `connection`: wire grammars, serial link and outbound reports
//! - `controllers`: actuators, ranging, scan, watchdog and the system controller
//! - `math`: differential drive mixing

pub mod config;
pub mod connection;
pub mod controllers;
pub mod math;

pub use config::{ControllerConfig, ProtocolKind};
pub use connection::protocol::{AnyProtocol, Command, Protocol};
pub use controllers::SystemController;
pub use embassy_time::{Duration, Instant};
pub use math::mixing::DriveCommand;
