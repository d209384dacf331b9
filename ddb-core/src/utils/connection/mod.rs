//! Module Exports
//!
//! This file exports the modules that move bytes on and off the serial link.
//!
//! # Modules
//! - `protocol`: the token and single-byte command grammars.
//! - `link`: non-blocking serial halves and the channel-backed receiver.
//! - `telemetry`: outbound report formats and the telemetry timer.

pub mod link;
pub mod protocol;
pub mod telemetry;
