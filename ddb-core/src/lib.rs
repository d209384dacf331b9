//! Command interpreter and safety supervisor for a differential-drive bot on
//! no-std embedded platforms.
//!
//! For a host-side simulation, see the `mock-mcu` application.
#![no_std]

pub mod utils;
