//! Math utilities for the Differential-Drive Bot.
//!
//! This module provides drive mixing for two-wheeled differential robots.

pub mod mixing;
