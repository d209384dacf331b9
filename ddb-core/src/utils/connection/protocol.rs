//! Inbound command grammars.
//!
//! Two incompatible wire formats exist and a deployment speaks exactly one of
//! them. Both implement [`Protocol`]: bytes go in one at a time and a decoded
//! [`Command`] comes out whenever one is complete. Nothing here ever waits for
//! more input, so a half-received line simply stays buffered until the next
//! loop iteration delivers the rest.

use heapless::Vec;

use crate::utils::config::{ControllerConfig, ProtocolKind};
use crate::utils::controllers::motion::SpeedLevel;

/// Longest token line that is buffered; longer lines are dropped whole.
pub const LINE_CAPACITY: usize = 64;

/// Decoded operator commands from either grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Explicit per-wheel speeds, not yet clamped.
    Motors { left: i32, right: i32 },
    /// Explicit servo angle, not yet clamped.
    Servo(i32),
    /// One-shot range measurement.
    Measure,
    /// Operator stop.
    Stop,
    /// Verbose status dump.
    Status,
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    SpeedLevel(SpeedLevel),
    ServoLeft,
    ServoRight,
    ServoCenter,
    Honk,
}

/// A wire grammar that turns bytes into commands.
pub trait Protocol {
    /// Feed one received byte. Returns a command once one is complete.
    fn push(
        &mut self,
        byte: u8,
    ) -> Option<Command>;
}

/// Newline-delimited token grammar.
#[derive(Debug, Default)]
pub struct TokenProtocol {
    line: Vec<u8, LINE_CAPACITY>,
    /// Set while skipping the tail of an over-long line.
    discarding: bool,
}

impl TokenProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes of the current, incomplete line.
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    fn finish_line(&mut self) -> Option<Command> {
        let discarded = core::mem::replace(&mut self.discarding, false);
        let command = if discarded {
            tracing::debug!("dropping over-long line");
            None
        } else {
            core::str::from_utf8(&self.line).ok().and_then(parse_line)
        };
        self.line.clear();
        command
    }
}

impl Protocol for TokenProtocol {
    fn push(
        &mut self,
        byte: u8,
    ) -> Option<Command> {
        match byte {
            b'\r' => None,
            b'\n' => self.finish_line(),
            _ if self.discarding => None,
            _ => {
                if self.line.push(byte).is_err() {
                    self.line.clear();
                    self.discarding = true;
                }
                None
            }
        }
    }
}

/// Classify one complete token line.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = classify(line);
    if command.is_none() {
        tracing::debug!(line, "unrecognized line");
    }
    command
}

fn classify(line: &str) -> Option<Command> {
    match line {
        "D" => return Some(Command::Measure),
        "STOP" => return Some(Command::Stop),
        "STATUS" => return Some(Command::Status),
        _ => {}
    }

    if let Some(rest) = line.strip_prefix("L:") {
        let (left, right) = rest.split_once(',')?;
        let right = right.trim().strip_prefix("R:")?;
        Some(Command::Motors {
            left: parse_int(left)?,
            right: parse_int(right)?,
        })
    } else if let Some(angle) = line.strip_prefix("S:") {
        Some(Command::Servo(parse_int(angle)?))
    } else {
        None
    }
}

/// Decimal integer, saturated at the `i32` bounds rather than rejected.
fn parse_int(s: &str) -> Option<i32> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as i64)
    });
    let value = if negative { -magnitude } else { magnitude };
    Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Single-character grammar; every byte is a complete command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteProtocol {
    /// Accept the servo, honk and measure commands as well.
    extended: bool,
}

impl ByteProtocol {
    pub fn new(extended: bool) -> Self {
        Self { extended }
    }
}

impl Protocol for ByteProtocol {
    fn push(
        &mut self,
        byte: u8,
    ) -> Option<Command> {
        let command = match byte.to_ascii_uppercase() {
            b'W' => Command::Forward,
            b'S' => Command::Backward,
            b'A' => Command::RotateLeft,
            b'D' => Command::RotateRight,
            b'X' | b' ' => Command::Stop,
            b @ b'1'..=b'5' => Command::SpeedLevel(SpeedLevel::from_digit(b - b'0')?),
            b'L' if self.extended => Command::ServoLeft,
            b'R' if self.extended => Command::ServoRight,
            b'C' if self.extended => Command::ServoCenter,
            b'H' if self.extended => Command::Honk,
            b'M' if self.extended => Command::Measure,
            other => {
                tracing::trace!(byte = other, "ignoring byte");
                return None;
            }
        };
        Some(command)
    }
}

/// The grammar picked at startup from [`ControllerConfig::protocol`].
#[derive(Debug)]
pub enum AnyProtocol {
    Token(TokenProtocol),
    Byte(ByteProtocol),
}

impl From<&ControllerConfig> for AnyProtocol {
    fn from(config: &ControllerConfig) -> Self {
        match config.protocol {
            ProtocolKind::Token => AnyProtocol::Token(TokenProtocol::new()),
            ProtocolKind::Byte => AnyProtocol::Byte(ByteProtocol::new(config.extended_commands)),
        }
    }
}

impl Protocol for AnyProtocol {
    fn push(
        &mut self,
        byte: u8,
    ) -> Option<Command> {
        match self {
            AnyProtocol::Token(p) => p.push(byte),
            AnyProtocol::Byte(p) => p.push(byte),
        }
    }
}
