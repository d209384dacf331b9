//! Serial link plumbing.
//!
//! The link pairs a receive half that can be polled without blocking
//! (`embedded_io::ReadReady`) with a transmit half. [`ChannelRx`] turns an
//! `embassy-sync` channel into such a receive half, so a UART interrupt (or
//! a host thread) can push bytes that the control loop drains at its own pace.

use core::convert::Infallible;

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::utils::connection::telemetry::Report;

/// Bytes pulled from the receive half per read.
pub const RX_CHUNK: usize = 32;

pub struct SerialLink<RX, TX> {
    rx: RX,
    tx: TX,
}

impl<RX, TX> SerialLink<RX, TX>
where
    RX: Read + ReadReady,
    TX: Write,
{
    pub fn new(
        rx: RX,
        tx: TX,
    ) -> Self {
        Self { rx, tx }
    }

    /// Read whatever is already buffered, without waiting.
    ///
    /// Returns 0 when nothing is pending or the receiver reported an error.
    pub fn read_available(
        &mut self,
        buf: &mut [u8],
    ) -> usize {
        match self.rx.read_ready() {
            Ok(true) => match self.rx.read(buf) {
                Ok(n) => n,
                Err(error) => {
                    tracing::warn!(?error, "serial read failed");
                    0
                }
            },
            Ok(false) => 0,
            Err(error) => {
                tracing::warn!(?error, "serial read_ready failed");
                0
            }
        }
    }

    /// Write one report followed by a newline.
    pub fn send(
        &mut self,
        report: &Report,
    ) {
        tracing::debug!(%report, "tx");
        if let Err(error) = writeln!(self.tx, "{}", report) {
            tracing::warn!(?error, "serial write failed");
        }
    }

    pub fn rx_mut(&mut self) -> &mut RX {
        &mut self.rx
    }

    pub fn tx_mut(&mut self) -> &mut TX {
        &mut self.tx
    }

    pub fn release(self) -> (RX, TX) {
        (self.rx, self.tx)
    }
}

/// Receive half backed by a byte channel.
pub struct ChannelRx<'a, M: RawMutex, const N: usize> {
    channel: &'a Channel<M, u8, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelRx<'a, M, N> {
    pub fn new(channel: &'a Channel<M, u8, N>) -> Self {
        Self { channel }
    }
}

impl<M: RawMutex, const N: usize> ErrorType for ChannelRx<'_, M, N> {
    type Error = Infallible;
}

impl<M: RawMutex, const N: usize> ReadReady for ChannelRx<'_, M, N> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.channel.is_empty())
    }
}

impl<M: RawMutex, const N: usize> Read for ChannelRx<'_, M, N> {
    /// Blocks only while the channel is empty and nothing has been read yet.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.channel.try_receive() {
                Ok(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                Err(_) if n > 0 => break,
                Err(_) => core::hint::spin_loop(),
            }
        }
        Ok(n)
    }
}
