use clap::Parser;
use ddb_core::utils::config::{ControllerConfig, ProtocolKind};
use ddb_core::utils::connection::link::{ChannelRx, SerialLink};
use ddb_core::utils::controllers::actuators::{Actuators, ServoAngle};
use ddb_core::utils::controllers::ranging::{RangeFinder, RangeReading};
use ddb_core::utils::{AnyProtocol, DriveCommand, Instant, SystemController};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use std::convert::Infallible;
use std::io::Read as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

const RX_CAPACITY: usize = 64;

/// Bytes from stdin, standing in for the UART receive interrupt.
static RX: Channel<CriticalSectionRawMutex, u8, RX_CAPACITY> = Channel::new();

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// JSON controller configuration; missing fields use defaults
    #[clap(long)]
    config: Option<PathBuf>,
    /// command grammar to accept on stdin
    #[clap(long, value_enum)]
    protocol: Option<Grammar>,
    /// accept the servo, horn and measure bytes in the byte grammar
    #[clap(long)]
    extended: bool,
    /// simulated obstacle distance in cm; omit for an empty room
    #[clap(long)]
    distance: Option<u32>,
    /// disable the servo sweep
    #[clap(long)]
    no_scan: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Grammar {
    Token,
    Byte,
}

impl From<Grammar> for ProtocolKind {
    fn from(g: Grammar) -> Self {
        match g {
            Grammar::Token => ProtocolKind::Token,
            Grammar::Byte => ProtocolKind::Byte,
        }
    }
}

/// Actuator backend that logs to console
struct LoggingActuators;

impl Actuators for LoggingActuators {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        info!("actuators initialized");
        Ok(())
    }

    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        info!(left = cmd.left(), right = cmd.right(), "wheels");
        Ok(())
    }

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), Self::Error> {
        info!(degrees = angle.degrees(), pulse_us = angle.pulse_us(), "servo");
        Ok(())
    }

    fn set_horn(
        &mut self,
        on: bool,
    ) -> Result<(), Self::Error> {
        info!(on, "horn");
        Ok(())
    }
}

struct SimulatedRanger(RangeReading);

impl RangeFinder for SimulatedRanger {
    fn measure(&mut self) -> RangeReading {
        self.0
    }
}

/// Transmit half writing replies to stdout.
struct StdoutTx(std::io::Stdout);

impl embedded_io::ErrorType for StdoutTx {
    type Error = std::io::Error;
}

impl embedded_io::Write for StdoutTx {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0)
    }
}

fn load_config(opts: &Opts) -> Result<ControllerConfig, Box<dyn std::error::Error>> {
    let mut config = match &opts.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => ControllerConfig::default(),
    };
    if let Some(grammar) = opts.protocol {
        config.protocol = grammar.into();
    }
    if opts.extended {
        config.extended_commands = true;
    }
    if opts.no_scan {
        config.scan_enabled = false;
    }
    Ok(config)
}

fn spawn_stdin_reader() {
    std::thread::spawn(|| {
        let mut stdin = std::io::stdin().lock();
        let mut buf = [0u8; 64];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => {
                    info!("stdin closed");
                    return;
                }
                Ok(n) => {
                    for &b in &buf[..n] {
                        while RX.try_send(b).is_err() {
                            std::thread::sleep(Duration::from_millis(1));
                        }
                    }
                }
                Err(e) => {
                    error!("stdin read failed: {:?}", e);
                    return;
                }
            }
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts: Opts = Opts::parse();
    let config = load_config(&opts)?;
    let reading = opts
        .distance
        .map_or(RangeReading::OutOfRange, RangeReading::Measured);

    info!(
        protocol = ?config.protocol,
        baud = config.protocol.baud_rate(),
        "starting mock robot on stdin/stdout"
    );
    spawn_stdin_reader();

    let link = SerialLink::new(ChannelRx::new(&RX), StdoutTx(std::io::stdout()));
    let protocol = AnyProtocol::from(&config);
    let now = Instant::now();
    let mut ctrl = SystemController::new(
        config,
        protocol,
        LoggingActuators,
        SimulatedRanger(reading),
        link,
        now,
    );
    ctrl.start(now)
        .map_err(|e| format!("controller failed to start: {:?}", e))?;

    loop {
        ctrl.poll(Instant::now());
        std::thread::sleep(Duration::from_millis(1));
    }
}
