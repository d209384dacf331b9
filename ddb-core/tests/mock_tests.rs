use core::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use ddb_core::utils::config::{ControllerConfig, ProtocolKind};
use ddb_core::utils::connection::link::{ChannelRx, SerialLink};
use ddb_core::utils::connection::protocol::AnyProtocol;
use ddb_core::utils::controllers::actuators::{Actuators, GpioActuators, Motor, Servo, ServoAngle};
use ddb_core::utils::controllers::pca9685::{ChannelMap, Pca9685Actuators, DEFAULT_ADDRESS};
use ddb_core::utils::controllers::ranging::{Hcsr04, RangeFinder, RangeReading};
use ddb_core::utils::controllers::{ControllerError, SystemController};
use ddb_core::utils::math::mixing::{DriveCommand, JoystickInput};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

/// I2C address for the PWM board.
pub const PWM_ADDRESS: u8 = DEFAULT_ADDRESS;

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

/// PWM output that remembers the last duty it was given.
#[derive(Clone)]
struct FakePwm {
    max: u16,
    duty: Rc<Cell<u16>>,
}

impl FakePwm {
    fn new(max: u16) -> Self {
        Self {
            max,
            duty: Rc::new(Cell::new(0)),
        }
    }
}

impl ErrorType for FakePwm {
    type Error = Infallible;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), Self::Error> {
        self.duty.set(duty);
        Ok(())
    }
}

/// Actuators that record every command instead of touching hardware.
#[derive(Debug, Default)]
struct RecordingActuators {
    drives: Vec<DriveCommand>,
    servo: Vec<ServoAngle>,
    horn: bool,
    fail_init: bool,
}

impl Actuators for RecordingActuators {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.fail_init {
            Err("bus down")
        } else {
            Ok(())
        }
    }

    fn drive(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        self.drives.push(cmd);
        Ok(())
    }

    fn set_servo(
        &mut self,
        angle: ServoAngle,
    ) -> Result<(), Self::Error> {
        self.servo.push(angle);
        Ok(())
    }

    fn set_horn(
        &mut self,
        on: bool,
    ) -> Result<(), Self::Error> {
        self.horn = on;
        Ok(())
    }
}

struct FixedRanger(RangeReading);

impl RangeFinder for FixedRanger {
    fn measure(&mut self) -> RangeReading {
        self.0
    }
}

type RxChannel = Channel<CriticalSectionRawMutex, u8, 128>;
type TestController<'a> = SystemController<
    AnyProtocol,
    RecordingActuators,
    FixedRanger,
    ChannelRx<'a, CriticalSectionRawMutex, 128>,
    Vec<u8>,
>;

/// Scanning off and telemetry far away, so only command replies show up.
fn quiet_config() -> ControllerConfig {
    ControllerConfig {
        scan_enabled: false,
        telemetry_period_ms: 60_000,
        ..ControllerConfig::default()
    }
}

fn started(
    channel: &RxChannel,
    config: ControllerConfig,
    reading: RangeReading,
) -> TestController<'_> {
    let link = SerialLink::new(ChannelRx::new(channel), Vec::new());
    let protocol = AnyProtocol::from(&config);
    let mut ctrl = SystemController::new(
        config,
        protocol,
        RecordingActuators::default(),
        FixedRanger(reading),
        link,
        at(0),
    );
    ctrl.start(at(0)).unwrap();
    ctrl
}

fn send(
    channel: &RxChannel,
    bytes: &[u8],
) {
    for &b in bytes {
        channel.try_send(b).unwrap();
    }
}

/// Take everything written so far, split into lines.
fn lines(ctrl: &mut TestController<'_>) -> Vec<String> {
    let out = std::mem::take(ctrl.link().tx_mut());
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn wheels(ctrl: &TestController<'_>) -> (i16, i16) {
    let drive = ctrl.state().drive;
    (drive.left(), drive.right())
}

#[test]
fn test_start_announces_ready_and_centers() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    assert_eq!(lines(&mut ctrl), ["READY"]);
    assert_eq!(ctrl.actuators().drives, [DriveCommand::STOP]);
    assert_eq!(ctrl.actuators().servo, [ServoAngle::CENTER]);
}

#[test]
fn test_start_failure_is_reported() {
    let channel = RxChannel::new();
    let config = quiet_config();
    let link = SerialLink::new(ChannelRx::new(&channel), Vec::new());
    let actuators = RecordingActuators {
        fail_init: true,
        ..RecordingActuators::default()
    };
    let mut ctrl = SystemController::new(
        config.clone(),
        AnyProtocol::from(&config),
        actuators,
        FixedRanger(RangeReading::OutOfRange),
        link,
        at(0),
    );
    assert!(matches!(
        ctrl.start(at(0)),
        Err(ControllerError::ActuatorInit("bus down"))
    ));
    assert!(ctrl.link().tx_mut().is_empty());
}

#[test]
fn test_direct_motor_command_is_clamped() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:300,R:-999\n");
    ctrl.poll(at(10));
    assert_eq!(lines(&mut ctrl), ["MOTORS:255,-255"]);
    assert_eq!(wheels(&ctrl), (255, -255));
    assert_eq!(
        ctrl.actuators().drives.last(),
        Some(&DriveCommand::new(255, -255))
    );
}

#[test]
fn test_oversized_numbers_are_clamped_not_dropped() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:99999999999,R:-99999999999\nS:5000000000\n");
    ctrl.poll(at(10));
    assert_eq!(lines(&mut ctrl), ["MOTORS:255,-255", "SERVO:180"]);
    assert_eq!(wheels(&ctrl), (255, -255));
}

#[test]
fn test_servo_command_is_clamped() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"S:200\r\n");
    ctrl.poll(at(10));
    assert_eq!(lines(&mut ctrl), ["SERVO:180"]);
    assert_eq!(ctrl.state().servo.degrees(), 180);
}

#[test]
fn test_line_split_across_iterations() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:12");
    ctrl.poll(at(10));
    assert!(lines(&mut ctrl).is_empty());
    send(&channel, b"0,R:5\n");
    ctrl.poll(at(20));
    assert_eq!(lines(&mut ctrl), ["MOTORS:120,5"]);
}

#[test]
fn test_watchdog_stops_once() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:100,R:100\n");
    ctrl.poll(at(0));
    ctrl.poll(at(300));
    assert_eq!(lines(&mut ctrl), ["MOTORS:100,100"]);

    ctrl.poll(at(600));
    assert_eq!(lines(&mut ctrl), ["TIMEOUT_STOP"]);
    assert_eq!(wheels(&ctrl), (0, 0));

    ctrl.poll(at(1_200));
    ctrl.poll(at(5_000));
    assert!(lines(&mut ctrl).is_empty());

    // A new command re-arms it.
    send(&channel, b"L:50,R:-50\n");
    ctrl.poll(at(6_000));
    ctrl.poll(at(6_600));
    assert_eq!(lines(&mut ctrl), ["MOTORS:50,-50", "TIMEOUT_STOP"]);
}

#[test]
fn test_garbage_does_not_feed_watchdog() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:100,R:100\n");
    ctrl.poll(at(0));
    send(&channel, b"HELLO\nL:x,R:1\n");
    ctrl.poll(at(400));
    ctrl.poll(at(501));
    assert_eq!(lines(&mut ctrl), ["MOTORS:100,100", "TIMEOUT_STOP"]);
}

#[test]
fn test_recognized_command_feeds_watchdog() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::Measured(42));
    lines(&mut ctrl);

    send(&channel, b"L:100,R:100\n");
    ctrl.poll(at(0));
    send(&channel, b"D\n");
    ctrl.poll(at(400));
    ctrl.poll(at(501));
    assert_eq!(lines(&mut ctrl), ["MOTORS:100,100", "DIST:42"]);
    assert_eq!(wheels(&ctrl), (100, 100));
}

#[test]
fn test_operator_stop_is_distinct() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"L:80,R:80\nSTOP\n");
    ctrl.poll(at(10));
    assert_eq!(lines(&mut ctrl), ["MOTORS:80,80", "EMERGENCY_STOP"]);
    assert_eq!(wheels(&ctrl), (0, 0));

    ctrl.poll(at(2_000));
    assert!(lines(&mut ctrl).is_empty());
}

#[test]
fn test_on_demand_range_uses_sentinel() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"D\n");
    ctrl.poll(at(10));
    assert_eq!(lines(&mut ctrl), ["DIST:999"]);
    assert_eq!(ctrl.state().distance, RangeReading::OutOfRange);
}

#[test]
fn test_status_block() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"STATUS\n");
    ctrl.poll(at(25));
    let out = lines(&mut ctrl);
    assert_eq!(out.first().map(String::as_str), Some("=== STATUS ==="));
    assert_eq!(out.last().map(String::as_str), Some("=== END ==="));
    assert!(out.iter().any(|l| l == "Motors: 0,0"));
    assert!(out.iter().any(|l| l == "Servo: 90"));
    assert!(out.iter().any(|l| l == "Speed level: 3"));
    assert!(out.iter().any(|l| l == "Scanning: off"));
    assert!(out.iter().any(|l| l == "Link: active"));
    assert!(out.iter().any(|l| l == "Uptime ms: 25"));
}

#[test]
fn test_telemetry_period() {
    let channel = RxChannel::new();
    let config = ControllerConfig {
        scan_enabled: false,
        ..ControllerConfig::default()
    };
    let mut ctrl = started(&channel, config, RangeReading::OutOfRange);
    lines(&mut ctrl);

    ctrl.poll(at(50));
    assert!(lines(&mut ctrl).is_empty());
    ctrl.poll(at(100));
    assert_eq!(lines(&mut ctrl), ["ST:0,0,90,0"]);
    ctrl.poll(at(150));
    assert!(lines(&mut ctrl).is_empty());

    send(&channel, b"L:-20,R:20\n");
    ctrl.poll(at(200));
    assert_eq!(lines(&mut ctrl), ["MOTORS:-20,20", "ST:-20,20,90,0"]);
}

#[test]
fn test_scan_moves_then_measures() {
    let channel = RxChannel::new();
    let config = ControllerConfig {
        telemetry_period_ms: 60_000,
        ..ControllerConfig::default()
    };
    let mut ctrl = started(&channel, config, RangeReading::Measured(42));
    lines(&mut ctrl);

    ctrl.poll(at(501));
    assert_eq!(ctrl.actuators().servo.last(), Some(&ServoAngle::new(30)));
    assert!(lines(&mut ctrl).is_empty());

    ctrl.poll(at(550));
    assert!(lines(&mut ctrl).is_empty());
    ctrl.poll(at(601));
    assert_eq!(lines(&mut ctrl), ["DIST:L30:42"]);

    ctrl.poll(at(1_002));
    ctrl.poll(at(1_102));
    ctrl.poll(at(1_503));
    ctrl.poll(at(1_603));
    assert_eq!(lines(&mut ctrl), ["DIST:C90:42", "DIST:R150:42"]);
}

#[test]
fn test_scan_skips_sample_after_operator_moves_servo() {
    let channel = RxChannel::new();
    let config = ControllerConfig {
        telemetry_period_ms: 60_000,
        ..ControllerConfig::default()
    };
    let mut ctrl = started(&channel, config, RangeReading::Measured(42));
    lines(&mut ctrl);

    ctrl.poll(at(501));
    assert_eq!(ctrl.state().servo, ServoAngle::new(30));
    send(&channel, b"S:170\n");
    ctrl.poll(at(550));
    ctrl.poll(at(601));
    assert_eq!(lines(&mut ctrl), ["SERVO:170"]);
    assert_eq!(ctrl.state().servo, ServoAngle::new(170));
    assert_eq!(ctrl.state().distance, RangeReading::SensorFault);

    // The sweep carries on with the next phase.
    ctrl.poll(at(1_002));
    ctrl.poll(at(1_102));
    assert_eq!(lines(&mut ctrl), ["DIST:C90:42"]);
}

#[test]
fn test_scan_can_be_turned_off() {
    let channel = RxChannel::new();
    let config = ControllerConfig {
        telemetry_period_ms: 60_000,
        ..ControllerConfig::default()
    };
    let mut ctrl = started(&channel, config, RangeReading::Measured(42));
    lines(&mut ctrl);

    ctrl.set_scanning(false, at(100));
    ctrl.poll(at(700));
    ctrl.poll(at(900));
    assert!(lines(&mut ctrl).is_empty());
    assert_eq!(ctrl.actuators().servo, [ServoAngle::CENTER]);
}

fn byte_config(extended: bool) -> ControllerConfig {
    ControllerConfig {
        protocol: ProtocolKind::Byte,
        extended_commands: extended,
        ..quiet_config()
    }
}

#[test]
fn test_byte_forward_uses_level_speed() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, byte_config(false), RangeReading::OutOfRange);
    lines(&mut ctrl);

    send(&channel, b"w");
    ctrl.poll(at(10));
    assert_eq!(wheels(&ctrl), (180, 180));

    send(&channel, b"5a");
    ctrl.poll(at(20));
    assert_eq!(lines(&mut ctrl), ["SPEED:5"]);
    assert_eq!(wheels(&ctrl), (-255, 255));

    send(&channel, b"?x");
    ctrl.poll(at(30));
    assert_eq!(lines(&mut ctrl), ["EMERGENCY_STOP"]);
    assert_eq!(wheels(&ctrl), (0, 0));
}

#[test]
fn test_byte_extended_servo_and_horn() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, byte_config(true), RangeReading::Measured(7));
    lines(&mut ctrl);

    send(&channel, b"llRc");
    ctrl.poll(at(10));
    assert_eq!(
        lines(&mut ctrl),
        ["SERVO:75", "SERVO:60", "SERVO:75", "SERVO:90"]
    );

    send(&channel, b"H");
    ctrl.poll(at(100));
    assert!(ctrl.actuators().horn);
    ctrl.poll(at(299));
    assert!(ctrl.actuators().horn);
    ctrl.poll(at(300));
    assert!(!ctrl.actuators().horn);

    send(&channel, b"m");
    ctrl.poll(at(310));
    assert_eq!(lines(&mut ctrl), ["DIST:7"]);
}

#[test]
fn test_byte_extended_commands_off_by_default() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, byte_config(false), RangeReading::Measured(7));
    lines(&mut ctrl);

    send(&channel, b"lrchm");
    ctrl.poll(at(10));
    assert!(lines(&mut ctrl).is_empty());
    assert!(!ctrl.actuators().horn);
}

#[test]
fn test_joystick_feeds_watchdog_and_boosts() {
    let channel = RxChannel::new();
    let mut ctrl = started(&channel, quiet_config(), RangeReading::OutOfRange);
    lines(&mut ctrl);

    ctrl.apply_joystick(
        JoystickInput {
            x: 0,
            y: 64,
            trigger: 255,
        },
        at(0),
    );
    // forward 127, boosted to 254
    assert_eq!(wheels(&ctrl), (254, 254));

    ctrl.apply_joystick(
        JoystickInput {
            x: 10,
            y: 64,
            trigger: 0,
        },
        at(400),
    );
    ctrl.poll(at(800));
    assert_eq!(wheels(&ctrl), (127, 127));
    ctrl.poll(at(901));
    assert_eq!(lines(&mut ctrl), ["TIMEOUT_STOP"]);
}

#[test]
fn test_config_from_partial_json() {
    let config: ControllerConfig =
        serde_json::from_str(r#"{"protocol":"byte","scan_enabled":false}"#).unwrap();
    assert_eq!(config.protocol, ProtocolKind::Byte);
    assert_eq!(config.protocol.baud_rate(), 9_600);
    assert!(!config.scan_enabled);
    assert_eq!(config.watchdog_timeout_ms, 500);
    assert_eq!(config.telemetry_period_ms, 100);
}

#[test]
fn test_ranging_measures_echo_width() {
    let trigger = PinMock::new(&[
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let mut echo_tx = vec![PinTransaction::get(PinState::Low)];
    echo_tx.extend((0..148).map(|_| PinTransaction::get(PinState::High)));
    echo_tx.push(PinTransaction::get(PinState::Low));
    let echo = PinMock::new(&echo_tx);

    let mut sensor = Hcsr04::new(trigger, echo, NoopDelay::new(), 30_000);
    assert_eq!(sensor.measure(), RangeReading::Measured(25));

    let (mut trigger, mut echo, _) = sensor.release();
    trigger.done();
    echo.done();
}

#[test]
fn test_ranging_without_echo_is_out_of_range() {
    let trigger = PinMock::new(&[
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let echo_tx: Vec<_> = (0..11).map(|_| PinTransaction::get(PinState::Low)).collect();
    let echo = PinMock::new(&echo_tx);

    let mut sensor = Hcsr04::new(trigger, echo, NoopDelay::new(), 100);
    let reading = sensor.measure();
    assert_eq!(reading, RangeReading::OutOfRange);
    assert_eq!(reading.wire_value(), 999);

    let (mut trigger, mut echo, _) = sensor.release();
    trigger.done();
    echo.done();
}

#[test]
fn test_ranging_stuck_echo_times_out() {
    let trigger = PinMock::new(&[
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let mut echo_tx = vec![PinTransaction::get(PinState::Low)];
    echo_tx.extend((0..11).map(|_| PinTransaction::get(PinState::High)));
    let echo = PinMock::new(&echo_tx);

    let mut sensor = Hcsr04::new(trigger, echo, NoopDelay::new(), 100);
    assert_eq!(sensor.measure(), RangeReading::OutOfRange);

    let (mut trigger, mut echo, _) = sensor.release();
    trigger.done();
    echo.done();
}

#[test]
fn test_gpio_actuators_drive_and_servo() {
    let left_in1 = PinMock::new(&[PinTransaction::set(PinState::High)]);
    let left_in2 = PinMock::new(&[PinTransaction::set(PinState::Low)]);
    let right_in1 = PinMock::new(&[PinTransaction::set(PinState::Low)]);
    let right_in2 = PinMock::new(&[PinTransaction::set(PinState::High)]);
    let horn = PinMock::new(&[
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let left_pwm = FakePwm::new(255);
    let right_pwm = FakePwm::new(255);
    let servo_pwm = FakePwm::new(20_000);

    let mut acts = GpioActuators::new(
        Motor::new(left_in1, left_in2, left_pwm.clone()),
        Motor::new(right_in1, right_in2, right_pwm.clone()),
        Servo::new(servo_pwm.clone()),
        horn,
    );
    acts.drive(DriveCommand::new(150, -80)).unwrap();
    acts.set_servo(ServoAngle::CENTER).unwrap();
    acts.set_horn(true).unwrap();
    acts.set_horn(false).unwrap();

    assert_eq!(left_pwm.duty.get(), 150);
    assert_eq!(right_pwm.duty.get(), 80);
    assert_eq!(servo_pwm.duty.get(), 1_500);

    let (left, right, _, mut horn) = acts.release();
    let (mut l1, mut l2, _) = left.release();
    let (mut r1, mut r2, _) = right.release();
    l1.done();
    l2.done();
    r1.done();
    r2.done();
    horn.done();
}

#[test]
fn test_pca9685_init() {
    // Enable, prescale for 50Hz (includes sleep handling), then stop, center and silence
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0xFE, 121]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x21]),
        write(PWM_ADDRESS, vec![0x06, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0A, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x16, 0x00, 0x00, 0x33, 0x01]),
        write(PWM_ADDRESS, vec![0x1A, 0x00, 0x00, 0x00, 0x00]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut acts = Pca9685Actuators::new(&i2c_bus, PWM_ADDRESS, ChannelMap::default()).unwrap();
    acts.init().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_pca9685_drive_stop() {
    // One auto-increment write, then phase/enable for each wheel
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x06, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0A, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0x00, 0x00]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut acts = Pca9685Actuators::new(&i2c_bus, PWM_ADDRESS, ChannelMap::default()).unwrap();
    acts.drive(DriveCommand::STOP).unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_pca9685_drive_full_reverse_left() {
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x06, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x0A, 0x00, 0x00, 0xFF, 0x0F]),
        write(PWM_ADDRESS, vec![0x0E, 0x00, 0x00, 0x00, 0x00]),
        write(PWM_ADDRESS, vec![0x12, 0x00, 0x00, 0xFF, 0x0F]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut acts = Pca9685Actuators::new(&i2c_bus, PWM_ADDRESS, ChannelMap::default()).unwrap();
    acts.drive(DriveCommand::new(-255, 255)).unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_pca9685_servo_center() {
    // 1500us of a 20ms period is 307 counts (0x0133)
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x31]),
        write(PWM_ADDRESS, vec![0x16, 0x00, 0x00, 0x33, 0x01]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut acts = Pca9685Actuators::new(&i2c_bus, PWM_ADDRESS, ChannelMap::default()).unwrap();
    acts.set_servo(ServoAngle::CENTER).unwrap();
    i2c_bus.borrow_mut().done();
}
