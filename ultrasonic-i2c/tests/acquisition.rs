use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use std::convert::Infallible;
use std::time::Duration;
use ultrasonic_i2c::mock_utils::ManualClock;
use ultrasonic_i2c::sensors::{AnalogInput, AnalogThermometer};
use ultrasonic_i2c::{
    init_tracing, load_sensor_config, ConfigError, RawMeasurement, SensorConfig, SensorError,
    UltrasonicSensor,
};

const ADDR: u8 = 0x34;

fn trigger() -> I2cTransaction {
    I2cTransaction::write(ADDR, vec![0x00])
}

fn distance(bytes: [u8; 2]) -> I2cTransaction {
    I2cTransaction::write_read(ADDR, vec![0x01], bytes.to_vec())
}

#[test]
fn trigger_settle_and_read_both_registers() {
    init_tracing();
    let i2c = I2cMock::new(&[
        trigger(),
        distance([0x64, 0x00]),
        I2cTransaction::write_read(ADDR, vec![0x02], vec![0xE8, 0x03]),
    ]);
    let time = ManualClock::new();
    let mut sensor = UltrasonicSensor::new(i2c, time.clone()).with_clock(time.clone());

    let raw = sensor.measure(Duration::from_millis(120)).unwrap();
    assert_eq!(raw.distance(), 100.0);
    assert_eq!(raw.duration_us, 1000);
    assert_eq!(
        raw,
        RawMeasurement {
            distance_cm: 100,
            duration_us: 1000
        }
    );
    assert_eq!(time.elapsed(), Duration::from_millis(120));

    let (mut i2c, _) = sensor.release();
    i2c.done();
}

#[test]
fn first_reading_after_power_up_is_discarded() {
    init_tracing();
    // The module answers 0 until its first echo has been processed.
    let i2c = I2cMock::new(&[trigger(), distance([0, 0]), trigger(), distance([0x2A, 0x01])]);
    let time = ManualClock::new();
    let mut sensor = UltrasonicSensor::new(i2c, time.clone()).with_clock(time.clone());

    let d = sensor.distance_cm().unwrap();
    assert_eq!(d, 298.0);
    assert_eq!(time.elapsed(), Duration::from_millis(240));

    let (mut i2c, _) = sensor.release();
    i2c.done();
}

#[test]
fn bus_fault_is_distinct_from_no_echo() {
    init_tracing();
    let i2c = I2cMock::new(&[
        trigger(),
        distance([0, 0]),
        trigger(),
        distance([0, 0]),
        trigger(),
        distance([0, 0]),
        trigger().with_error(ErrorKind::Other),
    ]);
    let time = ManualClock::new();
    let mut sensor = UltrasonicSensor::new(i2c, time.clone()).with_clock(time);

    // Nothing in range: a plain zero.
    assert_eq!(sensor.distance_cm().unwrap(), 0.0);
    // Device gone: an error, never a zero.
    let err = sensor.distance_cm().unwrap_err();
    assert!(matches!(err, SensorError::Transport(ErrorKind::Other)));
    assert!(err.to_string().contains("I2C transport failed"));

    let (mut i2c, _) = sensor.release();
    i2c.done();
}

struct BoardAdc(u16);

impl AnalogInput for BoardAdc {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        Ok(self.0)
    }

    fn reference_voltage(&self) -> f32 {
        3.3
    }
}

#[test]
fn compensates_with_board_thermometer_from_config() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("ultrasonic-i2c-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        bus = "/dev/i2c-1"
        address = 0x34

        [acquisition]
        settle_ms = 120
        baseline_temperature_c = 20.0

        [temperature]
        offset_c = 0.0
        "#,
    )
    .unwrap();
    let config = load_sensor_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    // 800 mV on a 3.3 V reference reads as 30 °C.
    let raw = (0.8 / 3.3 * 65535.0f32).round() as u16;
    let mut thermometer = AnalogThermometer::with_calibration(BoardAdc(raw), config.temperature);

    let i2c = I2cMock::new(&[trigger(), distance([0x64, 0x00])]);
    let time = ManualClock::new();
    let mut sensor = UltrasonicSensor::from_config(i2c, time.clone(), &config)
        .unwrap()
        .with_clock(time);

    let d = sensor
        .compensated_distance_from(
            &mut thermometer,
            config.acquisition.baseline_temperature_c,
            config.acquisition.settle(),
        )
        .unwrap();
    assert!((d - 101.76).abs() < 0.02, "got {d}");

    let (mut i2c, _) = sensor.release();
    i2c.done();
}

#[test]
fn invalid_config_never_reaches_the_bus() {
    let config = SensorConfig {
        address: 0x90,
        ..SensorConfig::default()
    };
    let mut i2c = I2cMock::new(&[]);
    let err = UltrasonicSensor::from_config(i2c.clone(), ManualClock::new(), &config)
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    i2c.done();
}
