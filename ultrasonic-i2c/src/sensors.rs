pub mod temperature;
pub mod ultrasonic;

pub use temperature::{AnalogInput, AnalogThermometer, FixedTemperature, TemperatureSource};
pub use ultrasonic::{AverageReading, BlockingReading, BusError, UltrasonicSensor};
