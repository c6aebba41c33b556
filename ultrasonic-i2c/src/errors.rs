use thiserror::Error;

/// Errors raised while talking to the ultrasonic module.
///
/// `E` is the error type of the underlying I2C transport. A missing echo is
/// not an error: the acquisition strategies report it as a `0.0` distance.
#[derive(Error, Debug)]
pub enum SensorError<E> {
    #[error("I2C transport failed: {0:?}")]
    Transport(E),

    #[error("Temperature source failed: {reason}")]
    TemperatureSource { reason: String },

    #[error("Baseline temperature {baseline_c} °C has no positive speed of sound")]
    InvalidBaseline { baseline_c: f32 },

    #[error("Acquisition task was cancelled before it completed")]
    Cancelled,
}

impl<E> SensorError<E> {
    /// True when the failure came from the bus rather than from a collaborator.
    pub fn is_transport(&self) -> bool {
        matches!(self, SensorError::Transport(_))
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Bus '{bus}' not found or unavailable: {reason}")]
    BusUnavailable { bus: String, reason: String },
}

/// Result type aliases for convenience
pub type SensorResult<T, E> = Result<T, SensorError<E>>;
pub type ConfigResult<T> = Result<T, ConfigError>;
