//! Air temperature compensation.
//!
//! The module's firmware converts echo time to distance with a fixed speed
//! of sound. Scaling a reading by `v(T) / v(T0)` corrects it for the actual
//! air temperature `T`, where `T0` is the temperature the firmware assumes.

/// Speed of sound at 0 °C, m/s.
pub const SPEED_OF_SOUND_0C: f32 = 331.3;

/// Linear increase of the speed of sound, m/s per °C.
pub const SPEED_OF_SOUND_SLOPE: f32 = 0.606;

/// Temperature the module firmware is assumed to be calibrated at.
pub const DEFAULT_BASELINE_C: f32 = 20.0;

/// Approximate speed of sound in air at `temperature_c`, in m/s.
pub fn speed_of_sound_m_s(temperature_c: f32) -> f32 {
    SPEED_OF_SOUND_0C + SPEED_OF_SOUND_SLOPE * temperature_c
}

/// True when the speed of sound at `temperature_c` is finite and positive,
/// i.e. the temperature can serve as a compensation baseline.
pub fn is_physical_temperature(temperature_c: f32) -> bool {
    temperature_c.is_finite() && speed_of_sound_m_s(temperature_c) > 0.0
}

/// Measured and baseline air temperature for one correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationParams {
    pub temperature_c: f32,
    pub baseline_c: f32,
}

impl CompensationParams {
    pub fn new(temperature_c: f32, baseline_c: f32) -> Self {
        Self {
            temperature_c,
            baseline_c,
        }
    }

    /// Correction against the default 20 °C baseline.
    pub fn at(temperature_c: f32) -> Self {
        Self::new(temperature_c, DEFAULT_BASELINE_C)
    }

    pub fn scale(&self) -> f32 {
        speed_of_sound_m_s(self.temperature_c) / speed_of_sound_m_s(self.baseline_c)
    }

    /// Apply the correction. The zero sentinel stays zero.
    pub fn apply(&self, distance_cm: f32) -> f32 {
        // Scale first so equal temperatures multiply by exactly 1.0.
        let scale = self.scale();
        distance_cm * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_of_sound_uses_linear_model() {
        assert_eq!(speed_of_sound_m_s(0.0), 331.3);
        assert!((speed_of_sound_m_s(20.0) - 343.42).abs() < 1e-3);
        assert!((speed_of_sound_m_s(30.0) - 349.48).abs() < 1e-3);
    }

    #[test]
    fn equal_temperatures_leave_distance_untouched() {
        for baseline in [-10.0f32, 0.0, 20.0, 37.5] {
            let params = CompensationParams::new(baseline, baseline);
            assert_eq!(params.scale(), 1.0);
            for d in [1.0f32, 16.0, 100.0, 399.0, 65535.0] {
                assert_eq!(params.apply(d), d);
            }
        }
    }

    #[test]
    fn warmer_air_lengthens_the_distance() {
        let params = CompensationParams::at(30.0);
        let scale = params.scale();
        assert!((scale - 349.48 / 343.42).abs() < 1e-5);
        assert!((params.apply(100.0) - 101.7646).abs() < 0.01);
    }

    #[test]
    fn colder_air_shortens_the_distance() {
        let params = CompensationParams::at(0.0);
        assert!(params.apply(100.0) < 100.0);
    }

    #[test]
    fn baseline_must_have_positive_speed_of_sound() {
        assert!(is_physical_temperature(DEFAULT_BASELINE_C));
        assert!(is_physical_temperature(-40.0));
        assert!(!is_physical_temperature(-SPEED_OF_SOUND_0C / SPEED_OF_SOUND_SLOPE));
        assert!(!is_physical_temperature(-600.0));
        assert!(!is_physical_temperature(f32::NAN));
        assert!(!is_physical_temperature(f32::INFINITY));
    }

    #[test]
    fn zero_sentinel_is_preserved() {
        assert_eq!(CompensationParams::at(35.0).apply(0.0), 0.0);
    }
}
