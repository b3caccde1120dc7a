use serde::{Deserialize, Serialize};

/// One temperature/humidity reading, copied by value across every stage.
///
/// `temperature` is in the unit the sensor task was configured with
/// (see [`TemperatureUnit`]); `humidity` is relative humidity in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSample {
    pub temperature: f32,
    pub humidity: f32,
}

impl SensorSample {
    pub const fn new(temperature: f32, humidity: f32) -> Self {
        Self { temperature, humidity }
    }
}

/// Unit the sensor task converts raw Celsius readings into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    Celsius,
    /// `F = C * 1.8 + 32`
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 1.8 + 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(0.0), 32.0);
        assert!((TemperatureUnit::Fahrenheit.from_celsius(100.0) - 212.0).abs() < 1e-4);
        assert!((TemperatureUnit::Fahrenheit.from_celsius(22.5) - 72.5).abs() < 1e-4);
    }

    #[test]
    fn celsius_is_passthrough() {
        assert_eq!(TemperatureUnit::Celsius.from_celsius(-12.25), -12.25);
    }
}
