//! Compile-time configuration. There is no runtime configuration surface.

use embassy_time::Duration;

use crate::sample::TemperatureUnit;

/// Slots in the sensor → processor queue.
pub const SAMPLE_QUEUE_DEPTH: usize = 5;
/// Bytes in the history ring.
pub const HISTORY_CAPACITY: usize = 1024;
/// Pending advertising events the actor can hold.
pub const ADV_EVENT_DEPTH: usize = 4;
/// Tasks that may park on the init gate at the same time.
pub const GATE_WAITERS: usize = 4;

/// Nominal sensor poll period.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(1000);
/// The DHT22 must not be read more often than this.
pub const SENSOR_MIN_SPACING: Duration = Duration::from_millis(2000);

pub const ENQUEUE_TIMEOUT: Duration = Duration::from_millis(100);
pub const HISTORY_WRITE_TIMEOUT: Duration = Duration::from_millis(100);
pub const HISTORY_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Unit samples are published in, on the display and over the air.
pub const TEMPERATURE_UNIT: TemperatureUnit = TemperatureUnit::Fahrenheit;

pub const DEVICE_NAME: &str = "kdc-thermo";

/// Advertising interval bounds.
pub const ADV_INTERVAL_MIN: Duration = Duration::from_millis(100);
pub const ADV_INTERVAL_MAX: Duration = Duration::from_millis(150);
