//! Task pipeline behind a DHT22 temperature beacon.
//!
//! A sensor task feeds a bounded [`queue`], the processor records each
//! sample in a byte-ring [`history`] and raises a [`signal`], and the
//! broadcaster turns the newest history entry into an [`advertising`]
//! payload. Everything is generic over the raw mutex so the same code runs
//! under the firmware executor and in host tests.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod advertising;
pub mod broadcast;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod history;
pub mod payload;
pub mod processor;
pub mod queue;
pub mod sample;
pub mod sensor;
pub mod signal;
pub mod stats;

pub use advertising::{
    AdvEvent, AdvParams, AdvState, AdvertisingControl, AdvertisingHandle,
    AdvertisingStack,
};
pub use broadcast::BroadcastTask;
pub use context::Context;
pub use error::{
    HistoryError, PayloadError, QueueError, SampleError, SensorError,
};
pub use fmt::LogFormat;
pub use gate::{InitBits, InitGate};
pub use history::{HistoryBuffer, Overflow};
pub use payload::BroadcastPayload;
pub use processor::{Display, ProcessorConfig, ProcessorTask, RenderError};
pub use sample::{SensorSample, TemperatureUnit};
pub use sensor::{HumiditySensor, RawReading, SensorConfig, SensorTask};
pub use signal::ReadySignal;
pub use stats::{PipelineStats, StatsSnapshot};
