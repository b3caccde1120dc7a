use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};

use crate::config::{
    ENQUEUE_TIMEOUT, SAMPLE_PERIOD, SENSOR_MIN_SPACING, TEMPERATURE_UNIT,
};
use crate::context::Context;
use crate::error::{SampleError, SensorError};
use crate::gate::InitBits;
use crate::sample::{SensorSample, TemperatureUnit};

/// Reading as delivered by the driver, before unit conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// A temperature/humidity sensor. The driver owns its pin and the
/// bit-level protocol.
#[allow(async_fn_in_trait)]
pub trait HumiditySensor {
    type Error: Into<SensorError>;

    async fn read(&mut self) -> Result<RawReading, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    pub period: Duration,
    /// Reads are never issued closer together than this.
    pub min_spacing: Duration,
    pub unit: TemperatureUnit,
    pub enqueue_timeout: Duration,
}

impl SensorConfig {
    /// The cadence actually used: the period, stretched to the minimum
    /// read spacing when it is shorter.
    pub fn interval(&self) -> Duration {
        self.period.max(self.min_spacing)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            period: SAMPLE_PERIOD,
            min_spacing: SENSOR_MIN_SPACING,
            unit: TEMPERATURE_UNIT,
            enqueue_timeout: ENQUEUE_TIMEOUT,
        }
    }
}

/// Polls the sensor on a fixed cadence and feeds the sample queue.
pub struct SensorTask<'a, M: RawMutex, S: HumiditySensor> {
    ctx: &'a Context<M>,
    sensor: S,
    config: SensorConfig,
}

impl<'a, M: RawMutex, S: HumiditySensor> SensorTask<'a, M, S> {
    pub const REQUIRES: InitBits = InitBits::QUEUE_READY;

    pub fn new(ctx: &'a Context<M>, sensor: S, config: SensorConfig) -> Self {
        Self { ctx, sensor, config }
    }

    /// Read the sensor once and convert to the configured unit.
    pub async fn poll(&mut self) -> Result<SensorSample, SensorError> {
        let raw = self.sensor.read().await.map_err(Into::<SensorError>::into)?;
        Ok(SensorSample::new(
            self.config.unit.from_celsius(raw.temperature_c),
            raw.humidity_pct,
        ))
    }

    /// One cycle: poll, then enqueue with a bounded wait. Failures are
    /// logged and counted here; the caller only needs the result for tests.
    pub async fn step(&mut self) -> Result<SensorSample, SampleError> {
        let sample = match self.poll().await {
            Ok(sample) => {
                self.ctx.stats.record_sensor_read();
                sample
            }
            Err(e) => {
                warn!("sensor read failed: {:?}", e);
                self.ctx.stats.record_sensor_fault();
                return Err(e.into());
            }
        };

        if let Err(e) =
            self.ctx.queue.send_timeout(sample, self.config.enqueue_timeout).await
        {
            warn!("sample queue full, dropped {:?}", sample);
            self.ctx.stats.record_sample_dropped();
            return Err(e.into());
        }
        trace!("queued {:?}", sample);
        Ok(sample)
    }

    pub async fn run(mut self) -> ! {
        self.ctx.gate.wait(Self::REQUIRES).await;
        if self.config.period < self.config.min_spacing {
            warn!(
                "sensor period {:?} stretched to {:?}",
                self.config.period,
                self.config.min_spacing
            );
        }
        info!("sensor task running every {:?}", self.config.interval());

        let mut ticker = Ticker::every(self.config.interval());
        loop {
            let _ = self.step().await;
            ticker.next().await;
        }
    }
}
