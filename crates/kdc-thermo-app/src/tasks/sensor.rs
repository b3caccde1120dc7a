use crate::prelude::*;
use dht22::Dht22;
use embassy_nrf::gpio::Flex;
use embedded_hal::delay::DelayNs;
use thermo_pipeline::{
    HumiditySensor, RawReading, SensorConfig, SensorError, SensorTask,
};

/// Core clock, used to turn delays into busy-wait cycles.
const CPU_HZ: u32 = 64_000_000;

/// Cycle-counting delay. The RTC-backed `embassy_time::Delay` ticks at
/// ~30 µs, too coarse for the 1 µs edge polling of the DHT protocol.
pub struct CycleDelay;

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * CPU_HZ as u64 / 1_000_000_000) as u32;
        cortex_m::asm::delay(cycles.max(1));
    }
}

/// DHT22 on its open-drain data pin.
///
/// The frame is read with interrupts enabled so the radio keeps its
/// timing; an edge stretched by a radio event shows up as a checksum or
/// timeout fault and the next cycle reads again.
pub struct Dht22Sensor {
    driver: Dht22<Flex<'static>, CycleDelay>,
}

impl Dht22Sensor {
    pub fn new(pin: Flex<'static>) -> Self {
        Self { driver: Dht22::new(pin, CycleDelay) }
    }
}

impl HumiditySensor for Dht22Sensor {
    type Error = SensorError;

    async fn read(&mut self) -> Result<RawReading, SensorError> {
        let reading = self.driver.read().map_err(sensor_error)?;
        Ok(RawReading {
            temperature_c: reading.temperature,
            humidity_pct: reading.humidity,
        })
    }
}

fn sensor_error<E>(e: dht22::Error<E>) -> SensorError {
    match e {
        dht22::Error::Pin(_) => SensorError::Pin,
        dht22::Error::Timeout => SensorError::Timeout,
        dht22::Error::Checksum => SensorError::Checksum,
    }
}

#[embassy_executor::task]
pub async fn sensor_task(ctx: &'static AppContext, sensor: Dht22Sensor) {
    SensorTask::new(ctx, sensor, SensorConfig::default()).run().await
}
