use crate::prelude::*;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::peripherals::{P0_13, WDT};
use embassy_nrf::wdt;
use embassy_nrf::wdt::Watchdog;
use embassy_nrf::Peri;

pub mod ble;
pub mod display;
pub mod sensor;

// Re-exports
pub use ble::*;
pub use display::*;
pub use sensor::*;

const STATS_PERIOD: Duration = Duration::from_secs(10);
const WATCHDOG_PET_PERIOD: Duration = Duration::from_secs(2);
/// 32.768 kHz ticks: a 5 s timeout leaves room for two missed pets.
const WATCHDOG_TIMEOUT_TICKS: u32 = 5 * 32_768;

// Keeps our system alive
#[embassy_executor::task]
pub async fn watchdog_task(wdt: Peri<'static, WDT>) {
    // A running watchdog keeps its configuration until reset.
    let wdt_config = wdt::Config::try_new(&wdt).unwrap_or_else(|| {
        let mut config = wdt::Config::default();
        config.timeout_ticks = WATCHDOG_TIMEOUT_TICKS;
        config
    });
    let (_wdt, [mut handle]) = match Watchdog::try_new(wdt, wdt_config) {
        Ok(x) => x,
        Err(_) => {
            // Watchdog already active with the wrong number of handles, waiting for it to timeout...
            loop {
                cortex_m::asm::wfe();
            }
        }
    };
    loop {
        handle.pet();
        Timer::after(WATCHDOG_PET_PERIOD).await;
    }
}

/// Lights the status LED (active low) once every pipeline stage is up.
#[embassy_executor::task]
pub async fn status_led_task(
    ctx: &'static AppContext,
    led: Peri<'static, P0_13>,
) {
    let mut led = Output::new(led, Level::High, OutputDrive::Standard);
    ctx.gate
        .wait(
            InitBits::QUEUE_READY
                .union(InitBits::BUFFER_READY)
                .union(InitBits::SIGNAL_READY)
                .union(InitBits::BROADCAST_READY),
        )
        .await;
    led.set_low();
    info!("all pipeline stages up");
    core::future::pending::<()>().await
}

#[embassy_executor::task]
pub async fn stats_task(ctx: &'static AppContext) {
    loop {
        Timer::after(STATS_PERIOD).await;
        let stats = ctx.stats.snapshot();
        info!(
            "stats: {:?}, {=u32} signals coalesced, {=usize} entries in history",
            stats,
            ctx.ready.coalesced(),
            ctx.history.len()
        );
    }
}
