#![no_std]
#![no_main]

use embassy_executor::Spawner;
use static_cell::StaticCell;

#[cfg(feature = "defmt")]
use defmt_rtt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_reset as _;

use kdc_thermo_app::prelude::*;

static APP_CONTEXT: StaticCell<AppContext> = StaticCell::new();

// Application main entry point. The spawner can be used to start async tasks.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("kdc-thermo fw {=str} hw {=str}", FW_VERSION, HW_VERSION);
    // First we initialize our board.
    let board = KdcThermo::default();

    spawner.must_spawn(watchdog_task(board.wdt));

    // Any failure up to `bring_up` is a fatal boot error: no pipeline task
    // gets past its gate until the primitives exist.
    let (sdc, mpsl) = unwrap!(board.ble.init(board.timer0, board.rng));
    spawner.must_spawn(mpsl_task(mpsl));

    let ctx: &'static AppContext =
        APP_CONTEXT.init(AppContext::new(Overflow::EvictOldest));
    let payload = unwrap!(BroadcastPayload::new(DEVICE_NAME));

    let (medium_prio_spawner, high_prio_spawner) = init_executors();

    let sensor = Dht22Sensor::new(board.sensor.into_data_pin());
    high_prio_spawner.must_spawn(sensor_task(ctx, sensor));

    let display = OledDisplay::new(board.display.into_bus()).await;
    medium_prio_spawner.must_spawn(processor_task(ctx, display));

    let (peripheral, runner) = start_host(sdc);
    spawner.must_spawn(runner_task(ctx, runner));
    spawner.must_spawn(ble_task(ctx, peripheral, payload.clone()));
    spawner.must_spawn(broadcast_task(ctx, payload));

    spawner.must_spawn(stats_task(ctx));
    spawner.must_spawn(status_led_task(ctx, board.led));

    ctx.bring_up();
}
