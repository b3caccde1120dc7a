pub mod advertiser;

use kdc_thermo_bsp::ble::{MultiprotocolServiceLayer, SoftdeviceController};
use static_cell::StaticCell;
use thermo_pipeline::{
    AdvParams, AdvertisingControl, BroadcastPayload, BroadcastTask,
};
use trouble_host::prelude::*;

pub use advertiser::*;

use crate::prelude::*;

/// The beacon never accepts a connection; the host still needs room for
/// one link and its signalling channel.
const CONNECTIONS_MAX: usize = 1;
const L2CAP_CHANNELS_MAX: usize = 1;
const L2CAP_MTU: usize = 27;

pub type BleController = SoftdeviceController<'static>;

pub type BleResources =
    HostResources<CONNECTIONS_MAX, L2CAP_CHANNELS_MAX, L2CAP_MTU>;

/// Static random address derived from the factory device address, so
/// every board advertises under its own identity.
fn device_address() -> Address {
    let ficr = embassy_nrf::pac::FICR;
    let lo = ficr.deviceaddr(0).read().to_le_bytes();
    // The two top bits mark a static random address.
    let hi = ((ficr.deviceaddr(1).read() as u16) | 0xC000).to_le_bytes();
    Address::random([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1]])
}

/// Build the host stack on top of the controller. Can only be called once.
pub fn start_host(
    controller: BleController,
) -> (
    Peripheral<'static, BleController, DefaultPacketPool>,
    Runner<'static, BleController, DefaultPacketPool>,
) {
    let address = device_address();
    info!("Our address = {:?}", address);

    let resources = {
        static RESOURCES: StaticCell<BleResources> = StaticCell::new();
        RESOURCES.init(BleResources::new())
    };
    let stack = {
        static STACK: StaticCell<Stack<'_, SoftdeviceController<'_>>> =
            StaticCell::new();
        STACK.init(
            trouble_host::new(controller, resources)
                .set_random_address(address),
        )
    };
    let host = stack.build();
    (host.peripheral, host.runner)
}

#[embassy_executor::task]
pub async fn mpsl_task(
    mpsl: &'static MultiprotocolServiceLayer<'static>,
) -> ! {
    mpsl.run().await;
}

#[embassy_executor::task]
pub async fn runner_task(
    ctx: &'static AppContext,
    mut runner: Runner<'static, BleController, DefaultPacketPool>,
) {
    let res = runner.run().await;
    error!("ble runner exited with: {:?}", res);
    if !ctx.advertising().notify_reset() {
        warn!("advertising reset notification dropped");
    }
}

/// Owns the advertiser and runs the advertising actor on it.
#[embassy_executor::task]
pub async fn ble_task(
    ctx: &'static AppContext,
    peripheral: Peripheral<'static, BleController, DefaultPacketPool>,
    payload: BroadcastPayload,
) {
    let control = AdvertisingControl::new(
        ctx,
        TroubleBroadcaster::new(peripheral),
        AdvParams::default(),
        payload,
    );
    // Host commands queue until the runner has initialised the controller,
    // so the stack counts as synchronized once the runner is spawned.
    if !ctx.advertising().notify_sync_ready() {
        warn!("advertising sync notification dropped");
    }
    control.run().await
}

#[embassy_executor::task]
pub async fn broadcast_task(
    ctx: &'static AppContext,
    payload: BroadcastPayload,
) {
    BroadcastTask::new(ctx, payload).run().await
}
