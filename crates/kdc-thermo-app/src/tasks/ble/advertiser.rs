use super::BleController;
use crate::prelude::*;
use derive_more::From;
use embassy_time::{Duration, Instant, Timer};
use heapless::Vec;
use kdc_thermo_bsp::ble::SoftdeviceError;
use thermo_pipeline::advertising::ConnectionMode;
use thermo_pipeline::payload::ADV_DATA_MAX;
use thermo_pipeline::{AdvParams, AdvertisingStack};
use trouble_host::prelude::*;

/// How long one start call advertises before the window completes and the
/// controller restarts it.
pub const ADV_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvError {
    /// More than one legacy advertising PDU worth of data.
    PayloadTooLong,
    /// The controller is built without the peripheral role.
    Connectable,
    #[from]
    Host(BleHostError<SoftdeviceError>),
}

struct ActiveWindow {
    // Dropping the advertiser stops advertising.
    _advertiser: Advertiser<'static, BleController, DefaultPacketPool>,
    ends_at: Instant,
}

/// `trouble-host` peripheral driven as a non-connectable, scannable
/// broadcaster.
pub struct TroubleBroadcaster {
    peripheral: Peripheral<'static, BleController, DefaultPacketPool>,
    adv_data: Vec<u8, ADV_DATA_MAX>,
    scan_data: Vec<u8, ADV_DATA_MAX>,
    window: Duration,
    active: Option<ActiveWindow>,
}

impl TroubleBroadcaster {
    pub fn new(
        peripheral: Peripheral<'static, BleController, DefaultPacketPool>,
    ) -> Self {
        Self {
            peripheral,
            adv_data: Vec::new(),
            scan_data: Vec::new(),
            window: ADV_WINDOW,
            active: None,
        }
    }
}

fn copy_payload(
    dst: &mut Vec<u8, ADV_DATA_MAX>,
    data: &[u8],
) -> Result<(), AdvError> {
    dst.clear();
    dst.extend_from_slice(data).map_err(|_| AdvError::PayloadTooLong)
}

impl AdvertisingStack for TroubleBroadcaster {
    type Error = AdvError;

    async fn stop_advertising(&mut self) -> Result<(), AdvError> {
        if self.active.take().is_some() {
            debug!("[adv] stopped");
        }
        Ok(())
    }

    async fn set_advertising_payload(
        &mut self,
        data: &[u8],
    ) -> Result<(), AdvError> {
        copy_payload(&mut self.adv_data, data)
    }

    async fn set_scan_response_payload(
        &mut self,
        data: &[u8],
    ) -> Result<(), AdvError> {
        copy_payload(&mut self.scan_data, data)
    }

    async fn start_advertising(
        &mut self,
        params: &AdvParams,
    ) -> Result<(), AdvError> {
        if params.connection != ConnectionMode::NonConnectable {
            return Err(AdvError::Connectable);
        }
        let adv_params = AdvertisementParameters {
            interval_min: params.interval_min,
            interval_max: params.interval_max,
            timeout: Some(self.window),
            ..Default::default()
        };
        let advertiser = self
            .peripheral
            .advertise(
                &adv_params,
                Advertisement::NonconnectableScannableUndirected {
                    adv_data: &self.adv_data[..],
                    scan_data: &self.scan_data[..],
                },
            )
            .await?;
        self.active = Some(ActiveWindow {
            _advertiser: advertiser,
            ends_at: Instant::now() + self.window,
        });
        trace!("[adv] advertising");
        Ok(())
    }

    async fn wait_complete(&mut self) {
        match self.active.as_ref().map(|w| w.ends_at) {
            Some(ends_at) => {
                Timer::at(ends_at).await;
                self.active = None;
            }
            None => core::future::pending::<()>().await,
        }
    }
}
