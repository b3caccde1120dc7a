use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

use crate::advertising::AdvertisingHandle;
use crate::config::HISTORY_READ_TIMEOUT;
use crate::context::Context;
use crate::error::HistoryError;
use crate::gate::InitBits;
use crate::payload::BroadcastPayload;
use crate::sample::SensorSample;

/// Turns history entries into advertising payloads.
///
/// Each ready notification consumes at most one history entry, the newest,
/// so the advertised value tracks the latest reading even after
/// notifications coalesce. Entries behind it stay as history until the
/// writer evicts them.
pub struct BroadcastTask<'a, M: RawMutex> {
    ctx: &'a Context<M>,
    advertising: AdvertisingHandle<'a, M>,
    payload: BroadcastPayload,
    read_timeout: Duration,
}

impl<'a, M: RawMutex> BroadcastTask<'a, M> {
    pub const REQUIRES: InitBits = InitBits::BUFFER_READY
        .union(InitBits::SIGNAL_READY)
        .union(InitBits::BROADCAST_READY);

    pub fn new(ctx: &'a Context<M>, payload: BroadcastPayload) -> Self {
        Self {
            ctx,
            advertising: ctx.advertising(),
            payload,
            read_timeout: HISTORY_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Wait for a ready notification, then publish the newest history
    /// entry. Returns the sample that went out, if any.
    pub async fn step(&mut self) -> Option<SensorSample> {
        self.ctx.ready.wait().await;

        let newest = self.ctx.history.pop_newest(self.read_timeout).await;
        let sample = match newest {
            Ok(sample) => sample,
            Err(HistoryError::Empty) => {
                debug!("ready without history entry, skipped");
                self.ctx.stats.record_broadcast_skip();
                return None;
            }
            Err(e) => {
                warn!("history read failed: {:?}", e);
                self.ctx.stats.record_buffer_fault();
                return None;
            }
        };

        self.payload.set_temperature(sample.temperature);
        self.advertising.publish(self.payload.clone()).await;
        self.ctx.stats.record_broadcast();
        trace!("published {:?}", sample);
        Some(sample)
    }

    pub async fn run(mut self) -> ! {
        self.ctx.gate.wait(Self::REQUIRES).await;
        info!("broadcast task running");
        loop {
            self.step().await;
        }
    }
}
