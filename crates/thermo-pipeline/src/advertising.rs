//! Single owner of the advertising controller.
//!
//! Both restart paths (a new payload from the broadcaster, and the stack
//! reporting that an advertising window finished) arrive here as
//! [`AdvEvent`]s, so stop/set/start sequences never interleave.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embassy_time::Duration;

use crate::config::{ADV_EVENT_DEPTH, ADV_INTERVAL_MAX, ADV_INTERVAL_MIN};
use crate::context::Context;
use crate::fmt::LogFormat;
use crate::gate::InitBits;
use crate::payload::BroadcastPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionMode {
    NonConnectable,
    Undirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryMode {
    NonDiscoverable,
    Limited,
    General,
}

/// Parameters reused verbatim on every (re)start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvParams {
    pub connection: ConnectionMode,
    pub discovery: DiscoveryMode,
    pub interval_min: Duration,
    pub interval_max: Duration,
}

impl Default for AdvParams {
    fn default() -> Self {
        Self {
            connection: ConnectionMode::NonConnectable,
            discovery: DiscoveryMode::General,
            interval_min: ADV_INTERVAL_MIN,
            interval_max: ADV_INTERVAL_MAX,
        }
    }
}

/// The broadcast stack as seen by the actor.
#[allow(async_fn_in_trait)]
pub trait AdvertisingStack {
    type Error: LogFormat;

    async fn stop_advertising(&mut self) -> Result<(), Self::Error>;

    async fn set_advertising_payload(
        &mut self,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    async fn set_scan_response_payload(
        &mut self,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    async fn start_advertising(
        &mut self,
        params: &AdvParams,
    ) -> Result<(), Self::Error>;

    /// Resolves when the current advertising window has ended.
    ///
    /// Must be cancel-safe: the actor drops this future whenever another
    /// event arrives first. Stacks that report completion through a
    /// callback leave this pending and call
    /// [`AdvertisingHandle::notify_complete`] instead.
    async fn wait_complete(&mut self) {
        core::future::pending::<()>().await
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvEvent {
    /// Replace the payload and restart advertising.
    Publish(BroadcastPayload),
    /// The stack finished an advertising window.
    Complete,
    /// The stack is synchronized and may be driven.
    SyncReady,
    /// The stack reset; whatever was advertising is gone.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvState {
    Idle,
    Advertising,
    /// A call failed part-way; the controller state is unknown.
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum AdvStep {
    Stop,
    SetAdvertising,
    SetScanResponse,
    Start,
}

/// Posts events to the advertising actor. Cheap to copy.
pub struct AdvertisingHandle<'a, M: RawMutex> {
    events: Sender<'a, M, AdvEvent, ADV_EVENT_DEPTH>,
}

impl<M: RawMutex> Clone for AdvertisingHandle<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for AdvertisingHandle<'_, M> {}

impl<'a, M: RawMutex> AdvertisingHandle<'a, M> {
    pub(crate) fn new(events: Sender<'a, M, AdvEvent, ADV_EVENT_DEPTH>) -> Self {
        Self { events }
    }

    /// Hand a new payload to the actor, waiting for channel space.
    pub async fn publish(&self, payload: BroadcastPayload) {
        self.events.send(AdvEvent::Publish(payload)).await
    }

    /// Callback entry point for "advertising complete". Never blocks; when
    /// the channel is full the event is dropped and `false` returned.
    pub fn notify_complete(&self) -> bool {
        self.notify(AdvEvent::Complete)
    }

    pub fn notify_sync_ready(&self) -> bool {
        self.notify(AdvEvent::SyncReady)
    }

    pub fn notify_reset(&self) -> bool {
        self.notify(AdvEvent::Reset)
    }

    fn notify(&self, event: AdvEvent) -> bool {
        self.events.try_send(event).is_ok()
    }
}

/// Actor that owns the [`AdvertisingStack`] and serializes every
/// stop/set/start sequence.
pub struct AdvertisingControl<'a, M: RawMutex, S: AdvertisingStack> {
    ctx: &'a Context<M>,
    stack: S,
    params: AdvParams,
    payload: BroadcastPayload,
    state: AdvState,
}

impl<'a, M: RawMutex, S: AdvertisingStack> AdvertisingControl<'a, M, S> {
    pub fn new(
        ctx: &'a Context<M>,
        stack: S,
        params: AdvParams,
        payload: BroadcastPayload,
    ) -> Self {
        Self { ctx, stack, params, payload, state: AdvState::Idle }
    }

    pub fn state(&self) -> AdvState {
        self.state
    }

    /// Payload the controller was last asked to advertise.
    pub fn payload(&self) -> &BroadcastPayload {
        &self.payload
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Wait for one event, from the channel or the stack, and handle it.
    pub async fn step(&mut self) {
        let events = self.ctx.adv_events();
        let event =
            match select(events.receive(), self.stack.wait_complete()).await {
                Either::First(event) => event,
                Either::Second(()) => AdvEvent::Complete,
            };
        self.handle(event).await;
    }

    pub async fn handle(&mut self, event: AdvEvent) {
        match event {
            AdvEvent::Publish(payload) => {
                self.payload = payload;
                self.republish().await;
            }
            AdvEvent::Complete => {
                if !self.ctx.gate.is_set(InitBits::BROADCAST_READY) {
                    debug!("advertising complete before sync, ignored");
                    return;
                }
                debug!("advertising window complete, restarting");
                // A completion queued behind a publish refers to a window that
                // has already been replaced, so the controller may still be
                // running. Stop first; stopping an ended window is harmless.
                if self.state != AdvState::Idle {
                    if let Err(e) = self.stack.stop_advertising().await {
                        debug!("stop before restart: {:?}", e);
                    }
                }
                self.state = AdvState::Idle;
                if let Err(e) = self.stack.start_advertising(&self.params).await
                {
                    self.fault(AdvStep::Start, &e);
                } else {
                    self.started();
                }
            }
            AdvEvent::SyncReady => {
                info!("advertising stack synchronized");
                self.ctx.gate.set(InitBits::BROADCAST_READY);
                self.republish().await;
            }
            AdvEvent::Reset => {
                warn!("advertising stack reset");
                self.state = AdvState::Idle;
            }
        }
    }

    async fn republish(&mut self) {
        if let Err((step, e)) = self.try_republish().await {
            self.fault(step, &e);
        }
    }

    async fn try_republish(&mut self) -> Result<(), (AdvStep, S::Error)> {
        match self.state {
            AdvState::Idle => {}
            AdvState::Advertising => {
                self.stack
                    .stop_advertising()
                    .await
                    .map_err(|e| (AdvStep::Stop, e))?;
            }
            AdvState::Faulted => {
                // The stack may already be stopped; only the calls that
                // follow decide whether this cycle recovers.
                if let Err(e) = self.stack.stop_advertising().await {
                    debug!("stop after fault: {:?}", e);
                }
            }
        }
        self.state = AdvState::Idle;

        self.stack
            .set_advertising_payload(self.payload.advertising_data())
            .await
            .map_err(|e| (AdvStep::SetAdvertising, e))?;
        self.stack
            .set_scan_response_payload(self.payload.scan_response())
            .await
            .map_err(|e| (AdvStep::SetScanResponse, e))?;
        self.stack
            .start_advertising(&self.params)
            .await
            .map_err(|e| (AdvStep::Start, e))?;
        self.started();
        Ok(())
    }

    fn started(&mut self) {
        self.state = AdvState::Advertising;
        self.ctx.stats.record_adv_start();
    }

    fn fault(&mut self, step: AdvStep, e: &S::Error) {
        error!("advertising {:?} failed: {:?}", step, e);
        self.state = AdvState::Faulted;
        self.ctx.stats.record_adv_fault();
    }
}
