use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver};

use crate::advertising::{AdvEvent, AdvertisingHandle};
use crate::config::{
    ADV_EVENT_DEPTH, GATE_WAITERS, HISTORY_CAPACITY, SAMPLE_QUEUE_DEPTH,
};
use crate::gate::{InitBits, InitGate};
use crate::history::{HistoryBuffer, Overflow};
use crate::queue::SampleQueue;
use crate::signal::ReadySignal;
use crate::stats::PipelineStats;

/// Every shared primitive the pipeline tasks talk through.
///
/// Built once (usually into a `StaticCell`) and handed to each task by
/// reference. Nothing in here is torn down while the device runs.
pub struct Context<M: RawMutex> {
    pub queue: SampleQueue<M, SAMPLE_QUEUE_DEPTH>,
    pub history: HistoryBuffer<M, HISTORY_CAPACITY>,
    pub ready: ReadySignal<M>,
    pub gate: InitGate<M, GATE_WAITERS>,
    pub stats: PipelineStats,
    adv_events: Channel<M, AdvEvent, ADV_EVENT_DEPTH>,
}

impl<M: RawMutex> Context<M> {
    pub const fn new(overflow: Overflow) -> Self {
        Self {
            queue: SampleQueue::new(),
            history: HistoryBuffer::new(overflow),
            ready: ReadySignal::new(),
            gate: InitGate::new(),
            stats: PipelineStats::new(),
            adv_events: Channel::new(),
        }
    }

    /// Publish the local primitives in boot order. `BROADCAST_READY` is
    /// left to the advertising actor once the stack reports sync.
    pub fn bring_up(&self) {
        self.gate.set(InitBits::QUEUE_READY);
        debug!("sample queue ready");
        self.gate.set(InitBits::BUFFER_READY);
        debug!("history buffer ready ({=usize} bytes)", self.history.capacity());
        self.gate.set(InitBits::SIGNAL_READY);
        info!("pipeline primitives ready");
    }

    pub fn advertising(&self) -> AdvertisingHandle<'_, M> {
        AdvertisingHandle::new(self.adv_events.sender())
    }

    pub(crate) fn adv_events(&self) -> Receiver<'_, M, AdvEvent, ADV_EVENT_DEPTH> {
        self.adv_events.receiver()
    }
}

impl<M: RawMutex> Default for Context<M> {
    fn default() -> Self {
        Self::new(Overflow::default())
    }
}
