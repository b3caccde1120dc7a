use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

/// Single-slot "new sample processed" latch between processor and
/// broadcaster.
///
/// Raising while a notification is still pending does not queue a second
/// one: excess raises coalesce into the one pending wake-up, and are only
/// counted in [`coalesced`](Self::coalesced).
pub struct ReadySignal<M: RawMutex> {
    signal: Signal<M, ()>,
    raised: AtomicU32,
    coalesced: AtomicU32,
}

impl<M: RawMutex> ReadySignal<M> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            raised: AtomicU32::new(0),
            coalesced: AtomicU32::new(0),
        }
    }

    pub fn raise(&self) {
        if self.signal.signaled() {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }
        self.signal.signal(());
        self.raised.fetch_add(1, Ordering::Relaxed);
    }

    /// Wait for the next notification and consume it.
    pub async fn wait(&self) {
        self.signal.wait().await
    }

    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }

    pub fn raised(&self) -> u32 {
        self.raised.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> u32 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex> Default for ReadySignal<M> {
    fn default() -> Self {
        Self::new()
    }
}
