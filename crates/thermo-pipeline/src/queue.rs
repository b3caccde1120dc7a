use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};

use crate::error::QueueError;
use crate::sample::SensorSample;

/// Bounded FIFO carrying samples from the sensor task to the processor.
pub struct SampleQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, SensorSample, N>,
}

impl<M: RawMutex, const N: usize> SampleQueue<M, N> {
    const NON_EMPTY: () = assert!(N >= 1, "sample queue needs a capacity of at least one");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self { channel: Channel::new() }
    }

    /// Enqueue, waiting at most `timeout` for a free slot.
    ///
    /// On timeout the sample is handed back to nobody: it is dropped and
    /// the caller decides how to report it.
    pub async fn send_timeout(
        &self,
        sample: SensorSample,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        with_timeout(timeout, self.channel.send(sample))
            .await
            .map_err(|_| QueueError::Full)
    }

    /// Wait indefinitely for the next sample.
    pub async fn receive(&self) -> SensorSample {
        self.channel.receive().await
    }

    pub fn try_receive(&self) -> Option<SensorSample> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, const N: usize> Default for SampleQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
