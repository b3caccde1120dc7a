use portable_atomic::{AtomicU32, Ordering};

macro_rules! pipeline_counters {
    ($($(#[$doc:meta])* $name:ident => $incr:ident),* $(,)?) => {
        /// Lock-free event counters shared by every task.
        ///
        /// Each logged fault bumps exactly one counter, so a snapshot
        /// accounts for everything the pipeline dropped or skipped.
        pub struct PipelineStats {
            $($name: AtomicU32,)*
        }

        /// Point-in-time copy of [`PipelineStats`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct StatsSnapshot {
            $($(#[$doc])* pub $name: u32,)*
        }

        impl PipelineStats {
            pub const fn new() -> Self {
                Self { $($name: AtomicU32::new(0),)* }
            }

            $(
                pub fn $incr(&self) {
                    self.$name.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot { $($name: self.$name.load(Ordering::Relaxed),)* }
            }
        }
    };
}

pipeline_counters! {
    /// Sensor reads that produced a sample.
    sensor_reads => record_sensor_read,
    /// Sensor reads that failed.
    sensor_faults => record_sensor_fault,
    /// Samples dropped because the queue stayed full.
    samples_dropped => record_sample_dropped,
    /// Samples taken off the queue by the processor.
    samples_processed => record_sample_processed,
    /// History writes that failed.
    buffer_faults => record_buffer_fault,
    /// Old history frames overwritten by new ones.
    buffer_evictions => record_buffer_eviction,
    /// Render cycles where a draw or flush failed.
    display_faults => record_display_fault,
    /// Payloads handed to the advertising actor.
    broadcasts => record_broadcast,
    /// Wake-ups where no history entry arrived in time.
    broadcast_skips => record_broadcast_skip,
    /// Failed stop/set/start calls.
    adv_faults => record_adv_fault,
    /// Completed stop/set/start sequences and restarts.
    adv_starts => record_adv_start,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}
