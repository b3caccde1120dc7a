use derive_more::From;

/// The sample queue stayed full for the whole enqueue timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    Full,
}

/// Errors from the history ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HistoryError {
    /// No room for the frame before the write timeout (`Overflow::Wait` only).
    Full,
    /// No frame arrived before the read timeout.
    Empty,
    /// The framed record can never fit in the ring.
    TooLarge,
    /// A frame could not be encoded or decoded.
    Corrupt,
}

/// Failures reported by a temperature/humidity sensor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// The sensor did not answer, or a bit edge never arrived.
    Timeout,
    /// The frame checksum did not match.
    Checksum,
    /// The data pin itself reported an error.
    Pin,
}

/// Errors building a broadcast payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// The device name does not fit in a scan response.
    NameTooLong,
}

/// Everything that can end one sensor cycle early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    Sensor(SensorError),
    Queue(QueueError),
}
