use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::{with_timeout, Duration};
use heapless::Deque;

use crate::error::HistoryError;
use crate::sample::SensorSample;

/// Bytes of length prefix in front of every record.
pub const FRAME_HEADER_LEN: usize = 2;
/// Bytes of length suffix behind every record, so the tail frame can be
/// found without walking the ring.
pub const FRAME_TRAILER_LEN: usize = 2;
/// Upper bound for one serialized sample.
pub const MAX_RECORD_LEN: usize = 16;

/// What a write does when the ring has no room for the new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Overflow {
    /// Drop whole frames from the head until the new one fits.
    #[default]
    EvictOldest,
    /// Wait for the reader to free space, up to the write timeout.
    Wait,
}

struct Ring<const C: usize> {
    bytes: Deque<u8, C>,
    frames: usize,
    evicted: u32,
    reader: WakerRegistration,
    writer: WakerRegistration,
}

impl<const C: usize> Ring<C> {
    const fn new() -> Self {
        Self {
            bytes: Deque::new(),
            frames: 0,
            evicted: 0,
            reader: WakerRegistration::new(),
            writer: WakerRegistration::new(),
        }
    }

    fn free(&self) -> usize {
        C - self.bytes.len()
    }

    /// Caller guarantees `free() >= frame_len(record.len())`.
    fn write_frame(&mut self, record: &[u8]) {
        let len = (record.len() as u16).to_le_bytes();
        for b in len.iter().chain(record).chain(len.iter()) {
            let _ = self.bytes.push_back(*b);
        }
        self.frames += 1;
        self.reader.wake();
    }

    fn read_header(&mut self) -> Option<usize> {
        let lo = self.bytes.pop_front()?;
        let hi = self.bytes.pop_front()?;
        Some(u16::from_le_bytes([lo, hi]) as usize)
    }

    fn read_trailer(&mut self) -> Option<usize> {
        let hi = self.bytes.pop_back()?;
        let lo = self.bytes.pop_back()?;
        Some(u16::from_le_bytes([lo, hi]) as usize)
    }

    fn skip_front(&mut self, n: usize) {
        for _ in 0..n {
            self.bytes.pop_front();
        }
    }

    fn skip_back(&mut self, n: usize) {
        for _ in 0..n {
            self.bytes.pop_back();
        }
    }

    fn drop_oldest(&mut self) {
        if let Some(len) = self.read_header() {
            self.skip_front(len + FRAME_TRAILER_LEN);
            self.frames -= 1;
            self.evicted += 1;
        }
    }

    fn read_frame(
        &mut self,
        out: &mut [u8; MAX_RECORD_LEN],
    ) -> Option<Result<usize, HistoryError>> {
        let len = self.read_header()?;
        self.frames -= 1;
        self.writer.wake();

        if len > MAX_RECORD_LEN {
            self.skip_front(len + FRAME_TRAILER_LEN);
            return Some(Err(HistoryError::Corrupt));
        }
        for slot in out.iter_mut().take(len) {
            *slot = self.bytes.pop_front()?;
        }
        self.skip_front(FRAME_TRAILER_LEN);
        Some(Ok(len))
    }

    /// Like `read_frame`, from the tail.
    fn read_newest(
        &mut self,
        out: &mut [u8; MAX_RECORD_LEN],
    ) -> Option<Result<usize, HistoryError>> {
        if self.frames == 0 {
            return None;
        }
        let len = self.read_trailer()?;
        self.frames -= 1;
        self.writer.wake();

        if len > MAX_RECORD_LEN {
            self.skip_back(len + FRAME_HEADER_LEN);
            return Some(Err(HistoryError::Corrupt));
        }
        for i in (0..len).rev() {
            out[i] = self.bytes.pop_back()?;
        }
        self.skip_back(FRAME_HEADER_LEN);
        Some(Ok(len))
    }
}

const fn frame_len(record_len: usize) -> usize {
    FRAME_HEADER_LEN + record_len + FRAME_TRAILER_LEN
}

/// Byte ring of `postcard`-encoded samples, each framed by its length on
/// both sides.
///
/// Single writer (the processor) and single reader (the broadcaster).
/// [`pop`](Self::pop) takes the oldest frame and
/// [`pop_newest`](Self::pop_newest) the one written last; frames behind the
/// newest stay in place until they are read or evicted.
pub struct HistoryBuffer<M: RawMutex, const C: usize> {
    ring: Mutex<M, RefCell<Ring<C>>>,
    overflow: Overflow,
}

impl<M: RawMutex, const C: usize> HistoryBuffer<M, C> {
    pub const fn new(overflow: Overflow) -> Self {
        Self { ring: Mutex::new(RefCell::new(Ring::new())), overflow }
    }

    /// Append one sample. Returns how many old frames were evicted to
    /// make room.
    ///
    /// With [`Overflow::Wait`] this waits up to `timeout` for space and then
    /// fails with [`HistoryError::Full`]; with [`Overflow::EvictOldest`] it
    /// never waits and `timeout` is unused.
    pub async fn push(
        &self,
        sample: &SensorSample,
        timeout: Duration,
    ) -> Result<usize, HistoryError> {
        let mut record = [0u8; MAX_RECORD_LEN];
        let record: &[u8] = postcard::to_slice(sample, &mut record)
            .map_err(|_| HistoryError::Corrupt)?;
        let frame_len = frame_len(record.len());
        if frame_len > C {
            return Err(HistoryError::TooLarge);
        }

        match self.overflow {
            Overflow::EvictOldest => Ok(self.ring.lock(|ring| {
                let mut ring = ring.borrow_mut();
                let before = ring.evicted;
                while ring.free() < frame_len {
                    ring.drop_oldest();
                }
                ring.write_frame(record);
                (ring.evicted - before) as usize
            })),
            Overflow::Wait => {
                let write = poll_fn(|cx| {
                    self.ring.lock(|ring| {
                        let mut ring = ring.borrow_mut();
                        if ring.free() >= frame_len {
                            ring.write_frame(record);
                            Poll::Ready(0)
                        } else {
                            ring.writer.register(cx.waker());
                            Poll::Pending
                        }
                    })
                });
                with_timeout(timeout, write)
                    .await
                    .map_err(|_| HistoryError::Full)
            }
        }
    }

    /// Remove the oldest sample, waiting at most `timeout` for one.
    pub async fn pop(
        &self,
        timeout: Duration,
    ) -> Result<SensorSample, HistoryError> {
        self.take(timeout, Ring::read_frame).await
    }

    /// Remove the most recently written sample, waiting at most `timeout`
    /// for one. Older frames are left untouched.
    pub async fn pop_newest(
        &self,
        timeout: Duration,
    ) -> Result<SensorSample, HistoryError> {
        self.take(timeout, Ring::read_newest).await
    }

    async fn take(
        &self,
        timeout: Duration,
        read_one: fn(
            &mut Ring<C>,
            &mut [u8; MAX_RECORD_LEN],
        ) -> Option<Result<usize, HistoryError>>,
    ) -> Result<SensorSample, HistoryError> {
        let mut record = [0u8; MAX_RECORD_LEN];
        let read = poll_fn(|cx| {
            self.ring.lock(|ring| {
                let mut ring = ring.borrow_mut();
                match read_one(&mut *ring, &mut record) {
                    Some(res) => Poll::Ready(res),
                    None => {
                        ring.reader.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        });
        let len = with_timeout(timeout, read)
            .await
            .map_err(|_| HistoryError::Empty)??;
        postcard::from_bytes(&record[..len]).map_err(|_| HistoryError::Corrupt)
    }

    /// Copy up to `K` samples, oldest first, without removing them.
    pub fn snapshot<const K: usize>(&self) -> heapless::Vec<SensorSample, K> {
        let mut out = heapless::Vec::new();
        self.ring.lock(|ring| {
            let ring = ring.borrow();
            let mut bytes = ring.bytes.iter().copied();
            let mut record = [0u8; MAX_RECORD_LEN];
            while let (Some(lo), Some(hi)) = (bytes.next(), bytes.next()) {
                let len = u16::from_le_bytes([lo, hi]) as usize;
                let mut filled = 0;
                for b in bytes.by_ref().take(len) {
                    if filled < MAX_RECORD_LEN {
                        record[filled] = b;
                    }
                    filled += 1;
                }
                if filled != len || len > MAX_RECORD_LEN {
                    break;
                }
                bytes.nth(FRAME_TRAILER_LEN - 1);
                if let Ok(sample) = postcard::from_bytes(&record[..len]) {
                    if out.push(sample).is_err() {
                        break;
                    }
                }
            }
        });
        out
    }

    /// Number of whole frames currently stored.
    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().frames)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().bytes.len())
    }

    pub const fn capacity(&self) -> usize {
        C
    }

    /// Frames dropped by [`Overflow::EvictOldest`] since boot.
    pub fn evicted(&self) -> u32 {
        self.ring.lock(|ring| ring.borrow().evicted)
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }
}
