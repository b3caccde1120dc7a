use core::cell::RefCell;
use core::future::poll_fn;
use core::ops::BitOr;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

/// Named boot prerequisites. Once set, a bit is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitBits(u8);

impl InitBits {
    pub const NONE: Self = Self(0);
    pub const QUEUE_READY: Self = Self(1 << 0);
    pub const BUFFER_READY: Self = Self(1 << 1);
    pub const SIGNAL_READY: Self = Self(1 << 2);
    pub const BROADCAST_READY: Self = Self(1 << 3);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when every bit in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for InitBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

struct GateState<const W: usize> {
    bits: InitBits,
    waiters: MultiWakerRegistration<W>,
}

/// Boot rendezvous: tasks park in [`wait`](Self::wait) until every bit they
/// depend on has been [`set`](Self::set).
///
/// `W` bounds how many distinct tasks can be parked at once. Registering
/// more wakers than that wakes everyone early; they re-check and park again,
/// so correctness does not depend on `W`.
pub struct InitGate<M: RawMutex, const W: usize> {
    state: Mutex<M, RefCell<GateState<W>>>,
}

impl<M: RawMutex, const W: usize> InitGate<M, W> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(GateState {
                bits: InitBits::NONE,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Set `bits` and release every waiter whose prerequisites are now met.
    /// Setting an already-set bit is a no-op.
    pub fn set(&self, bits: InitBits) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let before = s.bits;
            s.bits = s.bits | bits;
            if s.bits != before {
                s.waiters.wake();
            }
        });
    }

    pub fn bits(&self) -> InitBits {
        self.state.lock(|s| s.borrow().bits)
    }

    pub fn is_set(&self, required: InitBits) -> bool {
        self.bits().contains(required)
    }

    /// Park until all of `required` is set. There is no timeout.
    pub async fn wait(&self, required: InitBits) {
        poll_fn(|cx| {
            self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if s.bits.contains(required) {
                    Poll::Ready(())
                } else {
                    s.waiters.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

impl<M: RawMutex, const W: usize> Default for InitGate<M, W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_requires_every_bit() {
        let set = InitBits::QUEUE_READY | InitBits::SIGNAL_READY;
        assert!(set.contains(InitBits::QUEUE_READY));
        assert!(!set.contains(InitBits::QUEUE_READY | InitBits::BUFFER_READY));
        assert!(set.contains(InitBits::NONE));
    }
}
