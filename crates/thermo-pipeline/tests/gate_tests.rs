use embassy_futures::join::{join, join3};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Timer;
use thermo_pipeline::{InitBits, InitGate};

type Gate = InitGate<NoopRawMutex, 4>;

#[futures_test::test]
async fn wait_returns_when_bits_already_set() {
    let gate = Gate::new();
    gate.set(InitBits::QUEUE_READY);

    gate.wait(InitBits::QUEUE_READY).await;
    assert!(gate.is_set(InitBits::QUEUE_READY));
}

#[futures_test::test]
async fn waiter_needs_every_bit() {
    let gate = Gate::new();
    let needed = InitBits::QUEUE_READY | InitBits::BUFFER_READY;

    gate.set(InitBits::QUEUE_READY);
    let early = select(gate.wait(needed), Timer::after_millis(20)).await;
    assert!(matches!(early, Either::Second(())));

    join(gate.wait(needed), async {
        Timer::after_millis(5).await;
        gate.set(InitBits::BUFFER_READY);
    })
    .await;
    assert!(gate.is_set(needed));
}

#[futures_test::test]
async fn one_set_releases_all_waiters() {
    let gate = Gate::new();

    join3(
        gate.wait(InitBits::SIGNAL_READY),
        gate.wait(InitBits::SIGNAL_READY),
        async {
            Timer::after_millis(5).await;
            gate.set(InitBits::SIGNAL_READY);
        },
    )
    .await;
}

#[futures_test::test]
async fn bits_accumulate() {
    let gate = Gate::new();
    gate.set(InitBits::QUEUE_READY);
    gate.set(InitBits::BROADCAST_READY);
    gate.set(InitBits::QUEUE_READY);

    let bits = gate.bits();
    assert!(bits.contains(InitBits::QUEUE_READY));
    assert!(bits.contains(InitBits::BROADCAST_READY));
    assert!(!bits.contains(InitBits::BUFFER_READY));
    assert_eq!(bits.bits(), 0b1001);
}

#[futures_test::test]
async fn empty_requirement_never_blocks() {
    let gate = Gate::new();
    gate.wait(InitBits::NONE).await;
}
