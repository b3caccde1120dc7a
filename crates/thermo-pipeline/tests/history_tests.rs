use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Timer};
use thermo_pipeline::{HistoryBuffer, HistoryError, Overflow, SensorSample};

const SHORT: Duration = Duration::from_millis(10);

// Each frame is two f32s between a 2-byte length on either side.
const FRAME: usize = 12;

fn samples() -> [SensorSample; 4] {
    [
        SensorSample::new(72.0, 45.0),
        SensorSample::new(73.2, 44.1),
        SensorSample::new(71.0, 46.5),
        SensorSample::new(70.4, 47.0),
    ]
}

#[futures_test::test]
async fn reads_come_back_in_write_order() {
    let history = HistoryBuffer::<NoopRawMutex, 64>::new(Overflow::EvictOldest);
    for s in &samples()[..3] {
        assert_eq!(history.push(s, SHORT).await, Ok(0));
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.used_bytes(), 3 * FRAME);

    for s in &samples()[..3] {
        assert_eq!(history.pop(SHORT).await, Ok(*s));
    }
    assert!(history.is_empty());
    assert_eq!(history.used_bytes(), 0);
}

#[futures_test::test]
async fn full_ring_evicts_oldest_whole_frame() {
    let history =
        HistoryBuffer::<NoopRawMutex, { 3 * FRAME }>::new(Overflow::EvictOldest);
    let all = samples();
    for s in &all[..3] {
        history.push(s, SHORT).await.unwrap();
    }

    assert_eq!(history.push(&all[3], SHORT).await, Ok(1));
    assert_eq!(history.evicted(), 1);
    assert_eq!(history.len(), 3);

    for s in &all[1..] {
        assert_eq!(history.pop(SHORT).await, Ok(*s));
    }
}

#[futures_test::test]
async fn waiting_writer_times_out_as_full() {
    let history =
        HistoryBuffer::<NoopRawMutex, { 2 * FRAME }>::new(Overflow::Wait);
    let all = samples();
    history.push(&all[0], SHORT).await.unwrap();
    history.push(&all[1], SHORT).await.unwrap();

    assert_eq!(history.push(&all[2], SHORT).await, Err(HistoryError::Full));
    assert_eq!(history.len(), 2);
    assert_eq!(history.evicted(), 0);
}

#[futures_test::test]
async fn waiting_writer_resumes_after_a_read() {
    let history =
        HistoryBuffer::<NoopRawMutex, { 2 * FRAME }>::new(Overflow::Wait);
    let all = samples();
    history.push(&all[0], SHORT).await.unwrap();
    history.push(&all[1], SHORT).await.unwrap();

    let (written, read) = join(
        history.push(&all[2], Duration::from_millis(500)),
        async {
            Timer::after_millis(5).await;
            history.pop(SHORT).await
        },
    )
    .await;
    assert_eq!(written, Ok(0));
    assert_eq!(read, Ok(all[0]));
    assert_eq!(history.pop(SHORT).await, Ok(all[1]));
    assert_eq!(history.pop(SHORT).await, Ok(all[2]));
}

#[futures_test::test]
async fn newest_read_takes_only_the_tail_frame() {
    let history = HistoryBuffer::<NoopRawMutex, 64>::new(Overflow::EvictOldest);
    let all = samples();
    for s in &all {
        history.push(s, SHORT).await.unwrap();
    }

    assert_eq!(history.pop_newest(SHORT).await, Ok(all[3]));
    assert_eq!(history.len(), 3);
    assert_eq!(history.used_bytes(), 3 * FRAME);
    assert_eq!(history.snapshot::<8>().as_slice(), &all[..3]);

    // Both ends stay framed after reads from the tail.
    assert_eq!(history.pop(SHORT).await, Ok(all[0]));
    assert_eq!(history.pop_newest(SHORT).await, Ok(all[2]));
    assert_eq!(history.pop(SHORT).await, Ok(all[1]));
    assert_eq!(history.pop_newest(SHORT).await, Err(HistoryError::Empty));
}

#[futures_test::test]
async fn newest_read_follows_writes_past_eviction() {
    let history =
        HistoryBuffer::<NoopRawMutex, { 2 * FRAME }>::new(Overflow::EvictOldest);
    for t in 0..20 {
        let sample = SensorSample::new(60.0 + t as f32, 50.0);
        history.push(&sample, SHORT).await.unwrap();
        assert_eq!(history.pop_newest(SHORT).await, Ok(sample));
        // One entry stays behind as history once the ring has two.
        history.push(&sample, SHORT).await.unwrap();
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.evicted(), 18);
}

#[futures_test::test]
async fn newest_read_frees_a_waiting_writer() {
    let history =
        HistoryBuffer::<NoopRawMutex, { 2 * FRAME }>::new(Overflow::Wait);
    let all = samples();
    history.push(&all[0], SHORT).await.unwrap();
    history.push(&all[1], SHORT).await.unwrap();

    let (written, read) = join(
        history.push(&all[2], Duration::from_millis(500)),
        async {
            Timer::after_millis(5).await;
            history.pop_newest(SHORT).await
        },
    )
    .await;
    assert_eq!(written, Ok(0));
    assert_eq!(read, Ok(all[1]));
    assert_eq!(history.snapshot::<4>().as_slice(), &[all[0], all[2]]);
}

#[futures_test::test]
async fn empty_read_times_out() {
    let history = HistoryBuffer::<NoopRawMutex, 64>::new(Overflow::EvictOldest);
    assert_eq!(history.pop(SHORT).await, Err(HistoryError::Empty));
}

#[futures_test::test]
async fn reader_wakes_on_write() {
    let history = HistoryBuffer::<NoopRawMutex, 64>::new(Overflow::EvictOldest);
    let sample = samples()[0];

    let (read, _) = join(history.pop(Duration::from_millis(500)), async {
        Timer::after_millis(5).await;
        history.push(&sample, SHORT).await
    })
    .await;
    assert_eq!(read, Ok(sample));
}

#[futures_test::test]
async fn frame_larger_than_ring_is_rejected() {
    let history = HistoryBuffer::<NoopRawMutex, 8>::new(Overflow::EvictOldest);
    assert_eq!(
        history.push(&samples()[0], SHORT).await,
        Err(HistoryError::TooLarge)
    );
    assert!(history.is_empty());
}

#[futures_test::test]
async fn snapshot_does_not_consume() {
    let history = HistoryBuffer::<NoopRawMutex, 64>::new(Overflow::EvictOldest);
    for s in &samples()[..3] {
        history.push(s, SHORT).await.unwrap();
    }

    let copy = history.snapshot::<8>();
    assert_eq!(copy.as_slice(), &samples()[..3]);
    assert_eq!(history.len(), 3);

    let first = history.snapshot::<1>();
    assert_eq!(first.as_slice(), &samples()[..1]);
}
