use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use dht22::{Dht22, Error, FRAME_BITS};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

// ---------------------------------------------------------------------------
// Simulated bus: a shared microsecond clock, a delay that advances it and a
// pin that replays the sensor's side of the line once the host releases it.
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Clock(Rc<Cell<u64>>);

impl Clock {
    fn now(&self) -> u64 {
        self.0.get()
    }

    fn advance(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

struct SimDelay(Clock);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns).div_ceil(1000));
    }
}

struct SimLine {
    clock: Clock,
    /// Levels driven by the sensor after release, as (high, duration µs).
    script: Vec<(bool, u64)>,
    released_at: Option<u64>,
    host_low: bool,
}

impl SimLine {
    fn new(clock: Clock, script: Vec<(bool, u64)>) -> Self {
        Self { clock, script, released_at: None, host_low: false }
    }

    fn level(&self) -> bool {
        if self.host_low {
            return false;
        }
        let Some(start) = self.released_at else {
            return true;
        };
        let mut t = self.clock.now().saturating_sub(start);
        for &(high, len) in &self.script {
            if t < len {
                return high;
            }
            t -= len;
        }
        true
    }
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.host_low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if self.host_low {
            self.released_at = Some(self.clock.now());
        }
        self.host_low = false;
        Ok(())
    }
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

fn sensor_script(frame: [u8; 5]) -> Vec<(bool, u64)> {
    let mut script = vec![(true, 20), (false, 80), (true, 80)];
    for i in 0..FRAME_BITS {
        let one = frame[i / 8] & (0x80 >> (i % 8)) != 0;
        script.push((false, 50));
        script.push((true, if one { 70 } else { 26 }));
    }
    script.push((false, 50));
    script
}

fn sensor(script: Vec<(bool, u64)>) -> Dht22<SimLine, SimDelay> {
    let clock = Clock::default();
    Dht22::new(SimLine::new(clock.clone(), script), SimDelay(clock))
}

#[test]
fn reads_a_full_frame() {
    let mut dht = sensor(sensor_script([0x02, 0x8C, 0x01, 0x5F, 0xEE]));

    let reading = dht.read().unwrap();
    assert!((reading.humidity - 65.2).abs() < 1e-4);
    assert!((reading.temperature - 35.1).abs() < 1e-4);
}

#[test]
fn negative_temperature_over_the_wire() {
    let mut dht = sensor(sensor_script([0x01, 0x90, 0x80, 0x65, 0x76]));

    let reading = dht.read().unwrap();
    assert!((reading.humidity - 40.0).abs() < 1e-4);
    assert!((reading.temperature + 10.1).abs() < 1e-4);
}

#[test]
fn corrupted_frame_fails_checksum() {
    let mut dht = sensor(sensor_script([0x02, 0x8C, 0x01, 0x5F, 0x00]));
    assert_eq!(dht.read(), Err(Error::Checksum));
}

#[test]
fn silent_sensor_times_out() {
    let mut dht = sensor(Vec::new());
    assert_eq!(dht.read(), Err(Error::Timeout));
}

#[test]
fn truncated_frame_times_out() {
    let mut script = sensor_script([0x02, 0x8C, 0x01, 0x5F, 0xEE]);
    script.truncate(40);
    script.push((false, 500));
    let mut dht = sensor(script);
    assert_eq!(dht.read(), Err(Error::Timeout));
}
