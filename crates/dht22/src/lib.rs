#![cfg_attr(not(test), no_std)]
//! Driver for the DHT22 single-wire temperature/humidity sensor.
//!
//! The data line must be open-drain with a pull-up: `set_high` releases the
//! line and `is_high` samples it. Pulse widths are measured by polling the
//! pin in 1 µs delay steps, so the caller should keep interrupt latency low
//! for the ~5 ms a read takes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Bytes in one sensor frame: humidity (2), temperature (2), checksum.
pub const FRAME_LEN: usize = 5;
pub const FRAME_BITS: usize = FRAME_LEN * 8;

/// High pulses longer than this encode a one; the sensor sends ~27 µs for
/// a zero and ~70 µs for a one.
pub const ONE_THRESHOLD_US: u32 = 40;

/// Host start pulse. The datasheet asks for at least 1 ms.
const START_LOW_US: u32 = 3_000;
/// Longest any single level may last once the sensor is talking.
const EDGE_TIMEOUT_US: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

#[derive(derive_more::From, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<PinError> {
    #[from]
    Pin(PinError),
    /// The sensor did not answer, or an edge never arrived.
    Timeout,
    Checksum,
}

/// A raw 40-bit frame as clocked out by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(pub [u8; FRAME_LEN]);

impl Frame {
    /// Assemble a frame, MSB first, from the width of each bit's high pulse.
    pub fn from_pulses(high_us: &[u32; FRAME_BITS]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        for (i, &width) in high_us.iter().enumerate() {
            if width > ONE_THRESHOLD_US {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self(bytes)
    }

    /// Low byte of the sum of the four data bytes.
    pub fn checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    pub fn is_valid(&self) -> bool {
        self.checksum() == self.0[4]
    }

    pub fn humidity(&self) -> f32 {
        u16::from_be_bytes([self.0[0], self.0[1]]) as f32 / 10.0
    }

    /// Sign-magnitude, tenths of a degree.
    pub fn temperature(&self) -> f32 {
        let magnitude =
            u16::from_be_bytes([self.0[2] & 0x7F, self.0[3]]) as f32 / 10.0;
        if self.0[2] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn decode<E>(&self) -> Result<Reading, Error<E>> {
        if !self.is_valid() {
            return Err(Error::Checksum);
        }
        Ok(Reading { temperature: self.temperature(), humidity: self.humidity() })
    }
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Run one full transaction. Blocks for roughly 5 ms.
    pub fn read(&mut self) -> Result<Reading, Error<P::Error>> {
        self.read_frame()?.decode()
    }

    pub fn read_frame(&mut self) -> Result<Frame, Error<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high()?;

        // Response: the sensor pulls low for 80 µs, then high for 80 µs.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut pulses = [0u32; FRAME_BITS];
        for width in pulses.iter_mut() {
            self.wait_while(false)?;
            *width = self.wait_while(true)?;
        }
        Ok(Frame::from_pulses(&pulses))
    }

    /// Spin while the line sits at `high`, returning how long it stayed.
    fn wait_while(&mut self, high: bool) -> Result<u32, Error<P::Error>> {
        let mut elapsed = 0;
        while self.pin.is_high()? == high {
            if elapsed >= EDGE_TIMEOUT_US {
                return Err(Error::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_positive_frame() {
        let frame = Frame([0x02, 0x8C, 0x01, 0x5F, 0xEE]);
        let reading = frame.decode::<()>().unwrap();
        assert!((reading.humidity - 65.2).abs() < 1e-4);
        assert!((reading.temperature - 35.1).abs() < 1e-4);
    }

    #[test]
    fn sign_bit_makes_temperature_negative() {
        let frame = Frame([0x02, 0x8C, 0x80, 0x65, 0x73]);
        let reading = frame.decode::<()>().unwrap();
        assert!((reading.temperature + 10.1).abs() < 1e-4);
    }

    #[test]
    fn checksum_wraps() {
        let frame = Frame([0xFF, 0xFF, 0x00, 0x02, 0x00]);
        assert_eq!(frame.checksum(), 0x00);
        assert!(frame.is_valid());
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let frame = Frame([0x02, 0x8C, 0x01, 0x5F, 0xEF]);
        assert_eq!(frame.decode::<()>(), Err(Error::Checksum));
    }

    #[test]
    fn pulses_assemble_msb_first() {
        let mut pulses = [26u32; FRAME_BITS];
        pulses[0] = 70;
        pulses[15] = 70;
        let frame = Frame::from_pulses(&pulses);
        assert_eq!(frame.0, [0x80, 0x01, 0, 0, 0]);
    }
}
