//! Fixed-layout advertising payload carrying the latest temperature.
//!
//! Advertising data (9 bytes):
//!
//! | offset | bytes | meaning |
//! |---|---|---|
//! | 0 | `02 01 06` | Flags: LE general discoverable, BR/EDR not supported |
//! | 3 | `05 FF` | Manufacturer specific data, 4 bytes follow |
//! | 5 | `FF FF` | Company identifier (0xFFFF, reserved for testing) |
//! | 7 | `T_hi T_lo` | Temperature, `I8F8` fixed point, big-endian |
//!
//! The scan response carries the complete local name.

use fixed::types::I8F8;
use heapless::Vec;

use crate::error::PayloadError;

/// Maximum legacy advertising PDU payload.
pub const ADV_DATA_MAX: usize = 31;
pub const ADV_DATA_LEN: usize = 9;
pub const TEMPERATURE_OFFSET: usize = 7;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;
const LE_GENERAL_DISCOVERABLE: u8 = 0x02;
const BR_EDR_NOT_SUPPORTED: u8 = 0x04;
const COMPANY_ID_TEST: u16 = 0xFFFF;

const ADV_TEMPLATE: [u8; ADV_DATA_LEN] = {
    let company = COMPANY_ID_TEST.to_le_bytes();
    [
        0x02,
        AD_TYPE_FLAGS,
        LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED,
        0x05,
        AD_TYPE_MANUFACTURER_DATA,
        company[0],
        company[1],
        0x00,
        0x00,
    ]
};

/// Encode a temperature as `temperature * 256`, truncated toward zero and
/// saturated to `i16`, in big-endian order.
pub fn encode_temperature(temperature: f32) -> [u8; 2] {
    I8F8::from_bits((temperature * 256.0) as i16).to_be_bytes()
}

/// Inverse of [`encode_temperature`], exact to 1/256 of a degree.
pub fn decode_temperature(bytes: [u8; 2]) -> f32 {
    I8F8::from_be_bytes(bytes).to_num::<f32>()
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BroadcastPayload {
    adv: [u8; ADV_DATA_LEN],
    scan: Vec<u8, ADV_DATA_MAX>,
}

impl BroadcastPayload {
    pub fn new(device_name: &str) -> Result<Self, PayloadError> {
        let name = device_name.as_bytes();
        if name.len() + 2 > ADV_DATA_MAX {
            return Err(PayloadError::NameTooLong);
        }
        let mut scan = Vec::new();
        // Length checked above, so none of these can overflow.
        let _ = scan.push(name.len() as u8 + 1);
        let _ = scan.push(AD_TYPE_COMPLETE_LOCAL_NAME);
        let _ = scan.extend_from_slice(name);
        Ok(Self { adv: ADV_TEMPLATE, scan })
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        let field = encode_temperature(temperature);
        self.adv[TEMPERATURE_OFFSET..TEMPERATURE_OFFSET + 2]
            .copy_from_slice(&field);
    }

    pub fn temperature(&self) -> f32 {
        decode_temperature([
            self.adv[TEMPERATURE_OFFSET],
            self.adv[TEMPERATURE_OFFSET + 1],
        ])
    }

    pub fn advertising_data(&self) -> &[u8] {
        &self.adv
    }

    pub fn scan_response(&self) -> &[u8] {
        &self.scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_72_5_big_endian() {
        assert_eq!(encode_temperature(72.5), [0x48, 0x40]);
        assert_eq!(decode_temperature([0x48, 0x40]), 72.5);
    }

    #[test]
    fn encoding_truncates_toward_zero() {
        // 73.2 * 256 = 18739.2
        assert_eq!(i16::from_be_bytes(encode_temperature(73.2)), 18739);
        // -0.001 * 256 = -0.256
        assert_eq!(i16::from_be_bytes(encode_temperature(-0.001)), 0);
        assert_eq!(i16::from_be_bytes(encode_temperature(-10.5)), -2688);
    }

    #[test]
    fn encoding_saturates() {
        assert_eq!(i16::from_be_bytes(encode_temperature(500.0)), i16::MAX);
        assert_eq!(i16::from_be_bytes(encode_temperature(-500.0)), i16::MIN);
    }

    #[test]
    fn decode_is_within_one_step() {
        for t in [-40.0f32, -0.3, 0.0, 21.7, 73.2, 98.6, 120.125] {
            let back = decode_temperature(encode_temperature(t));
            assert!((t - back).abs() < 1.0 / 256.0, "{t} -> {back}");
        }
    }

    #[test]
    fn layout_places_field_at_offset() {
        let mut payload = BroadcastPayload::new("kdc-thermo").unwrap();
        payload.set_temperature(72.5);
        let adv = payload.advertising_data();
        assert_eq!(adv.len(), ADV_DATA_LEN);
        assert_eq!(&adv[..7], &[0x02, 0x01, 0x06, 0x05, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&adv[TEMPERATURE_OFFSET..], &[0x48, 0x40]);
        assert_eq!(payload.temperature(), 72.5);
    }

    #[test]
    fn scan_response_carries_name() {
        let payload = BroadcastPayload::new("kdc").unwrap();
        assert_eq!(payload.scan_response(), &[0x04, 0x09, b'k', b'd', b'c']);
    }

    #[test]
    fn rejects_long_name() {
        let name = "a-device-name-that-is-far-too-long";
        assert_eq!(BroadcastPayload::new(name), Err(PayloadError::NameTooLong));
    }
}
