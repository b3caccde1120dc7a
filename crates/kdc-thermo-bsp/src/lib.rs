#![no_std]
//! Board support for the KDC thermometer beacon (nRF52840).

// Modules
mod board;
mod resources;

// Flatten
pub use board::*;
pub use resources::*;

pub mod ble;
