//! Host-testable core of the central-uart firmware.
//!
//! This library holds the logic that does not need hardware: the BLE
//! central connection state machine, the advertising filter, the fixed
//! NUS payload, and the button → LED mirror (over `embedded-hal` traits).
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binaries (`src/main.rs`, `src/bin/button_mirror.rs`)
//! are `#![no_std]` / `#![no_main]` and link against this library; they
//! only add the SoftDevice and embassy-nrf glue.

#![cfg_attr(not(test), no_std)]

pub mod ble;
pub mod config;
pub mod error;
pub mod mirror;

pub use error::{BleError, Error, GpioError, PinRole};
