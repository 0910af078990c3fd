//! Application-wide constants and compile-time configuration.
//!
//! All radio parameters, timing, payload shape, and pin notes live here
//! so they can be tuned in one place.

use crate::ble::Phy;

// BLE

/// Advertised device name the scanner filters on.
pub const TARGET_NAME: &str = "Nordic_UART_Service";

/// Nordic UART Service UUID `6e400001-b5a3-f393-e0a9-e50e24dcca9e`,
/// little-endian as it appears on air.
pub const NUS_SERVICE_UUID: [u8; 16] = [
    0x9e, 0xca, 0xdc, 0x24, 0x0e, 0xe5, 0xa9, 0xe0, 0x93, 0xf3, 0xa3, 0xb5, 0x01, 0x00, 0x40, 0x6e,
];

/// Transmit power requested once a link is up (dBm).
pub const TX_POWER_DBM: i8 = 8;

/// PHY requested for both directions once a link is up.
pub const PREFERRED_PHY: Phy = Phy::Coded;

/// Scan interval / window (in 0.625 ms units). 100 ms / 50 ms.
pub const BLE_SCAN_INTERVAL: u32 = 160;
pub const BLE_SCAN_WINDOW: u32 = 80;

/// How long a connection attempt waits for the matched peer to advertise
/// again (in 10 ms units). 500 = 5 s, then the central falls back to scanning.
pub const BLE_CONNECT_TIMEOUT: u16 = 500;

/// BLE connection interval range (in 1.25 ms units).
/// 24..=40 = 30..50 ms, comfortable for a 500 ms send period.
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// ATT MTU configured in the SoftDevice; a 32-byte write needs at least 35.
pub const BLE_ATT_MTU: u16 = 64;

// NUS payload

/// Period of the send loop (ms).
pub const SEND_PERIOD_MS: u64 = 500;

/// Outbound payload length (bytes).
pub const PAYLOAD_LEN: usize = 32;

/// Every payload byte carries this value.
pub const PAYLOAD_FILL: u8 = b'A';

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; the actual `embassy_nrf::peripherals::*` pins
// are picked in `bin/button_mirror.rs`.  All four are active-low on the DK.
//
//   Button 1 (sw0) → P0.11
//   Button 2 (sw1) → P0.12
//   LED 1 (led0)   → P0.13
//   LED 2 (led1)   → P0.14

/// Mirror loop polling period (ms).
pub const MIRROR_POLL_MS: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_attempt_is_bounded() {
        // 0 means "no timeout" to the SoftDevice.
        assert!(BLE_CONNECT_TIMEOUT > 0);
        // Falls back to scanning within 10 s.
        assert!(u32::from(BLE_CONNECT_TIMEOUT) * 10 <= 10_000);
    }

    #[test]
    fn payload_fits_one_write() {
        // ATT write header is 3 bytes.
        assert!(PAYLOAD_LEN + 3 <= BLE_ATT_MTU as usize);
    }
}
