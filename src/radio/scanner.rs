//! BLE GAP scanner - waits for the NUS peripheral.
//!
//! Active scan (scan responses carry the device name). Each report is
//! run through the static [`ScanFilter`]; the first match stops the scan
//! and its address is handed to the session as a `ScanMatch`.

use central_uart::ble::adv_parser::{extract_device_name, ScanFilter};
use central_uart::config::{BLE_SCAN_INTERVAL, BLE_SCAN_WINDOW};
use central_uart::BleError;
use defmt::{info, warn};
use nrf_softdevice::ble::{central, Address};
use nrf_softdevice::Softdevice;

/// Scan until an advertisement passes `filter`.
pub async fn scan_for_match(sd: &Softdevice, filter: &ScanFilter) -> Result<Address, BleError> {
    let config = central::ScanConfig {
        // Active scan to retrieve scan-response data (device names).
        active: true,
        interval: BLE_SCAN_INTERVAL,
        window: BLE_SCAN_WINDOW,
        ..Default::default()
    };

    let result = central::scan(sd, &config, |params| {
        let data =
            unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };

        if !filter.matches(data) {
            // None keeps scanning.
            return None;
        }

        let address = Address::from_raw(params.peer_addr);
        info!(
            "Filter matched, connecting to {} ({}, RSSI {})",
            address,
            extract_device_name(data).as_str(),
            params.rssi
        );
        Some(address)
    })
    .await;

    result.map_err(|e| {
        warn!("BLE scan ended with error: {}", e);
        BleError::ScanFailed
    })
}
