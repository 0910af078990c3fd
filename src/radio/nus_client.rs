//! BLE GATT NUS client - discovery, subscription and writes.
//!
//! After GAP connection is established, this module:
//! 1. Discovers the Nordic UART Service.
//! 2. Enables CCCD notifications on the TX characteristic.
//! 3. Writes the fixed payload to the RX characteristic.
//!
//! Received TX data is not used by this application.

use central_uart::ble::payload::Payload;
use central_uart::config::PAYLOAD_LEN;
use central_uart::BleError;
use defmt::{debug, info, warn};
use nrf_softdevice::ble::gatt_client::{self, DiscoverError};
use nrf_softdevice::ble::Connection;

// errno values reported with discovery failures.
const EIO: i32 = 5;
const EINVAL: i32 = 22;

/// nrf-softdevice GATT client for the Nordic UART Service.
///
/// The `#[nrf_softdevice::gatt_client]` macro generates discovery and
/// write/notify helpers for the listed characteristics.
#[nrf_softdevice::gatt_client(uuid = "6e400001-b5a3-f393-e0a9-e50e24dcca9e")]
pub struct NusClient {
    /// RX - the peripheral receives what we write here.
    #[characteristic(uuid = "6e400002-b5a3-f393-e0a9-e50e24dcca9e", write, write_without_response)]
    pub rx: [u8; PAYLOAD_LEN],

    /// TX - the peripheral notifies its output here.
    #[characteristic(uuid = "6e400003-b5a3-f393-e0a9-e50e24dcca9e", notify)]
    pub tx: heapless::Vec<u8, 61>,
}

/// Discover NUS on the connected peripheral.
pub async fn discover(conn: &Connection) -> Result<NusClient, DiscoverError> {
    info!("Discovering NUS...");
    gatt_client::discover(conn).await
}

/// errno-style code carried by a `DiscoveryError` event.
pub fn discovery_code(err: &DiscoverError) -> i32 {
    match err {
        DiscoverError::ServiceIncomplete => -EINVAL,
        _ => -EIO,
    }
}

/// Enable CCCD notifications on the TX characteristic.
pub async fn subscribe(client: &NusClient) -> Result<(), BleError> {
    client.tx_cccd_write(true).await.map_err(|e| {
        warn!("NUS subscribe failed: {}", e);
        BleError::NotifyFailed
    })?;
    info!("Subscribed to NUS TX notifications");
    Ok(())
}

/// Write the payload to RX without response.
pub async fn send(client: &NusClient, payload: &Payload) -> Result<(), BleError> {
    client
        .rx_write_without_response(payload.as_array())
        .await
        .map_err(|e| {
            warn!("ATT error: {}", e);
            BleError::SendFailed
        })
}

/// Process GATT client events until the connection drops.
pub async fn run_receiver(conn: &Connection, client: &NusClient) {
    let _ = gatt_client::run(conn, client, |event| match event {
        NusClientEvent::TxNotification(data) => {
            debug!("NUS RX {} bytes (ignored)", data.len());
        }
    })
    .await;

    info!("NUS receiver ended (connection closed)");
}
