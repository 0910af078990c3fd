//! central-uart - BLE central streaming to a Nordic UART Service peer.
//!
//! Scans for a peripheral advertising `Nordic_UART_Service`, connects,
//! asks for +8 dBm and Coded PHY, discovers NUS, and writes 32 bytes of
//! `'A'` every 500 ms while the link is up. On disconnect it scans again.

#![no_std]
#![no_main]

mod radio;

use core::mem;

use central_uart::config;
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use embassy_sync::channel::Channel;
use nrf_softdevice::{raw, Softdevice};
use radio::link::{self, Work, WorkQueue};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

static SCAN_WORK: StaticCell<WorkQueue> = StaticCell::new();

const DEVICE_NAME: &[u8] = b"central_uart";

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: config::BLE_ATT_MTU,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 0,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    // Radio enable; the SoftDevice panics here if it cannot start.
    let sd: &'static Softdevice = Softdevice::enable(&softdevice_config());
    unwrap!(spawner.spawn(softdevice_task(sd)));
    info!("Bluetooth initialized");

    let work = SCAN_WORK.init(Channel::new());
    // First scan goes through the same queue as every re-scan.
    unwrap!(work.try_send(Work::StartScan));
    unwrap!(spawner.spawn(link::central_task(sd, work)));
}
