//! Central connection driver.
//!
//! Owns the [`Session`] and is the only code that talks to the
//! SoftDevice on its behalf: every SoftDevice result becomes a
//! [`BleEvent`], every [`Action`] the session returns is carried out
//! here. Re-scans are never started inline; they go through the
//! [`WorkQueue`] and are picked up at the top of the loop.

use central_uart::ble::adv_parser::ScanFilter;
use central_uart::ble::session::{Action, CentralState, Session};
use central_uart::ble::{BleEvent, Link, LinkStatus, Phy};
use central_uart::config::{self, SEND_PERIOD_MS, TARGET_NAME};
use central_uart::{BleError, Error};
use defmt::{error, info, warn, Format};
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};
use heapless::Deque;
use nrf_softdevice::ble::gatt_client::DiscoverError;
use nrf_softdevice::ble::{central, Address, Connection};
use nrf_softdevice::{raw, Softdevice};

use super::nus_client::{self, NusClient};
use super::scanner;

/// SoftDevice-backed types plugged into the session.
pub struct SoftdeviceLink;

impl Link for SoftdeviceLink {
    type Peer = Address;
    type Conn = Connection;
    type Client = NusClient;
}

type CentralSession = Session<SoftdeviceLink>;
type Event = BleEvent<SoftdeviceLink>;

/// Deferred work items.
#[derive(Clone, Copy, Format)]
pub enum Work {
    StartScan,
}

pub type WorkQueue = Channel<CriticalSectionRawMutex, Work, 2>;

struct Driver {
    sd: &'static Softdevice,
    work: &'static WorkQueue,
    filter: ScanFilter,
}

#[embassy_executor::task]
pub async fn central_task(sd: &'static Softdevice, work: &'static WorkQueue) {
    let driver = Driver {
        sd,
        work,
        filter: ScanFilter::by_name(TARGET_NAME),
    };
    let mut session = CentralSession::new();
    let mut started = false;

    loop {
        // Deferred work: the only way a scan gets (re)started.
        let Work::StartScan = work.receive().await;

        // `central::scan` only reports once it has a result, so the start
        // is recorded together with the match.
        match scanner::scan_for_match(sd, &driver.filter).await {
            Ok(peer) => {
                driver.dispatch(&mut session, BleEvent::ScanStarted).await;
                driver
                    .dispatch(&mut session, BleEvent::ScanMatch { peer })
                    .await;
            }
            Err(e) => {
                driver.dispatch(&mut session, BleEvent::ScanFailed).await;
                if !started {
                    error!("Scan start failed (err {})", Error::from(e).code());
                    return;
                }
            }
        }

        if session.state() == CentralState::Idle {
            // No retry: scanning stays off until something queues it.
            error!("Scan failed; scanning stopped");
            continue;
        }
        if !started {
            info!("BLE Long Range central started");
            started = true;
        }

        if session.status() == LinkStatus::Connected {
            driver.serve(&mut session).await;
        }
    }
}

impl Driver {
    /// Feed `event` to the session and run the resulting actions until
    /// no follow-up event remains.
    async fn dispatch(&self, session: &mut CentralSession, event: Event) {
        let mut pending: Deque<Event, 4> = Deque::new();
        let _ = pending.push_back(event);

        while let Some(event) = pending.pop_front() {
            let kind = event.kind();
            let transition = session.handle(event);
            if !transition.accepted {
                warn!("central: {} ignored in {}", kind, transition.from);
                continue;
            }
            info!(
                "central: {} -> {} on {}",
                transition.from, transition.to, kind
            );

            for action in transition.actions {
                if let Some(next) = self.perform(session, action).await {
                    let _ = pending.push_back(next);
                }
            }
        }
    }

    async fn perform(&self, session: &CentralSession, action: Action<Address>) -> Option<Event> {
        match action {
            Action::Connect(peer) => Some(match connect(self.sd, &peer).await {
                Ok(conn) => {
                    info!("Connected: {}", peer);
                    BleEvent::Connected { conn }
                }
                Err(e) => {
                    warn!("Connection attempt failed: {}", e);
                    BleEvent::ConnectFailed
                }
            }),

            Action::SetTxPower(dbm) => {
                match session.connection().map(|conn| set_tx_power(conn, dbm)) {
                    Some(Ok(())) => info!("TX power set to +{} dBm", dbm),
                    Some(Err(e)) => {
                        error!("Failed to set TX power (err {})", Error::from(e).code())
                    }
                    None => {}
                }
                None
            }

            Action::RequestPhy(phy) => {
                match session.connection().map(|conn| request_phy(conn, phy)) {
                    Some(Ok(())) => info!("PHY update requested: {}", phy),
                    Some(Err(e)) => {
                        error!("PHY update failed (err {})", Error::from(e).code())
                    }
                    None => {}
                }
                None
            }

            Action::StartDiscovery => {
                let conn = session.connection()?;
                Some(match nus_client::discover(conn).await {
                    Ok(client) => {
                        info!("Service discovery complete");
                        BleEvent::DiscoveryComplete(client)
                    }
                    Err(DiscoverError::ServiceNotFound) => {
                        warn!("Service not found during discovery");
                        BleEvent::ServiceNotFound
                    }
                    Err(e) => {
                        error!("GATT discovery error ({})", e);
                        BleEvent::DiscoveryError(nus_client::discovery_code(&e))
                    }
                })
            }

            Action::Subscribe => {
                if let Some(client) = session.client() {
                    // Failure already logged; the link keeps running.
                    let _ = nus_client::subscribe(client).await;
                }
                None
            }

            Action::ScheduleScan => {
                if self.work.try_send(Work::StartScan).is_err() {
                    warn!("scan work queue full");
                }
                None
            }
        }
    }

    /// Run the connected phase until the link drops, then report the
    /// disconnect.
    async fn serve(&self, session: &mut CentralSession) {
        {
            let session = &*session;
            let Some(conn) = session.connection().cloned() else {
                return;
            };

            let sender = send_loop(&conn, session);
            match session.client() {
                Some(client) => {
                    select(nus_client::run_receiver(&conn, client), sender).await;
                }
                None => sender.await,
            }
        }

        info!("Disconnected");
        self.dispatch(session, BleEvent::Disconnected { reason: None })
            .await;
    }
}

/// Every tick: send the payload while the session says connected.
async fn send_loop(conn: &Connection, session: &CentralSession) {
    let mut ticker = Ticker::every(Duration::from_millis(SEND_PERIOD_MS));
    loop {
        if conn.handle().is_none() {
            return;
        }

        if let Some(payload) = session.tick() {
            let result = match session.client() {
                Some(client) => nus_client::send(client, &payload).await,
                None => Err(BleError::NotDiscovered),
            };
            match result {
                Ok(()) => info!("Data sent"),
                Err(e) => warn!("BLE send failed: {}", e),
            }
        }

        ticker.next().await;
    }
}

async fn connect(sd: &Softdevice, peer: &Address) -> Result<Connection, central::ConnectError> {
    let whitelist = [peer];
    let conn_cfg = central::ConnectConfig {
        scan_config: central::ScanConfig {
            whitelist: Some(&whitelist),
            // A peer that stops advertising ends as `ConnectError::Timeout`.
            timeout: config::BLE_CONNECT_TIMEOUT,
            ..Default::default()
        },
        conn_params: raw::ble_gap_conn_params_t {
            min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
            max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
            slave_latency: config::BLE_SLAVE_LATENCY,
            conn_sup_timeout: config::BLE_SUP_TIMEOUT,
        },
        ..Default::default()
    };

    central::connect(sd, &conn_cfg).await
}

fn check(ret: u32) -> Result<(), BleError> {
    match ret {
        raw::NRF_SUCCESS => Ok(()),
        err => Err(BleError::Raw(err)),
    }
}

fn set_tx_power(conn: &Connection, dbm: i8) -> Result<(), BleError> {
    let handle = conn.handle().ok_or(BleError::Disconnected)?;
    let ret = unsafe {
        raw::sd_ble_gap_tx_power_set(
            raw::BLE_GAP_TX_POWER_ROLES_BLE_GAP_TX_POWER_ROLE_CONN as u8,
            handle,
            dbm,
        )
    };
    check(ret)
}

fn request_phy(conn: &Connection, phy: Phy) -> Result<(), BleError> {
    let handle = conn.handle().ok_or(BleError::Disconnected)?;
    let bits = (match phy {
        Phy::M1 => raw::BLE_GAP_PHY_1MBPS,
        Phy::M2 => raw::BLE_GAP_PHY_2MBPS,
        Phy::Coded => raw::BLE_GAP_PHY_CODED,
    }) as u8;
    let phys = raw::ble_gap_phys_t {
        tx_phys: bits,
        rx_phys: bits,
    };
    let ret = unsafe { raw::sd_ble_gap_phy_update(handle, &phys) };
    check(ret)
}
