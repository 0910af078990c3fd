//! Integration tests for central-uart host-testable logic.

use central_uart::ble::adv_parser::ScanFilter;
use central_uart::ble::session::{Action, CentralState, Session};
use central_uart::ble::{BleEvent, Link, LinkStatus};
use central_uart::config::{TARGET_NAME, TX_POWER_DBM};
use std::rc::Rc;

struct FakeRadio;

impl Link for FakeRadio {
    type Peer = [u8; 6];
    type Conn = Rc<&'static str>;
    type Client = (u16, u16);
}

/// Advertisement a NUS peripheral sends: flags + complete local name.
fn nus_advertisement() -> Vec<u8> {
    let mut ad = vec![0x02, 0x01, 0x06];
    ad.push(TARGET_NAME.len() as u8 + 1);
    ad.push(0x09);
    ad.extend_from_slice(TARGET_NAME.as_bytes());
    ad
}

/// Drive one full connection: scan match → connect → discovery.
/// Returns the number of payloads the send loop produced over `ticks`.
fn run_link(session: &mut Session<FakeRadio>, conn: &Rc<&'static str>, ticks: usize) -> usize {
    let filter = ScanFilter::by_name(TARGET_NAME);
    assert!(filter.matches(&nus_advertisement()));

    let t = session.handle(BleEvent::ScanMatch { peer: [1, 2, 3, 4, 5, 6] });
    assert_eq!(t.actions.as_slice(), &[Action::Connect([1, 2, 3, 4, 5, 6])]);

    let t = session.handle(BleEvent::Connected { conn: conn.clone() });
    assert!(t.actions.contains(&Action::SetTxPower(TX_POWER_DBM)));
    assert!(t.actions.contains(&Action::StartDiscovery));

    let t = session.handle(BleEvent::DiscoveryComplete((0x000e, 0x0010)));
    assert_eq!(t.actions.as_slice(), &[Action::Subscribe]);

    (0..ticks).filter_map(|_| session.tick()).count()
}

#[test]
fn reconnect_cycle_rearms_scanning_each_time() {
    let mut session: Session<FakeRadio> = Session::new();
    session.handle(BleEvent::ScanStarted);

    let mut scans_scheduled = 0;
    for n in 1..=3u32 {
        let conn = Rc::new("link");
        let sent = run_link(&mut session, &conn, 4);
        assert_eq!(sent, 4);
        assert_eq!(session.status(), LinkStatus::Connected);
        assert_eq!(session.connections(), n);

        let t = session.handle(BleEvent::Disconnected { reason: Some(0x13) });
        scans_scheduled += t
            .actions
            .iter()
            .filter(|a| **a == Action::ScheduleScan)
            .count();
        assert_eq!(session.status(), LinkStatus::Disconnected);
        assert_eq!(Rc::strong_count(&conn), 1, "connection reference released");

        // The deferred scan starts later, not from the disconnect itself.
        assert_eq!(session.state(), CentralState::Scanning);
        assert!(session.tick().is_none());
        session.handle(BleEvent::ScanStarted);
    }
    assert_eq!(scans_scheduled, 3);
}

#[test]
fn link_without_nus_keeps_sending_attempts() {
    let mut session: Session<FakeRadio> = Session::new();
    session.handle(BleEvent::ScanStarted);
    session.handle(BleEvent::ScanMatch { peer: [9; 6] });
    session.handle(BleEvent::Connected { conn: Rc::new("no-nus") });
    let t = session.handle(BleEvent::ServiceNotFound);

    assert!(t.actions.is_empty());
    assert_eq!(session.state(), CentralState::Connected);
    assert!(session.client().is_none());
    let payload = session.tick().expect("send still attempted");
    assert_eq!(payload.as_bytes(), [b'A'; 32].as_slice());
}

#[test]
fn unrelated_advertisers_are_filtered_out() {
    let filter = ScanFilter::by_name(TARGET_NAME);
    let other = [0x07, 0x09, b'T', b'h', b'i', b'n', b'g', b'y'];
    assert!(!filter.matches(&other));
    assert!(!filter.matches(&[]));
}
