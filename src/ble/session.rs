//! Central connection lifecycle.
//!
//! `Idle → Scanning → Connecting → Discovering → Connected`, and back to
//! `Scanning` on any disconnect. All connection state is owned by one
//! [`Session`]; nothing here touches the radio. The driver performs the
//! [`Action`]s a transition returns and reports the outcome as the next
//! [`BleEvent`].

use heapless::Vec;

use super::payload::Payload;
use super::{BleEvent, Link, LinkStatus, Phy};
use crate::config::{PREFERRED_PHY, TX_POWER_DBM};

/// Upper bound of actions produced by a single event.
pub const MAX_ACTIONS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CentralState {
    /// Radio up, no scan running yet (or scan start failed).
    Idle,
    /// Active scan with the name filter.
    Scanning,
    /// Filter matched, connection being established.
    Connecting,
    /// Link up, NUS discovery in flight.
    Discovering,
    /// Link up. Sends happen here whether or not discovery succeeded.
    Connected,
}

/// Work the radio driver must carry out after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action<P> {
    /// Open a link to the matched peer.
    Connect(P),
    /// Best-effort TX power change on the link (dBm).
    SetTxPower(i8),
    /// Best-effort PHY update request for both directions.
    RequestPhy(Phy),
    /// Start NUS discovery on the link.
    StartDiscovery,
    /// Enable notifications on the NUS TX characteristic.
    Subscribe,
    /// Queue a scan start as deferred work. Never performed inline.
    ScheduleScan,
}

/// Result of feeding one event to the session.
#[derive(Debug, PartialEq, Eq)]
pub struct Transition<P> {
    pub from: CentralState,
    pub to: CentralState,
    /// `false` when the event was not valid in `from` and was dropped.
    pub accepted: bool,
    pub actions: Vec<Action<P>, MAX_ACTIONS>,
}

impl<P> Transition<P> {
    fn ignored(state: CentralState) -> Self {
        Self {
            from: state,
            to: state,
            accepted: false,
            actions: Vec::new(),
        }
    }
}

/// Connection session: `default_conn`, the status flag and the NUS client
/// context, owned together.
pub struct Session<L: Link> {
    state: CentralState,
    status: LinkStatus,
    default_conn: Option<L::Conn>,
    pending_peer: Option<L::Peer>,
    client: Option<L::Client>,
    connections: u32,
}

impl<L: Link> Session<L> {
    pub const fn new() -> Self {
        Self {
            state: CentralState::Idle,
            status: LinkStatus::Disconnected,
            default_conn: None,
            pending_peer: None,
            client: None,
            connections: 0,
        }
    }

    pub fn state(&self) -> CentralState {
        self.state
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// The held link, if any.
    pub fn connection(&self) -> Option<&L::Conn> {
        self.default_conn.as_ref()
    }

    /// Peer currently being connected to.
    pub fn pending_peer(&self) -> Option<&L::Peer> {
        self.pending_peer.as_ref()
    }

    /// NUS client context. Survives disconnects: the handles of a
    /// previous link stay here until the next discovery overwrites them.
    pub fn client(&self) -> Option<&L::Client> {
        self.client.as_ref()
    }

    /// Number of links established since boot.
    pub fn connections(&self) -> u32 {
        self.connections
    }

    /// Periodic send decision: the payload to write, only while connected.
    pub fn tick(&self) -> Option<Payload> {
        match self.status {
            LinkStatus::Connected => Some(Payload::new()),
            LinkStatus::Disconnected => None,
        }
    }

    /// Apply one event. This is the only place state changes.
    pub fn handle(&mut self, event: BleEvent<L>) -> Transition<L::Peer> {
        use CentralState::*;

        let from = self.state;
        let mut actions = Vec::new();

        let to = match (from, event) {
            (Idle | Scanning, BleEvent::ScanStarted) => Scanning,

            (Idle | Scanning, BleEvent::ScanFailed) => Idle,

            (Scanning, BleEvent::ScanMatch { peer }) => {
                self.pending_peer = Some(peer.clone());
                push(&mut actions, Action::Connect(peer));
                Connecting
            }

            (Scanning | Connecting, BleEvent::Connected { conn }) => {
                self.pending_peer = None;
                self.default_conn = Some(conn);
                self.status = LinkStatus::Connected;
                self.connections = self.connections.wrapping_add(1);
                push(&mut actions, Action::SetTxPower(TX_POWER_DBM));
                push(&mut actions, Action::RequestPhy(PREFERRED_PHY));
                push(&mut actions, Action::StartDiscovery);
                Discovering
            }

            (Connecting, BleEvent::ConnectFailed) => {
                self.pending_peer = None;
                push(&mut actions, Action::ScheduleScan);
                Scanning
            }

            (Discovering, BleEvent::DiscoveryComplete(client)) => {
                self.client = Some(client);
                push(&mut actions, Action::Subscribe);
                Connected
            }

            // Link stays up but without usable handles; no retry.
            (Discovering, BleEvent::ServiceNotFound | BleEvent::DiscoveryError(_)) => Connected,

            // Only a held or pending link can drop; a scan is already armed
            // otherwise.
            (Connecting | Discovering | Connected, BleEvent::Disconnected { .. }) => {
                self.default_conn = None;
                self.pending_peer = None;
                self.status = LinkStatus::Disconnected;
                push(&mut actions, Action::ScheduleScan);
                Scanning
            }

            _ => return Transition::ignored(from),
        };

        self.state = to;
        Transition {
            from,
            to,
            accepted: true,
            actions,
        }
    }
}

impl<L: Link> Default for Session<L> {
    fn default() -> Self {
        Self::new()
    }
}

fn push<P>(actions: &mut Vec<Action<P>, MAX_ACTIONS>, action: Action<P>) {
    // A single event never yields more than MAX_ACTIONS.
    let _ = actions.push(action);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct MockLink;

    impl Link for MockLink {
        type Peer = [u8; 6];
        type Conn = Rc<u16>;
        type Client = u16;
    }

    const PEER: [u8; 6] = [0xc0, 0x01, 0x02, 0x03, 0x04, 0x05];

    fn scanning() -> Session<MockLink> {
        let mut s = Session::new();
        s.handle(BleEvent::ScanStarted);
        s
    }

    fn connected(conn: &Rc<u16>) -> Session<MockLink> {
        let mut s = scanning();
        s.handle(BleEvent::ScanMatch { peer: PEER });
        s.handle(BleEvent::Connected { conn: conn.clone() });
        s
    }

    #[test]
    fn new_session_is_idle_and_disconnected() {
        let s: Session<MockLink> = Session::new();
        assert_eq!(s.state(), CentralState::Idle);
        assert_eq!(s.status(), LinkStatus::Disconnected);
        assert!(s.connection().is_none());
        assert!(s.client().is_none());
        assert_eq!(s.connections(), 0);
    }

    #[test]
    fn scan_match_requests_connect_to_peer() {
        let mut s = scanning();
        let t = s.handle(BleEvent::ScanMatch { peer: PEER });
        assert_eq!(t.from, CentralState::Scanning);
        assert_eq!(t.to, CentralState::Connecting);
        assert_eq!(t.actions.as_slice(), &[Action::Connect(PEER)]);
        assert_eq!(s.pending_peer(), Some(&PEER));
        assert_eq!(s.status(), LinkStatus::Disconnected);
    }

    #[test]
    fn connected_sets_status_and_requests_link_setup() {
        let conn = Rc::new(7);
        let mut s = scanning();
        s.handle(BleEvent::ScanMatch { peer: PEER });
        let t = s.handle(BleEvent::Connected { conn: conn.clone() });

        assert_eq!(t.to, CentralState::Discovering);
        assert_eq!(
            t.actions.as_slice(),
            &[
                Action::SetTxPower(8),
                Action::RequestPhy(Phy::Coded),
                Action::StartDiscovery,
            ]
        );
        assert_eq!(s.status(), LinkStatus::Connected);
        assert_eq!(s.connection().map(|c| **c), Some(7));
        assert!(s.pending_peer().is_none());
        assert_eq!(s.connections(), 1);
    }

    #[test]
    fn discovery_complete_assigns_client_and_subscribes() {
        let conn = Rc::new(1);
        let mut s = connected(&conn);
        let t = s.handle(BleEvent::DiscoveryComplete(0x0010));
        assert_eq!(t.to, CentralState::Connected);
        assert_eq!(t.actions.as_slice(), &[Action::Subscribe]);
        assert_eq!(s.client(), Some(&0x0010));
    }

    #[test]
    fn discovery_failure_leaves_link_open_without_retry() {
        let events: [BleEvent<MockLink>; 2] =
            [BleEvent::ServiceNotFound, BleEvent::DiscoveryError(-5)];
        for event in events {
            let conn = Rc::new(1);
            let mut s = connected(&conn);
            let t = s.handle(event);
            assert!(t.accepted);
            assert_eq!(t.to, CentralState::Connected);
            assert!(t.actions.is_empty());
            assert_eq!(s.status(), LinkStatus::Connected);
            assert!(s.client().is_none());
            // Still tries to send; the transport rejects it.
            assert!(s.tick().is_some());
        }
    }

    #[test]
    fn disconnect_releases_handle_and_schedules_one_scan() {
        for reason in [None, Some(0x08), Some(0x13), Some(0x16), Some(0x3e)] {
            let conn = Rc::new(3);
            let mut s = connected(&conn);
            s.handle(BleEvent::DiscoveryComplete(0x0020));
            assert_eq!(Rc::strong_count(&conn), 2);

            let t = s.handle(BleEvent::Disconnected { reason });
            assert_eq!(t.to, CentralState::Scanning);
            assert_eq!(t.actions.as_slice(), &[Action::ScheduleScan]);
            assert_eq!(s.status(), LinkStatus::Disconnected);
            assert!(s.connection().is_none());
            assert_eq!(Rc::strong_count(&conn), 1);
        }
    }

    #[test]
    fn disconnect_during_discovery_schedules_scan() {
        let conn = Rc::new(1);
        let mut s = connected(&conn);
        let t = s.handle(BleEvent::Disconnected { reason: Some(0x08) });
        assert_eq!(t.from, CentralState::Discovering);
        assert_eq!(t.actions.as_slice(), &[Action::ScheduleScan]);
    }

    #[test]
    fn stray_disconnect_does_not_queue_second_scan() {
        let mut idle: Session<MockLink> = Session::new();
        let t = idle.handle(BleEvent::Disconnected { reason: Some(0x08) });
        assert!(!t.accepted);
        assert!(t.actions.is_empty());
        assert_eq!(idle.state(), CentralState::Idle);

        let mut s = scanning();
        let t = s.handle(BleEvent::Disconnected { reason: None });
        assert!(!t.accepted);
        assert!(t.actions.is_empty());
        assert_eq!(s.state(), CentralState::Scanning);
    }

    #[test]
    fn disconnect_while_connecting_schedules_scan() {
        let mut s = scanning();
        s.handle(BleEvent::ScanMatch { peer: PEER });
        let t = s.handle(BleEvent::Disconnected { reason: Some(0x3e) });
        assert!(t.accepted);
        assert_eq!(t.actions.as_slice(), &[Action::ScheduleScan]);
        assert!(s.pending_peer().is_none());
    }

    #[test]
    fn failed_first_scan_stays_idle() {
        let mut s: Session<MockLink> = Session::new();
        let t = s.handle(BleEvent::ScanFailed);
        assert!(t.accepted);
        assert_eq!((t.from, t.to), (CentralState::Idle, CentralState::Idle));

        // A later scan that reports start and match together.
        s.handle(BleEvent::ScanStarted);
        let t = s.handle(BleEvent::ScanMatch { peer: PEER });
        assert_eq!(t.to, CentralState::Connecting);
    }

    #[test]
    fn discovering_link_already_counts_as_connected() {
        let conn = Rc::new(1);
        let s = connected(&conn);
        assert_eq!(s.state(), CentralState::Discovering);
        assert_eq!(s.status(), LinkStatus::Connected);
        assert!(s.tick().is_some());
    }

    #[test]
    fn tick_only_yields_payload_while_connected() {
        let mut s = scanning();
        assert!(s.tick().is_none());
        s.handle(BleEvent::ScanMatch { peer: PEER });
        assert!(s.tick().is_none());

        let conn = Rc::new(1);
        s.handle(BleEvent::Connected { conn });
        let payload = s.tick().unwrap();
        assert_eq!(payload.as_bytes(), &[b'A'; 32]);

        s.handle(BleEvent::Disconnected { reason: None });
        assert!(s.tick().is_none());
    }

    #[test]
    fn connect_failure_returns_to_scanning() {
        let mut s = scanning();
        s.handle(BleEvent::ScanMatch { peer: PEER });
        let t = s.handle(BleEvent::ConnectFailed);
        assert_eq!(t.to, CentralState::Scanning);
        assert_eq!(t.actions.as_slice(), &[Action::ScheduleScan]);
        assert!(s.pending_peer().is_none());
        assert_eq!(s.status(), LinkStatus::Disconnected);
        assert_eq!(s.connections(), 0);
    }

    #[test]
    fn scan_failure_goes_idle_without_retry() {
        let mut s: Session<MockLink> = Session::new();
        let t = s.handle(BleEvent::ScanFailed);
        assert_eq!(t.to, CentralState::Idle);
        assert!(t.actions.is_empty());
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut s = scanning();

        let t = s.handle(BleEvent::DiscoveryComplete(1));
        assert!(!t.accepted);
        assert_eq!(t.to, CentralState::Scanning);
        assert!(s.client().is_none());

        let t = s.handle(BleEvent::ConnectFailed);
        assert!(!t.accepted);

        let conn = Rc::new(1);
        let mut s = connected(&conn);
        s.handle(BleEvent::DiscoveryComplete(1));
        let t = s.handle(BleEvent::ScanMatch { peer: PEER });
        assert!(!t.accepted);
        assert_eq!(s.state(), CentralState::Connected);
    }

    #[test]
    fn client_handles_survive_disconnect() {
        let conn = Rc::new(1);
        let mut s = connected(&conn);
        s.handle(BleEvent::DiscoveryComplete(0x0042));
        s.handle(BleEvent::Disconnected { reason: Some(0x13) });
        assert_eq!(s.client(), Some(&0x0042));

        // Reconnected but not yet rediscovered: the stale handles are
        // still what a send would use.
        s.handle(BleEvent::ScanMatch { peer: PEER });
        s.handle(BleEvent::Connected { conn: Rc::new(2) });
        assert_eq!(s.state(), CentralState::Discovering);
        assert_eq!(s.client(), Some(&0x0042));

        s.handle(BleEvent::DiscoveryComplete(0x0050));
        assert_eq!(s.client(), Some(&0x0050));
    }

    #[test]
    fn connected_counted_once_per_link() {
        let mut s = scanning();
        for n in 1..=3 {
            s.handle(BleEvent::ScanMatch { peer: PEER });
            s.handle(BleEvent::Connected { conn: Rc::new(n) });
            assert_eq!(s.connections(), n as u32);
            s.handle(BleEvent::Disconnected { reason: None });
        }
    }
}
