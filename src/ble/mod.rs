//! Bluetooth Low Energy central - host-testable core.
//!
//! The firmware drives the Nordic SoftDevice S140 in **Central** role;
//! everything here is independent of it:
//!
//! 1. **Advertising filter** - decides which advertisement is our NUS
//!    peripheral (name filter, optional UUID filter).
//! 2. **Session** - the connection lifecycle state machine. The radio
//!    driver turns SoftDevice results into [`BleEvent`]s, feeds them to
//!    [`session::Session::handle`] and performs the returned actions.
//! 3. **Payload** - the fixed block written to the peer every tick.

pub mod adv_parser;
pub mod payload;
pub mod session;

/// The concrete types a radio backend plugs into the session.
///
/// On target these are the SoftDevice address, connection and generated
/// NUS client; tests use plain values.
pub trait Link {
    /// Address of a scanned peer.
    type Peer: Clone;
    /// Reference-counted handle of an established link. Dropping it
    /// releases the reference.
    type Conn: Clone;
    /// Client context holding the discovered NUS characteristic handles.
    type Client;
}

/// Connection status flag read by the send loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

/// Radio PHY preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phy {
    /// 1 Mbit/s.
    M1,
    /// 2 Mbit/s.
    M2,
    /// LE Coded (long range).
    Coded,
}

/// Events the radio backend delivers to the session.
pub enum BleEvent<L: Link> {
    /// Active scanning is running.
    ScanStarted,
    /// Scanning could not be started.
    ScanFailed,
    /// An advertisement passed the scan filter.
    ScanMatch { peer: L::Peer },
    /// Link established.
    Connected { conn: L::Conn },
    /// Connection attempt to the matched peer failed.
    ConnectFailed,
    /// NUS discovered; carries the assigned client context.
    DiscoveryComplete(L::Client),
    /// The peer has no NUS.
    ServiceNotFound,
    /// Discovery aborted with a stack error code.
    DiscoveryError(i32),
    /// Link lost, local or remote. `reason` is the HCI code when the
    /// stack reports one.
    Disconnected { reason: Option<u8> },
}

/// Payload-free tag of a [`BleEvent`], for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    ScanStarted,
    ScanFailed,
    ScanMatch,
    Connected,
    ConnectFailed,
    DiscoveryComplete,
    ServiceNotFound,
    DiscoveryError(i32),
    Disconnected(Option<u8>),
}

impl<L: Link> BleEvent<L> {
    pub fn kind(&self) -> EventKind {
        match self {
            BleEvent::ScanStarted => EventKind::ScanStarted,
            BleEvent::ScanFailed => EventKind::ScanFailed,
            BleEvent::ScanMatch { .. } => EventKind::ScanMatch,
            BleEvent::Connected { .. } => EventKind::Connected,
            BleEvent::ConnectFailed => EventKind::ConnectFailed,
            BleEvent::DiscoveryComplete(_) => EventKind::DiscoveryComplete,
            BleEvent::ServiceNotFound => EventKind::ServiceNotFound,
            BleEvent::DiscoveryError(code) => EventKind::DiscoveryError(*code),
            BleEvent::Disconnected { reason } => EventKind::Disconnected(*reason),
        }
    }
}
