//! Typed entries produced from telemetry records.

use serde::Serialize;
use serde_json::Value;

pub mod location;
pub mod payloads;

pub use location::Location;
pub use payloads::{
    CellLocationBlob, DataConnectionStateBlob, ServiceStateBlob, SignalStrengthBlob,
    SignalStrengthOnLocationChangeBlob, TelephonyStateBlob, WifiNetwork,
};

/// The closed set of record kinds a client can submit. The identifier strings
/// are matched exactly, case included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Wifi,
    CellLocation,
    DataConnectionState,
    ServiceState,
    SignalStrength,
    SignalStrengthOnLocationChange,
    TelephonyState,
}

impl EntryKind {
    pub const ALL: [EntryKind; 7] = [
        EntryKind::Wifi,
        EntryKind::CellLocation,
        EntryKind::DataConnectionState,
        EntryKind::ServiceState,
        EntryKind::SignalStrength,
        EntryKind::SignalStrengthOnLocationChange,
        EntryKind::TelephonyState,
    ];

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == identifier)
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            EntryKind::Wifi => "Wifi",
            EntryKind::CellLocation => "CellLocation",
            EntryKind::DataConnectionState => "DataConnectionState",
            EntryKind::ServiceState => "ServiceState",
            EntryKind::SignalStrength => "SignalStrength",
            EntryKind::SignalStrengthOnLocationChange => "SignalStrengthOnLocationChange",
            EntryKind::TelephonyState => "TelephonyState",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Fields shared by every entry: when it was recorded, where (if known), and
/// the kind-specific payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry<P> {
    pub timestamp: i64,
    pub location: Option<Location>,
    pub payload: P,
}

impl<P> Entry<P> {
    pub fn new(timestamp: i64, location: Option<Location>, payload: P) -> Self {
        Self {
            timestamp,
            location,
            payload,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum TypedEntry {
    Wifi(Entry<Vec<WifiNetwork>>),
    CellLocation(Entry<CellLocationBlob>),
    DataConnectionState(Entry<DataConnectionStateBlob>),
    ServiceState(Entry<ServiceStateBlob>),
    SignalStrength(Entry<SignalStrengthBlob>),
    SignalStrengthOnLocationChange(Entry<SignalStrengthOnLocationChangeBlob>),
    TelephonyState(Entry<TelephonyStateBlob>),
}

impl TypedEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            TypedEntry::Wifi(_) => EntryKind::Wifi,
            TypedEntry::CellLocation(_) => EntryKind::CellLocation,
            TypedEntry::DataConnectionState(_) => EntryKind::DataConnectionState,
            TypedEntry::ServiceState(_) => EntryKind::ServiceState,
            TypedEntry::SignalStrength(_) => EntryKind::SignalStrength,
            TypedEntry::SignalStrengthOnLocationChange(_) => {
                EntryKind::SignalStrengthOnLocationChange
            }
            TypedEntry::TelephonyState(_) => EntryKind::TelephonyState,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            TypedEntry::Wifi(e) => e.timestamp,
            TypedEntry::CellLocation(e) => e.timestamp,
            TypedEntry::DataConnectionState(e) => e.timestamp,
            TypedEntry::ServiceState(e) => e.timestamp,
            TypedEntry::SignalStrength(e) => e.timestamp,
            TypedEntry::SignalStrengthOnLocationChange(e) => e.timestamp,
            TypedEntry::TelephonyState(e) => e.timestamp,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            TypedEntry::Wifi(e) => e.location.as_ref(),
            TypedEntry::CellLocation(e) => e.location.as_ref(),
            TypedEntry::DataConnectionState(e) => e.location.as_ref(),
            TypedEntry::ServiceState(e) => e.location.as_ref(),
            TypedEntry::SignalStrength(e) => e.location.as_ref(),
            TypedEntry::SignalStrengthOnLocationChange(e) => e.location.as_ref(),
            TypedEntry::TelephonyState(e) => e.location.as_ref(),
        }
    }

    /// The kind-specific payload as a JSON document, for sinks that store it
    /// schemaless.
    pub fn payload_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            TypedEntry::Wifi(e) => serde_json::to_value(&e.payload),
            TypedEntry::CellLocation(e) => serde_json::to_value(&e.payload),
            TypedEntry::DataConnectionState(e) => serde_json::to_value(&e.payload),
            TypedEntry::ServiceState(e) => serde_json::to_value(&e.payload),
            TypedEntry::SignalStrength(e) => serde_json::to_value(&e.payload),
            TypedEntry::SignalStrengthOnLocationChange(e) => serde_json::to_value(&e.payload),
            TypedEntry::TelephonyState(e) => serde_json::to_value(&e.payload),
        }
    }
}
