use metrics::counter;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::api::DispatchError;
use crate::entries::{Entry, EntryKind, TypedEntry};
use crate::record::ParsedRecord;

/// Turn a record into the entries it stands for.
///
/// Most kinds yield exactly one entry. `SignalStrengthOnLocationChange` yields
/// two: the location-change entry and a plain `SignalStrength` entry read from
/// the same payload. The two halves are decoded independently: if only one of
/// them fails, the other is still returned and the failure is logged.
pub fn dispatch(record: &ParsedRecord) -> Result<Vec<TypedEntry>, DispatchError> {
    let kind = EntryKind::from_identifier(&record.identifier).ok_or_else(|| {
        DispatchError::UnknownKind {
            identifier: record.identifier.clone(),
        }
    })?;

    let entry = match kind {
        EntryKind::Wifi => TypedEntry::Wifi(decode_entry(record, kind)?),
        EntryKind::CellLocation => TypedEntry::CellLocation(decode_entry(record, kind)?),
        EntryKind::DataConnectionState => {
            TypedEntry::DataConnectionState(decode_entry(record, kind)?)
        }
        EntryKind::ServiceState => TypedEntry::ServiceState(decode_entry(record, kind)?),
        EntryKind::SignalStrength => TypedEntry::SignalStrength(decode_entry(record, kind)?),
        EntryKind::SignalStrengthOnLocationChange => return dispatch_location_change(record),
        EntryKind::TelephonyState => TypedEntry::TelephonyState(decode_entry(record, kind)?),
    };

    Ok(vec![entry])
}

fn dispatch_location_change(record: &ParsedRecord) -> Result<Vec<TypedEntry>, DispatchError> {
    let on_location_change = decode_entry(record, EntryKind::SignalStrengthOnLocationChange)
        .map(TypedEntry::SignalStrengthOnLocationChange);
    let signal_strength =
        decode_entry(record, EntryKind::SignalStrength).map(TypedEntry::SignalStrength);

    match (on_location_change, signal_strength) {
        (Ok(first), Ok(second)) => Ok(vec![first, second]),
        (Ok(entry), Err(err)) | (Err(err), Ok(entry)) => {
            warn!(
                timestamp = record.timestamp,
                "emitting {} only, other half of {} failed: {}",
                entry.kind(),
                EntryKind::SignalStrengthOnLocationChange,
                err
            );
            counter!("crowd_entries_dropped_total", "cause" => "partial_dual_emission")
                .increment(1);
            Ok(vec![entry])
        }
        (Err(err), Err(_)) => Err(err),
    }
}

fn decode_entry<P: DeserializeOwned>(
    record: &ParsedRecord,
    kind: EntryKind,
) -> Result<Entry<P>, DispatchError> {
    let payload = record
        .decode_payload::<P>()
        .map_err(|source| DispatchError::PayloadDecode { kind, source })?;
    Ok(Entry::new(record.timestamp, record.location.clone(), payload))
}
