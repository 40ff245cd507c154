//! Payload schemas, one per record kind.
//!
//! Field names follow the camelCase keys the Android client writes. All
//! payloads are lenient: missing fields take their default and unknown fields
//! are ignored, but a field holding the wrong JSON type fails the decode.

use serde::{Deserialize, Serialize};

/// One access point seen during a wifi scan.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WifiNetwork {
    pub bssid: String,
    pub ssid: String,
    pub capabilities: String,
    pub frequency: i32,
    pub level: i32,
}

/// Serving cell. GSM/UMTS devices fill `cid`, `lac` and `psc`, CDMA devices
/// the base station fields.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellLocationBlob {
    pub cid: Option<i32>,
    pub lac: Option<i32>,
    pub psc: Option<i32>,
    pub base_station_id: Option<i32>,
    pub base_station_latitude: Option<i32>,
    pub base_station_longitude: Option<i32>,
    pub network_id: Option<i32>,
    pub system_id: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConnectionStateBlob {
    pub state: i32,
    pub network_type: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceStateBlob {
    pub state: i32,
    pub roaming: bool,
    pub manual_selection: bool,
    pub operator_alpha_long: Option<String>,
    pub operator_alpha_short: Option<String>,
    pub operator_numeric: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalStrengthBlob {
    pub gsm_signal_strength: i32,
    pub gsm_bit_error_rate: i32,
    pub cdma_dbm: i32,
    pub cdma_ecio: i32,
    pub evdo_dbm: i32,
    pub evdo_ecio: i32,
    pub evdo_snr: i32,
    pub is_gsm: bool,
}

/// Signal strength sampled when the device moved, together with the serving
/// cell at that moment. A superset of [`SignalStrengthBlob`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalStrengthOnLocationChangeBlob {
    #[serde(flatten)]
    pub signal_strength: SignalStrengthBlob,
    pub cell_location: Option<CellLocationBlob>,
    #[serde(default)]
    pub network_type: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelephonyStateBlob {
    pub call_state: i32,
    pub data_activity: i32,
    pub data_state: i32,
    pub network_type: i32,
    pub phone_type: i32,
    pub sim_state: i32,
    pub network_operator: Option<String>,
    pub network_operator_name: Option<String>,
    pub network_country_iso: Option<String>,
    pub sim_operator: Option<String>,
    pub sim_operator_name: Option<String>,
    pub sim_country_iso: Option<String>,
    pub network_roaming: bool,
}
