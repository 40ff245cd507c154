use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::MalformedRecordError;
use crate::entries::Location;

/// One decoded log line, before its payload is interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRecord {
    pub timestamp: i64,
    pub identifier: String,
    pub location: Option<Location>,
    payload: Value,
}

// Only the four fields we know about are kept, anything else on the line is
// ignored so that newer clients can add fields.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    identifier: Option<Value>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default, rename = "dataBlob", alias = "payload")]
    data_blob: Option<Value>,
}

impl ParsedRecord {
    pub fn new(
        timestamp: i64,
        identifier: impl Into<String>,
        location: Option<Location>,
        payload: Value,
    ) -> Self {
        Self {
            timestamp,
            identifier: identifier.into(),
            location,
            payload,
        }
    }

    /// Decode one line. Blank lines carry no record and yield `None`.
    pub fn decode(line: &str) -> Result<Option<Self>, MalformedRecordError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let document: Value = serde_json::from_str(line)
            .map_err(|e| MalformedRecordError::new("document", e.to_string()))?;
        if !document.is_object() {
            return Err(MalformedRecordError::new("document", "not a JSON object"));
        }
        let raw: RawRecord = serde_json::from_value(document)
            .map_err(|e| MalformedRecordError::new("document", e.to_string()))?;

        let timestamp = coerce_timestamp(raw.timestamp)?;
        let identifier = coerce_identifier(raw.identifier)?;
        let location = match raw.location {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                decode_document::<Location>(value)
                    .map_err(|e| MalformedRecordError::new("location", e.to_string()))?,
            ),
        };
        let payload = match raw.data_blob {
            None | Some(Value::Null) => {
                return Err(MalformedRecordError::new("dataBlob", "missing"))
            }
            Some(value) => value,
        };

        Ok(Some(Self {
            timestamp,
            identifier,
            location,
            payload,
        }))
    }

    /// Decode the payload under the schema `T`. Can be called more than once on
    /// the same record, each call starts from the raw payload again.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.payload {
            // clients embed the payload as a JSON document inside a string
            Value::String(document) => serde_json::from_str(document),
            value => T::deserialize(value),
        }
    }
}

fn decode_document<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::String(document) => serde_json::from_str(&document),
        value => serde_json::from_value(value),
    }
}

fn coerce_timestamp(value: Option<Value>) -> Result<i64, MalformedRecordError> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| MalformedRecordError::new("timestamp", format!("not an integer: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| MalformedRecordError::new("timestamp", format!("{s:?}: {e}"))),
        Some(other) => Err(MalformedRecordError::new(
            "timestamp",
            format!("unexpected value {other}"),
        )),
        None => Err(MalformedRecordError::new("timestamp", "missing")),
    }
}

fn coerce_identifier(value: Option<Value>) -> Result<String, MalformedRecordError> {
    match value {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Null) | None => Err(MalformedRecordError::new("identifier", "missing")),
        Some(other) => Err(MalformedRecordError::new(
            "identifier",
            format!("unexpected value {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::entries::DataConnectionStateBlob;

    fn decode(line: &str) -> ParsedRecord {
        ParsedRecord::decode(line).unwrap().unwrap()
    }

    fn field_of(line: &str) -> &'static str {
        ParsedRecord::decode(line).unwrap_err().field
    }

    #[test]
    fn decodes_well_formed_line() {
        let record = decode(
            r#"{"timestamp":1000,"identifier":"DataConnectionState","location":{"latitude":1.5,"longitude":2.5,"accuracy":10},"dataBlob":"{\"state\":2,\"networkType\":13}"}"#,
        );
        assert_eq!(record.timestamp, 1000);
        assert_eq!(record.identifier, "DataConnectionState");
        let location = record.location.clone().unwrap();
        assert_eq!(location.latitude, 1.5);
        assert_eq!(location.accuracy, 10.0);
        assert_eq!(
            record.decode_payload::<DataConnectionStateBlob>().unwrap(),
            DataConnectionStateBlob {
                state: 2,
                network_type: 13
            }
        );
    }

    #[test]
    fn payload_can_be_nested_object() {
        let record = decode(
            r#"{"timestamp":1,"identifier":"DataConnectionState","dataBlob":{"state":1}}"#,
        );
        assert_eq!(
            record.decode_payload::<DataConnectionStateBlob>().unwrap().state,
            1
        );
        assert!(record.location.is_none());
    }

    #[test]
    fn ignores_unknown_fields() {
        let record = decode(
            r#"{"timestamp":5,"identifier":"Wifi","dataBlob":"[]","deviceId":"abc","version":3}"#,
        );
        assert_eq!(record.identifier, "Wifi");
    }

    #[test]
    fn coerces_timestamp_from_string() {
        assert_eq!(
            decode(r#"{"timestamp":"1234","identifier":"Wifi","dataBlob":"[]"}"#).timestamp,
            1234
        );
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert_eq!(
            field_of(r#"{"timestamp":"soon","identifier":"Wifi","dataBlob":"[]"}"#),
            "timestamp"
        );
        assert_eq!(
            field_of(r#"{"timestamp":1.5,"identifier":"Wifi","dataBlob":"[]"}"#),
            "timestamp"
        );
        assert_eq!(field_of(r#"{"identifier":"Wifi","dataBlob":"[]"}"#), "timestamp");
    }

    #[test]
    fn rejects_missing_identifier() {
        assert_eq!(field_of(r#"{"timestamp":1,"dataBlob":"[]"}"#), "identifier");
        assert_eq!(
            field_of(r#"{"timestamp":1,"identifier":null,"dataBlob":"[]"}"#),
            "identifier"
        );
    }

    #[test]
    fn rejects_missing_payload() {
        assert_eq!(field_of(r#"{"timestamp":1,"identifier":"Wifi"}"#), "dataBlob");
    }

    #[test]
    fn bad_location_fails_the_line() {
        assert_eq!(
            field_of(r#"{"timestamp":1,"identifier":"Wifi","location":{"latitude":"x"},"dataBlob":"[]"}"#),
            "location"
        );
    }

    #[test]
    fn location_can_be_embedded_string() {
        let record = decode(
            r#"{"timestamp":1,"identifier":"Wifi","location":"{\"latitude\":3.0,\"longitude\":4.0}","dataBlob":"[]"}"#,
        );
        assert_eq!(record.location.unwrap().longitude, 4.0);
    }

    #[test]
    fn blank_lines_have_no_record() {
        assert!(ParsedRecord::decode("").unwrap().is_none());
        assert!(ParsedRecord::decode("   \t").unwrap().is_none());
    }

    #[test]
    fn rejects_non_documents() {
        assert_eq!(field_of("{not json"), "document");
        assert_eq!(field_of("[1,2,3]"), "document");
    }

    #[test]
    fn payload_decodes_under_several_schemas() {
        let record = ParsedRecord::new(1, "Any", None, json!({"state": 4, "extra": true}));
        assert_eq!(
            record.decode_payload::<DataConnectionStateBlob>().unwrap().state,
            4
        );
        assert_eq!(
            record.decode_payload::<serde_json::Value>().unwrap(),
            json!({"state": 4, "extra": true})
        );
    }
}
