use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{Bson, Document};

use crate::errors::{Error, Result};

/// Document keys that identify a reading rather than carry sensor values.
const META_KEYS: [&str; 4] = ["_id", "topic", "asset_uid", "timestamp"];

/// One timestamped sensor document in canonical form. Readings are
/// produced externally; this system only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub topic: String,
    pub asset_uid: String,
    pub timestamp: DateTime<Utc>,
    pub fields: HashMap<String, f64>,
}

impl SensorReading {
    /// Decodes a stored document, absorbing the layouts the collection
    /// holds in the wild: timestamps as BSON datetimes, epoch-second
    /// strings, or epoch-second numbers; metric fields either at the top
    /// level or nested under a `payload` subdocument (payload entries win
    /// on key collision); values as doubles, ints, or numeric strings.
    /// Null or non-numeric values are treated as missing.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let topic = doc
            .get_str("topic")
            .map_err(|_| Error::Decode("missing topic".to_string()))?
            .to_string();
        let asset_uid = doc
            .get_str("asset_uid")
            .map_err(|_| Error::Decode("missing asset_uid".to_string()))?
            .to_string();
        let timestamp = decode_timestamp(doc.get("timestamp"))?;

        let mut fields = HashMap::new();
        for (key, value) in doc.iter() {
            if META_KEYS.contains(&key.as_str()) || key == "payload" {
                continue;
            }
            if let Some(v) = coerce_numeric(value) {
                fields.insert(key.clone(), v);
            }
        }
        if let Ok(payload) = doc.get_document("payload") {
            for (key, value) in payload.iter() {
                if let Some(v) = coerce_numeric(value) {
                    fields.insert(key.clone(), v);
                }
            }
        }

        Ok(Self {
            topic,
            asset_uid,
            timestamp,
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

fn decode_timestamp(value: Option<&Bson>) -> Result<DateTime<Utc>> {
    match value {
        Some(Bson::DateTime(dt)) => Ok(dt.to_chrono()),
        Some(Bson::String(s)) => {
            let secs: i64 = s.trim().parse().map_err(|_| {
                Error::Decode(format!("unparseable timestamp string {:?}", s))
            })?;
            epoch_seconds(secs)
        }
        Some(Bson::Int64(secs)) => epoch_seconds(*secs),
        Some(Bson::Int32(secs)) => epoch_seconds(i64::from(*secs)),
        Some(other) => Err(Error::Decode(format!(
            "unsupported timestamp type: {:?}",
            other
        ))),
        None => Err(Error::Decode("missing timestamp".to_string())),
    }
}

fn epoch_seconds(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| Error::Decode(format!("epoch seconds {} out of range", secs)))
}

fn coerce_numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
