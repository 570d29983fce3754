use serde::{Deserialize, Serialize};

/// One method's value for a flow: `key` is the contributing method's UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub key: String,
    pub value: Option<f64>,
}

/// A characterization factor as found in a single dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRecord {
    pub ref_object_id: Option<String>,
    pub version: Option<String>,
    pub exchange_direction: Option<String>,
    pub measurement: Measurement,
}

/// Deduplication key. Absent fields take part as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub ref_object_id: Option<String>,
    pub version: Option<String>,
    pub exchange_direction: Option<String>,
}

impl FactorRecord {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            ref_object_id: self.ref_object_id.clone(),
            version: self.version.clone(),
            exchange_direction: self.exchange_direction.clone(),
        }
    }
}

/// A row of the merged table: one identity, every method's measurement for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedFactorEntry {
    pub ref_object_id: Option<String>,
    pub version: Option<String>,
    pub exchange_direction: Option<String>,
    pub measurements: Vec<Measurement>,
}

impl UnifiedFactorEntry {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            ref_object_id: self.ref_object_id.clone(),
            version: self.version.clone(),
            exchange_direction: self.exchange_direction.clone(),
        }
    }
}

impl From<FactorRecord> for UnifiedFactorEntry {
    fn from(record: FactorRecord) -> Self {
        UnifiedFactorEntry {
            ref_object_id: record.ref_object_id,
            version: record.version,
            exchange_direction: record.exchange_direction,
            measurements: vec![record.measurement],
        }
    }
}
