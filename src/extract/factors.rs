use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::descend;
use crate::dataset::DatasetSource;
use crate::error::DatasetError;
use crate::model::{FactorRecord, Measurement};

const METHOD_UUID_PATH: [&str; 4] = [
    "LCIAMethodDataSet",
    "LCIAMethodInformation",
    "dataSetInformation",
    "common:UUID",
];
const FACTOR_PATH: [&str; 3] = ["LCIAMethodDataSet", "characterisationFactors", "factor"];

/// Records pulled out of one dataset, tagged with the dataset they came from.
#[derive(Debug, Clone)]
pub struct ExtractedDataset {
    pub source_id: String,
    pub method_id: String,
    pub records: Vec<FactorRecord>,
}

/// The factor listing comes either as a lone object or as an array of them.
enum FactorContainer<'a> {
    One(&'a Map<String, Value>),
    Many(&'a [Value]),
    Unsupported(&'static str),
}

impl<'a> FactorContainer<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => FactorContainer::One(map),
            Value::Array(items) => FactorContainer::Many(items),
            Value::Null => FactorContainer::Unsupported("null"),
            Value::Bool(_) => FactorContainer::Unsupported("bool"),
            Value::Number(_) => FactorContainer::Unsupported("number"),
            Value::String(_) => FactorContainer::Unsupported("string"),
        }
    }

    /// Uniform view over the factor objects.
    fn objects(self) -> Result<Vec<&'a Map<String, Value>>, DatasetError> {
        match self {
            FactorContainer::One(map) => Ok(vec![map]),
            FactorContainer::Many(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_object()
                        .ok_or(DatasetError::MalformedFactor { index })
                })
                .collect(),
            FactorContainer::Unsupported(_) => Ok(Vec::new()),
        }
    }
}

/// Load `source` and extract its characterization factors.
pub fn extract_dataset(source: &DatasetSource) -> Result<ExtractedDataset, DatasetError> {
    let doc = source.load()?;
    let method_id = method_uuid(&doc)?.unwrap_or_else(|| source.id.clone());
    let records = extract_factors(&doc, &method_id)?;
    Ok(ExtractedDataset {
        source_id: source.id.clone(),
        method_id,
        records,
    })
}

/// The UUID the document declares for itself, if it declares one.
pub fn method_uuid(doc: &Value) -> Result<Option<String>, DatasetError> {
    Ok(descend(doc, &METHOD_UUID_PATH)?
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// One record per factor object; every measurement is keyed by `method_id`.
pub fn extract_factors(doc: &Value, method_id: &str) -> Result<Vec<FactorRecord>, DatasetError> {
    let Some(container) = descend(doc, &FACTOR_PATH)? else {
        return Ok(Vec::new());
    };

    let container = FactorContainer::classify(container);
    if let FactorContainer::Unsupported(kind) = &container {
        warn!(
            method = method_id,
            "factor container is a {}, not an object or array; no factors taken", kind
        );
    }

    Ok(container
        .objects()?
        .into_iter()
        .map(|factor| to_record(factor, method_id))
        .collect())
}

fn to_record(factor: &Map<String, Value>, method_id: &str) -> FactorRecord {
    let flow_ref = match factor.get("referenceToFlowDataSet") {
        Some(Value::Object(map)) => Some(map),
        Some(Value::Null) | None => None,
        Some(other) => {
            debug!(method = method_id, "referenceToFlowDataSet is not an object: {}", other);
            None
        }
    };

    FactorRecord {
        ref_object_id: flow_ref.and_then(|r| string_field(r, "@refObjectId")),
        version: flow_ref.and_then(|r| string_field(r, "@version")),
        exchange_direction: string_field(factor, "exchangeDirection"),
        measurement: Measurement {
            key: method_id.to_string(),
            value: mean_value(factor.get("meanValue")),
        },
    }
}

/// Numbers and booleans keep their JSON text, so `"@version": 3` still
/// identifies the flow. Objects and arrays carry no usable value.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        scalar @ (Value::Number(_) | Value::Bool(_)) => {
            debug!("{} is not a string, using {}", key, scalar);
            Some(scalar.to_string())
        }
        other => {
            debug!("{} is not a scalar, treating as null: {}", key, other);
            None
        }
    }
}

/// Mean values show up both as JSON numbers and as numeric strings.
fn mean_value(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
