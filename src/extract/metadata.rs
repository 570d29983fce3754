use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

const MODEL_NAME: &str = "/LCIAMethodDataSet/LCIAMethodInformation/impactModel/modelName";
const NAME: &str = "/LCIAMethodDataSet/LCIAMethodInformation/dataSetInformation/common:name";
const DATASET_VERSION: &str =
    "/LCIAMethodDataSet/administrativeInformation/publicationAndOwnership/common:dataSetVersion";

/// `dataSetVersion`, if present and non-empty.
pub fn dataset_version(doc: &Value) -> Option<String> {
    non_empty_str(doc.pointer(DATASET_VERSION))
}

pub fn model_name(doc: &Value) -> Option<String> {
    non_empty_str(doc.pointer(MODEL_NAME))
}

/// The method's `common:name` exactly as the dataset stores it (often a
/// multilingual structure), or "Unknown".
pub fn description(doc: &Value) -> Value {
    match doc.pointer(NAME) {
        Some(v) if is_truthy(v) => v.clone(),
        _ => Value::String(UNKNOWN.to_string()),
    }
}

/// Everything the catalog needs to know about one method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub version: String,
    pub description: Value,
    pub impact_model: String,
}

impl MethodInfo {
    pub fn from_doc(doc: &Value) -> Self {
        MethodInfo {
            version: dataset_version(doc).unwrap_or_else(|| UNKNOWN.to_string()),
            description: description(doc),
            impact_model: model_name(doc).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_method_info() {
        let raw = std::fs::read_to_string("tests/fixtures/method_u1.json").unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        let info = MethodInfo::from_doc(&doc);
        assert_eq!(info.version, "01.00.000");
        assert_eq!(info.impact_model, "IPCC 2021");
        assert_eq!(
            info.description["baseName"][0]["#text"],
            json!("Climate change")
        );
    }

    #[test]
    fn missing_or_misshapen_fields_are_unknown() {
        let doc = json!({
            "LCIAMethodDataSet": {
                "LCIAMethodInformation": { "impactModel": "flat string", "dataSetInformation": { "common:name": {} } },
                "administrativeInformation": { "publicationAndOwnership": { "common:dataSetVersion": "" } }
            }
        });
        let info = MethodInfo::from_doc(&doc);
        assert_eq!(info.version, UNKNOWN);
        assert_eq!(info.impact_model, UNKNOWN);
        assert_eq!(info.description, json!(UNKNOWN));
        assert_eq!(dataset_version(&json!([1, 2])), None);
    }
}
