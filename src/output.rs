use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::model::UnifiedFactorEntry;

/// Pretty JSON with 4-space indents; non-ASCII text is written as-is.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .context("Failed to serialize JSON")?;
    Ok(buf)
}

pub fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn gunzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .context("Failed to decompress gzip data")?;
    Ok(out)
}

/// Write `data` to `path` and a gzip copy to `gz_path`, replacing both.
pub fn write_with_gzip(path: &Path, gz_path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;

    let file =
        File::create(gz_path).with_context(|| format!("Failed to create {}", gz_path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(data)
        .with_context(|| format!("Failed to write {}", gz_path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finish {}", gz_path.display()))?;
    Ok(())
}

/// Serialize the merged table and persist it (plain + gzip).
pub fn write_merged(entries: &[UnifiedFactorEntry], path: &Path, gz_path: &Path) -> Result<usize> {
    let json = to_pretty_json(entries)?;
    write_with_gzip(path, gz_path, &json)?;
    info!(
        "Wrote {} factors to {} and {}",
        entries.len(),
        path.display(),
        gz_path.display()
    );
    Ok(json.len())
}

/// Load a merged table from either the plain file or its `.gz` copy.
pub fn read_merged(path: &Path) -> Result<Vec<UnifiedFactorEntry>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let entries = if path.extension().is_some_and(|ext| ext == "gz") {
        serde_json::from_reader(GzDecoder::new(reader))
    } else {
        serde_json::from_reader(reader)
    };
    entries.with_context(|| format!("Failed to parse {}", path.display()))
}

/// Counts over a loaded merged table.
#[derive(Debug, Default, PartialEq)]
pub struct TableStats {
    pub identities: usize,
    pub measurements: usize,
    pub methods: usize,
    pub null_values: usize,
}

impl TableStats {
    pub fn from_entries(entries: &[UnifiedFactorEntry]) -> Self {
        let methods: BTreeSet<&str> = entries
            .iter()
            .flat_map(|e| e.measurements.iter().map(|m| m.key.as_str()))
            .collect();
        let all = entries.iter().flat_map(|e| &e.measurements);
        Self {
            identities: entries.len(),
            measurements: all.clone().count(),
            methods: methods.len(),
            null_values: all.filter(|m| m.value.is_none()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measurement;

    fn sample() -> Vec<UnifiedFactorEntry> {
        vec![
            UnifiedFactorEntry {
                ref_object_id: Some("flow1".into()),
                version: Some("v1".into()),
                exchange_direction: Some("Input".into()),
                measurements: vec![
                    Measurement { key: "u1".into(), value: Some(0.5) },
                    Measurement { key: "u2".into(), value: None },
                ],
            },
            UnifiedFactorEntry {
                ref_object_id: Some("二氧化碳".into()),
                version: None,
                exchange_direction: None,
                measurements: vec![Measurement { key: "u1".into(), value: Some(1.0) }],
            },
        ]
    }

    #[test]
    fn json_shape_and_field_names() {
        let text = String::from_utf8(to_pretty_json(&sample()).unwrap()).unwrap();
        assert!(text.starts_with("[\n    {\n        \"refObjectId\": \"flow1\","));
        assert!(text.contains("\"exchangeDirection\": \"Input\""));
        assert!(text.contains("\"key\": \"u2\",\n                \"value\": null"));
        assert!(text.contains("\"version\": null"));
        assert!(text.contains("二氧化碳"));
    }

    #[test]
    fn gzip_round_trip_is_exact() {
        let json = to_pretty_json(&sample()).unwrap();
        let packed = gzip_bytes(&json).unwrap();
        assert_ne!(packed, json);
        assert_eq!(gunzip_bytes(&packed).unwrap(), json);
    }

    #[test]
    fn written_files_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/flow_factors.json");
        let gz = dir.path().join("out/flow_factors.json.gz");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        write_merged(&sample(), &path, &gz).unwrap();

        let plain = std::fs::read(&path).unwrap();
        let unpacked = gunzip_bytes(&std::fs::read(&gz).unwrap()).unwrap();
        assert_eq!(plain, unpacked);
        assert_eq!(read_merged(&path).unwrap(), sample());
        assert_eq!(read_merged(&gz).unwrap(), sample());
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("nested/out.json");
        assert!(write_merged(&sample(), &path, &blocker.join("out.json.gz")).is_err());
    }

    #[test]
    fn integral_values_keep_a_decimal_point() {
        let text = String::from_utf8(to_pretty_json(&sample()).unwrap()).unwrap();
        assert!(text.contains("\"value\": 1.0\n"));
        assert!(!text.contains("\"value\": 1\n"));
        assert_eq!(read_merged_value(&text), Some(1.0));
    }

    fn read_merged_value(text: &str) -> Option<f64> {
        let entries: Vec<UnifiedFactorEntry> = serde_json::from_str(text).unwrap();
        entries[1].measurements[0].value
    }

    #[test]
    fn table_stats_count_everything() {
        let stats = TableStats::from_entries(&sample());
        assert_eq!(
            stats,
            TableStats { identities: 2, measurements: 3, methods: 2, null_values: 1 }
        );
        assert_eq!(TableStats::from_entries(&[]), TableStats::default());
    }
}
