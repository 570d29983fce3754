use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::compress::archive_name;
use crate::dataset::DatasetSource;
use crate::extract::metadata::MethodInfo;
use crate::output::to_pretty_json;
use crate::utils::{format_size, saved_percent};

const CATALOG_DESCRIPTION: &str = "LCIA Methods compressed files list";
const CATALOG_FORMAT: &str = "gzip compressed JSON";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub description: String,
    pub total_files: usize,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub filename: String,
    pub id: String,
    pub version: String,
    pub size: String,
    pub description: Value,
    pub impact_model: String,
}

/// The `list.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub files: Vec<CatalogEntry>,
}

/// A catalog plus what went sideways while building it.
#[derive(Debug, Default)]
pub struct CatalogBuild {
    pub entries: Vec<CatalogEntry>,
    pub failed: Vec<(String, anyhow::Error)>,
    pub missing_archives: Vec<String>,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

/// Where the order file disagrees with what was found.
#[derive(Debug, Default, PartialEq)]
pub struct OrderNotes {
    /// Named in the order file, but no such entry.
    pub not_found: Vec<String>,
    /// Found, but not named in the order file.
    pub appended: Vec<String>,
}

/// Describe each dataset and size it against its archive in `archive_dir`.
pub fn collect_entries(sources: &[DatasetSource], archive_dir: &Path) -> CatalogBuild {
    let mut build = CatalogBuild::default();
    for source in sources {
        match describe_one(source, archive_dir) {
            Ok((entry, original, compressed)) => {
                build.original_bytes += original;
                match compressed {
                    Some(c) => build.compressed_bytes += c,
                    None => {
                        warn!("No archive for {}: {}", source.id, entry.filename);
                        build.missing_archives.push(entry.filename.clone());
                    }
                }
                build.entries.push(entry);
            }
            Err(error) => {
                warn!("Cannot describe {}: {:#}", source.id, error);
                build.failed.push((source.id.clone(), error));
            }
        }
    }
    build
}

fn describe_one(
    source: &DatasetSource,
    archive_dir: &Path,
) -> Result<(CatalogEntry, u64, Option<u64>)> {
    let doc = source.load()?;
    let info = MethodInfo::from_doc(&doc);
    let original = source.size_bytes()?;

    let filename = archive_name(&source.id, &info.version);
    let compressed = std::fs::metadata(archive_dir.join(&filename))
        .ok()
        .map(|m| m.len());
    let size = format_size(compressed.unwrap_or(original));

    let entry = CatalogEntry {
        filename,
        id: source.id.clone(),
        version: info.version,
        size,
        description: info.description,
        impact_model: info.impact_model,
    };
    Ok((entry, original, compressed))
}

/// Order-file entries first, in file order; the rest sorted by file name.
pub fn order_entries(
    entries: Vec<CatalogEntry>,
    order: Option<&[String]>,
) -> (Vec<CatalogEntry>, OrderNotes) {
    let mut by_name: BTreeMap<String, CatalogEntry> = entries
        .into_iter()
        .map(|e| (e.filename.clone(), e))
        .collect();
    let mut notes = OrderNotes::default();
    let mut ordered = Vec::with_capacity(by_name.len());

    if let Some(order) = order {
        for name in order {
            match by_name.remove(name) {
                Some(entry) => ordered.push(entry),
                None => notes.not_found.push(name.clone()),
            }
        }
        notes.appended = by_name.keys().cloned().collect();
    }
    ordered.extend(by_name.into_values());
    (ordered, notes)
}

/// A written-ready catalog and the tally behind it.
#[derive(Debug)]
pub struct CatalogRun {
    pub catalog: Catalog,
    pub notes: OrderNotes,
    pub failed: Vec<(String, anyhow::Error)>,
    pub missing_archives: Vec<String>,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

impl CatalogRun {
    pub fn cataloged(&self) -> usize {
        self.catalog.files.len()
    }
}

/// Describe, order and total every source into one catalog.
pub fn assemble(
    sources: &[DatasetSource],
    archive_dir: &Path,
    order: Option<&[String]>,
) -> CatalogRun {
    let build = collect_entries(sources, archive_dir);
    let (files, notes) = order_entries(build.entries, order);
    let catalog = build_catalog(
        sources.len(),
        files,
        build.original_bytes,
        build.compressed_bytes,
    );
    CatalogRun {
        catalog,
        notes,
        failed: build.failed,
        missing_archives: build.missing_archives,
        original_bytes: build.original_bytes,
        compressed_bytes: build.compressed_bytes,
    }
}

pub fn build_catalog(
    total_files: usize,
    files: Vec<CatalogEntry>,
    original_bytes: u64,
    compressed_bytes: u64,
) -> Catalog {
    let mut metadata = CatalogMetadata {
        description: CATALOG_DESCRIPTION.to_string(),
        total_files,
        format: CATALOG_FORMAT.to_string(),
        compression_ratio: None,
        original_size: None,
        total_size: None,
    };
    if original_bytes > 0 && compressed_bytes > 0 {
        let ratio = saved_percent(original_bytes, compressed_bytes).trunc() as i64;
        metadata.compression_ratio = Some(format!("{}%", ratio));
        metadata.original_size = Some(format_size(original_bytes));
        metadata.total_size = Some(format_size(compressed_bytes));
    }
    Catalog { metadata, files }
}

/// One file name per line; blank lines ignored. `None` if the file is absent.
pub fn read_order_file(path: &Path) -> Result<Option<Vec<String>>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_pretty_json(catalog)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Catalog with {} files written to {}", catalog.files.len(), path.display());
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Number of catalog files per impact model.
pub fn model_counts(catalog: &Catalog) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for file in &catalog.files {
        *counts.entry(file.impact_model.clone()).or_insert(0) += 1;
    }
    counts
}
