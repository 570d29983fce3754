use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::ProgressBar;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

use crate::dataset::DatasetSource;
use crate::extract::metadata::dataset_version;

/// `<uuid>_<version>.json.gz`
pub fn archive_name(uuid: &str, version: &str) -> String {
    format!("{}_{}.json.gz", uuid, version)
}

/// Split an archive file name back into `(uuid, version)`.
pub fn parse_archive_name(name: &str) -> Option<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^([^_]+)_(.+)\.json\.gz$").expect("archive name pattern is valid")
    });
    let caps = re.captures(name)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

#[derive(Debug)]
pub enum ArchiveOutcome {
    Written {
        file_name: String,
        original: u64,
        compressed: u64,
    },
    AlreadyExists {
        file_name: String,
    },
    Failed {
        source_id: String,
        error: anyhow::Error,
    },
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub outcomes: Vec<ArchiveOutcome>,
}

impl ArchiveReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArchiveOutcome::Written { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArchiveOutcome::AlreadyExists { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ArchiveOutcome::Failed { .. }))
            .count()
    }
}

/// Gzip one dataset into `target_dir` under its versioned archive name.
/// An archive that already exists is left alone.
pub fn archive_one(source: &DatasetSource, target_dir: &Path) -> Result<ArchiveOutcome> {
    let raw = std::fs::read(&source.path)
        .with_context(|| format!("Failed to read {}", source.path.display()))?;
    let doc: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid JSON in {}", source.path.display()))?;
    let Some(version) = dataset_version(&doc) else {
        bail!("No dataSetVersion in {}", source.path.display());
    };

    let file_name = archive_name(&source.id, &version);
    let target = target_dir.join(&file_name);
    if target.exists() {
        debug!("Archive exists, skipping: {}", file_name);
        return Ok(ArchiveOutcome::AlreadyExists { file_name });
    }

    let file =
        File::create(&target).with_context(|| format!("Failed to create {}", target.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&raw)?;
    encoder.finish()?;

    let compressed = std::fs::metadata(&target)?.len();
    Ok(ArchiveOutcome::Written {
        file_name,
        original: raw.len() as u64,
        compressed,
    })
}

/// Archive every source. Per-dataset failures are recorded, not raised.
pub fn archive_all(
    sources: &[DatasetSource],
    target_dir: &Path,
    pb: &ProgressBar,
) -> Result<ArchiveReport> {
    std::fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create {}", target_dir.display()))?;

    let outcomes = sources
        .par_iter()
        .map(|source| {
            let outcome = archive_one(source, target_dir).unwrap_or_else(|error| {
                warn!("Archiving {} failed: {:#}", source.id, error);
                ArchiveOutcome::Failed {
                    source_id: source.id.clone(),
                    error,
                }
            });
            pb.inc(1);
            outcome
        })
        .collect();
    Ok(ArchiveReport { outcomes })
}

/// An archive found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveListing {
    pub file_name: String,
    pub path: PathBuf,
    /// `None` when the file name does not follow `<uuid>_<version>.json.gz`.
    pub id_version: Option<(String, String)>,
    pub size: u64,
}

/// All `*.gz` files in `dir`, sorted by name.
pub fn list_archives(dir: &Path) -> Result<Vec<ArchiveListing>> {
    let pattern = dir.join("*.gz");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Non UTF-8 archive directory: {}", dir.display()))?;

    let mut listings = Vec::new();
    for path in glob::glob(pattern)?.filter_map(|p| p.ok()) {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let size = std::fs::metadata(&path)?.len();
        listings.push(ArchiveListing {
            id_version: parse_archive_name(&file_name),
            file_name,
            path,
            size,
        });
    }
    listings.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(listings)
}
