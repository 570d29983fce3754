use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DatasetError;

/// One method dataset on disk, identified by its filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub id: String,
    pub path: PathBuf,
}

impl DatasetSource {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let id = path.file_stem()?.to_str()?.to_string();
        Some(DatasetSource { id, path })
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<Value, DatasetError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| DatasetError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| DatasetError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn size_bytes(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .len())
    }
}

/// Every `*.json` directly under `dir`, sorted by path so merges are reproducible.
pub fn discover(dir: &Path) -> Result<Vec<DatasetSource>> {
    let pattern = dir.join("*.json");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Non UTF-8 dataset directory: {}", dir.display()))?;

    let mut sources = Vec::new();
    for entry in glob::glob(pattern).context("Invalid dataset glob pattern")? {
        match entry {
            Ok(path) if path.is_file() => match DatasetSource::from_path(path) {
                Some(source) => sources.push(source),
                None => warn!("Skipping dataset with unusable file name"),
            },
            Ok(path) => debug!("Skipping non-file {}", path.display()),
            Err(e) => warn!("Unreadable directory entry: {}", e),
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-uuid.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a-uuid.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let found = discover(dir.path()).unwrap();
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a-uuid", "b-uuid"]);
    }

    #[test]
    fn load_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let source = DatasetSource::from_path(path).unwrap();
        assert!(matches!(source.load(), Err(DatasetError::Parse { .. })));
    }

    #[test]
    fn load_reports_missing_file() {
        let source = DatasetSource::from_path(PathBuf::from("/nonexistent/x.json")).unwrap();
        assert!(matches!(source.load(), Err(DatasetError::Read { .. })));
    }
}
