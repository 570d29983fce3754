use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::dataset::DatasetSource;
use crate::error::DatasetError;
use crate::extract::factors::{extract_dataset, ExtractedDataset};
use crate::merge::{MergeCounts, MergeTable};
use crate::output::write_merged;

/// How a single dataset fared during a run.
#[derive(Debug)]
pub enum DatasetOutcome {
    Merged {
        source_id: String,
        method_id: String,
        records: usize,
        counts: MergeCounts,
    },
    Empty {
        source_id: String,
    },
    Failed {
        source_id: String,
        error: DatasetError,
    },
}

/// Per-dataset outcomes in merge order.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub outcomes: Vec<DatasetOutcome>,
}

impl PipelineReport {
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, DatasetOutcome::Merged { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, DatasetOutcome::Empty { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DatasetOutcome::Failed { .. }))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, f: impl Fn(&DatasetOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(o)).count()
    }
}

/// A dataset's id paired with what extraction made of it.
pub type Extraction = (String, Result<ExtractedDataset, DatasetError>);

pub struct PipelineOutput {
    pub table: MergeTable,
    pub report: PipelineReport,
}

/// Extract every source, then merge them in the order given.
pub fn run(sources: &[DatasetSource], threads: usize, pb: &ProgressBar) -> Result<PipelineOutput> {
    let extracted = extract_all(sources, threads, pb)?;
    Ok(merge_extracted(extracted))
}

/// What a merge run left on disk.
pub struct MergeSummary {
    pub report: PipelineReport,
    pub entries: usize,
    pub measurements: usize,
    pub bytes: usize,
}

/// Run the pipeline and replace `path` and `gz_path` with the merged table.
/// With no sources the table is empty and `[]` is still written.
pub fn run_to_files(
    sources: &[DatasetSource],
    threads: usize,
    pb: &ProgressBar,
    path: &Path,
    gz_path: &Path,
) -> Result<MergeSummary> {
    let out = run(sources, threads, pb)?;
    let entries = out.table.len();
    let measurements = out.table.measurement_count();
    let bytes = write_merged(&out.table.into_entries(), path, gz_path)?;
    Ok(MergeSummary {
        report: out.report,
        entries,
        measurements,
        bytes,
    })
}

/// Parallel extraction; the result keeps the order of `sources`.
pub fn extract_all(
    sources: &[DatasetSource],
    threads: usize,
    pb: &ProgressBar,
) -> Result<Vec<Extraction>> {
    let work = || -> Vec<Extraction> {
        sources
            .par_iter()
            .map(|source| {
                let result = extract_dataset(source);
                pb.inc(1);
                (source.id.clone(), result)
            })
            .collect()
    };

    if threads == 0 {
        return Ok(work());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build extraction thread pool")?;
    Ok(pool.install(work))
}

/// Sequential merge in input order. A failed or empty dataset adds nothing.
pub fn merge_extracted(extracted: Vec<Extraction>) -> PipelineOutput {
    let mut table = MergeTable::new();
    let mut report = PipelineReport::default();

    for (source_id, result) in extracted {
        let outcome = match result {
            Err(error) => {
                warn!("Extraction failed for {}: {}", source_id, error);
                DatasetOutcome::Failed { source_id, error }
            }
            Ok(data) if data.records.is_empty() => {
                debug!("No factors in {}", source_id);
                DatasetOutcome::Empty { source_id }
            }
            Ok(data) => {
                let records = data.records.len();
                let counts = table.merge_all(data.records);
                debug!(
                    "Merged {}: {} existing, {} new",
                    source_id, counts.merged, counts.inserted
                );
                DatasetOutcome::Merged {
                    source_id,
                    method_id: data.method_id,
                    records,
                    counts,
                }
            }
        };
        report.outcomes.push(outcome);
    }

    info!(
        "Merged {} datasets into {} unique factors ({} empty, {} failed)",
        report.processed(),
        table.len(),
        report.empty(),
        report.failed()
    );
    PipelineOutput { table, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdentityKey, Measurement};
    use std::path::{Path, PathBuf};

    fn fixture_source(name: &str) -> DatasetSource {
        DatasetSource::from_path(PathBuf::from(format!("tests/fixtures/{}.json", name))).unwrap()
    }

    fn copy_fixtures(dir: &Path, names: &[(&str, &str)]) {
        for (fixture, target) in names {
            std::fs::copy(
                format!("tests/fixtures/{}.json", fixture),
                dir.join(format!("{}.json", target)),
            )
            .unwrap();
        }
    }

    #[test]
    fn merges_methods_in_order() {
        let sources = vec![
            fixture_source("method_u1"),
            fixture_source("method_empty"),
            fixture_source("method_u2"),
        ];
        let out = run(&sources, 0, &ProgressBar::hidden()).unwrap();

        assert_eq!(out.report.processed(), 2);
        assert_eq!(out.report.empty(), 1);
        assert_eq!(out.report.failed(), 0);
        assert_eq!(out.table.len(), 2);

        let first = &out.table.entries()[0];
        assert_eq!(first.ref_object_id.as_deref(), Some("flow1"));
        assert_eq!(
            first.measurements,
            vec![
                Measurement { key: "u1".into(), value: Some(0.5) },
                Measurement { key: "u2".into(), value: Some(0.7) },
            ]
        );
        assert_eq!(out.table.entries()[1].ref_object_id.as_deref(), Some("flow2"));
    }

    #[test]
    fn bad_dataset_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(dir.path(), &[("method_u1", "a"), ("method_u2", "c")]);
        std::fs::write(dir.path().join("b.json"), "[1, 2").unwrap();

        let sources = crate::dataset::discover(dir.path()).unwrap();
        let out = run(&sources, 2, &ProgressBar::hidden()).unwrap();

        assert_eq!(out.report.total(), 3);
        assert_eq!(out.report.failed(), 1);
        assert!(matches!(
            &out.report.outcomes[1],
            DatasetOutcome::Failed { source_id, error: DatasetError::Parse { .. } } if source_id == "b"
        ));
        assert_eq!(out.table.measurement_count(), 3);
    }

    #[test]
    fn repeated_runs_give_identical_order() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(
            dir.path(),
            &[("method_u2", "z"), ("method_u1", "m"), ("method_empty", "a")],
        );
        let sources = crate::dataset::discover(dir.path()).unwrap();

        let keys = |threads| -> Vec<IdentityKey> {
            run(&sources, threads, &ProgressBar::hidden())
                .unwrap()
                .table
                .entries()
                .iter()
                .map(|e| e.identity())
                .collect()
        };
        let first = keys(1);
        assert_eq!(first, keys(4));
        assert_eq!(first, keys(0));
        // "m" (u1) sorts before "z" (u2), so u1's flows lead.
        assert_eq!(first[0].ref_object_id.as_deref(), Some("flow1"));
        assert_eq!(first[1].ref_object_id.as_deref(), Some("flow2"));
    }

    #[test]
    fn no_sources_no_entries() {
        let out = run(&[], 0, &ProgressBar::hidden()).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.report.total(), 0);
    }

    #[test]
    fn empty_run_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow_factors.json");
        let gz = dir.path().join("flow_factors.json.gz");

        let sources = vec![fixture_source("method_u1")];
        let first = run_to_files(&sources, 0, &ProgressBar::hidden(), &path, &gz).unwrap();
        assert_eq!(first.entries, 2);
        assert_eq!(first.measurements, 2);

        let second = run_to_files(&[], 0, &ProgressBar::hidden(), &path, &gz).unwrap();
        assert_eq!(second.entries, 0);
        assert_eq!(second.report.total(), 0);
        assert_eq!(std::fs::read(&path).unwrap(), b"[]");
        let unpacked = crate::output::gunzip_bytes(&std::fs::read(&gz).unwrap()).unwrap();
        assert_eq!(unpacked, b"[]");
        assert_eq!(second.bytes, 2);
    }
}
