//! Console summaries. Everything here only reads results the core returned.

use std::collections::BTreeMap;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::CatalogRun;
use crate::compress::{ArchiveListing, ArchiveOutcome, ArchiveReport};
use crate::pipeline::{DatasetOutcome, PipelineReport};
use crate::utils::{format_size, group_digits, saved_percent};

pub fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

pub fn print_merge(report: &PipelineReport, entries: usize, measurements: usize) {
    for outcome in &report.outcomes {
        match outcome {
            DatasetOutcome::Merged {
                source_id,
                records,
                counts,
                ..
            } => println!(
                "  {}: {} factors ({} merged, {} new)",
                source_id, records, counts.merged, counts.inserted
            ),
            DatasetOutcome::Empty { source_id } => println!("  {}: no factors", source_id),
            DatasetOutcome::Failed { source_id, error } => {
                println!("  {}: FAILED ({})", source_id, error)
            }
        }
    }
    println!(
        "\nMerged {} of {} datasets ({} empty, {} failed)",
        report.processed(),
        report.total(),
        report.empty(),
        report.failed()
    );
    println!("{} unique factors, {} measurements", entries, measurements);
}

pub fn print_archives(report: &ArchiveReport, total: usize) {
    for outcome in &report.outcomes {
        match outcome {
            ArchiveOutcome::Written {
                file_name,
                original,
                compressed,
            } => println!(
                "  {}: {} -> {} bytes ({:.1}% smaller)",
                file_name,
                group_digits(*original),
                group_digits(*compressed),
                saved_percent(*original, *compressed)
            ),
            ArchiveOutcome::AlreadyExists { file_name } => {
                println!("  {}: exists, skipped", file_name)
            }
            ArchiveOutcome::Failed { source_id, error } => {
                println!("  {}: FAILED ({:#})", source_id, error)
            }
        }
    }
    println!("\n{}", "=".repeat(50));
    println!("Processed: {}", report.written());
    println!("Skipped:   {}", report.skipped());
    println!("Errors:    {}", report.failed());
    println!("Total:     {}", total);
}

pub fn print_listing(listings: &[ArchiveListing]) {
    println!("\nArchives ({}):", listings.len());
    println!("{}", "-".repeat(60));
    let mut total = 0u64;
    for l in listings {
        total += l.size;
        match &l.id_version {
            Some((id, version)) => println!(
                "{}\n  UUID: {}\n  Version: {}\n  Size: {} bytes",
                l.file_name,
                id,
                version,
                group_digits(l.size)
            ),
            None => println!("{} (unexpected file name)", l.file_name),
        }
    }
    println!(
        "\nTotal size: {} bytes ({:.2} MB)",
        group_digits(total),
        total as f64 / 1024.0 / 1024.0
    );
}

pub fn print_catalog(run: &CatalogRun) {
    for name in &run.notes.not_found {
        println!("  listed in order file but not found: {}", name);
    }
    for name in &run.notes.appended {
        println!("  not in order file, appended: {}", name);
    }
    for (id, error) in &run.failed {
        println!("  {}: FAILED ({:#})", id, error);
    }
    println!("\nCataloged: {}", run.cataloged());
    println!("Errors:    {}", run.failed.len());
    println!("Original:  {}", format_size(run.original_bytes));
    println!("Archived:  {}", format_size(run.compressed_bytes));
    if run.original_bytes > 0 && run.compressed_bytes > 0 {
        println!(
            "Saved:     {}%",
            saved_percent(run.original_bytes, run.compressed_bytes).trunc() as i64
        );
    }
}

pub fn print_model_counts(counts: &BTreeMap<String, usize>) {
    println!("\nImpact models:");
    for (model, n) in counts {
        println!("  {}: {}", model, n);
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
