use std::path::PathBuf;

/// Why a single dataset contributed nothing to the merge.
///
/// None of these abort a run; the pipeline counts them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected an object at `{path}`")]
    UnexpectedShape { path: String },

    #[error("factor #{index} is not an object")]
    MalformedFactor { index: usize },
}
