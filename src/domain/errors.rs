// ============================================================
// Layer 3 — Pipeline Error Taxonomy
// ============================================================
// Every failure mode of the pipeline is a variant here, so
// callers can match on the kind instead of parsing strings.
// The application layer wraps these in anyhow for context;
// library code propagates them with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or mismatched input columns. Fatal, no recovery.
    #[error("schema error: {0}")]
    Schema(String),

    /// A unit is shorter than the window length. Individual units are
    /// excluded from windowing; this is fatal only when no unit remains.
    #[error("insufficient length: {0}")]
    InsufficientLength(String),

    /// Feature columns differ between a table and fitted scaler params.
    #[error("column mismatch: {0}")]
    ColumnMismatch(String),

    /// Normalization fit was attempted on a table with zero rows.
    #[error("cannot fit normalization parameters on an empty table")]
    EmptyTable,

    /// Dataset access outside `[0, length())`. A programming-contract
    /// violation, not a data problem.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Checkpoint structural dimensions do not match the instantiated model.
    #[error("checkpoint architecture mismatch: {0}")]
    IncompatibleArchitecture(String),

    /// Any persistence failure (missing path, full disk, corrupt blob).
    /// The atomic-swap write discipline guarantees no partial state remains.
    #[error("persistence failure at '{path}': {detail}")]
    Persistence { path: String, detail: String },

    /// The training loop observed a NaN or infinite loss. The run halts
    /// rather than continuing with corrupted state.
    #[error("non-finite training loss at epoch {epoch}")]
    NonFiniteLoss { epoch: usize },
}

impl PipelineError {
    /// Build a Persistence error from any displayable cause.
    pub fn persistence(path: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path:   path.into(),
            detail: detail.to_string(),
        }
    }
}
