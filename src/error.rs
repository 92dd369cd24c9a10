//! Internal decode-path error taxonomy (spec.md §7).
//!
//! Nothing here is meant to reach the application boundary as a hard
//! failure — every variant is logged via `tracing::warn!` and the
//! enclosing block or field is dropped. `eyre::Result` is reserved for
//! the ambient layer (CLI, directory walk, output writing) where a
//! failure really does mean the run can't continue.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{artifact}: structural corruption: {detail}")]
    StructuralCorruption { artifact: PathBuf, detail: String },

    #[error("{artifact}: semantic violation on tag {tag}: {detail}")]
    SemanticViolation { artifact: PathBuf, tag: u32, detail: String },

    #[error("{artifact}: I/O failure: {source}")]
    Io { artifact: PathBuf, source: std::io::Error },
}

impl DecodeError {
    pub fn log(&self) {
        match self {
            DecodeError::StructuralCorruption { artifact, detail } => {
                tracing::warn!(artifact = %artifact.display(), detail, "structural corruption, abandoning block");
            }
            DecodeError::SemanticViolation { artifact, tag, detail } => {
                tracing::warn!(artifact = %artifact.display(), tag, detail, "semantic violation, skipping field");
            }
            DecodeError::Io { artifact, source } => {
                tracing::warn!(artifact = %artifact.display(), error = %source, "I/O failure, skipping artifact");
            }
        }
    }
}
