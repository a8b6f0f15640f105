use std::path::PathBuf;

use thiserror::Error;

use escapescope_core::CoreError;
use escapescope_render::RenderError;

/// Errors reported by the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown palette: {0:?} (see `escapescope palettes`)")]
    UnknownPalette(String),

    #[error("failed to spawn render worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("render worker stopped unexpectedly")]
    WorkerStopped,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience result type for the app crate.
pub type Result<T> = std::result::Result<T, AppError>;
