use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid supersample factor: {0} (must be between 1 and 16)")]
    InvalidSupersample(u32),

    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("render cancelled")]
    Cancelled,

    #[error("PNG export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Core(#[from] escapescope_core::CoreError),
}
