use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid bailout radius: {0} (must be finite and > 0.0)")]
    InvalidBailout(f64),

    #[error("invalid exponent: {0} (must be finite and >= 1.0)")]
    InvalidExponent(f64),

    #[error("invalid convergence epsilon: {0} (must be finite and > 0.0)")]
    InvalidEpsilon(f64),

    #[error("unknown formula: {0:?}")]
    UnknownFormula(String),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },
}
