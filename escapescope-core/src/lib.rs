pub mod complex;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod params;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use evaluator::{evaluate, Evaluator, Orbit, SampleResult};
pub use formula::{EscapeKind, FormulaKind, SeedTerms};
pub use params::IterationParams;
pub use viewport::{JuliaHandoff, ViewportState, DEFAULT_ZOOM, ZOOM_STEP};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
