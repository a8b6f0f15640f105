use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Parameters controlling the iteration of every point in one frame.
///
/// Supplied per render and never mutated during it. Construct through
/// [`IterationParams::new`] (or mutate a copy and call
/// [`validate`](Self::validate)) so configuration mistakes surface before
/// a frame is computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationParams {
    /// Real power `p` applied by the power-family formulas.
    #[serde(default = "default_exponent")]
    pub exponent: f64,

    /// Escape radius: an orbit with `|z| > bailout` has diverged.
    #[serde(default = "default_bailout")]
    pub bailout: f64,

    /// Maximum number of steps before declaring a point interior.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// `false`: the plane sample is `c` and `z₀ = seed` (parameter space).
    /// `true`: the plane sample is `z₀` and `c = seed` (dynamics space).
    #[serde(default)]
    pub julia_mode: bool,

    /// Julia constant in dynamics space, starting iterate in parameter space.
    #[serde(default = "default_seed")]
    pub seed: Complex,

    /// Distance from the fixed point `1` at which the Magnet formulas are
    /// considered converged.
    #[serde(default = "default_convergence_epsilon")]
    pub convergence_epsilon: f64,
}

fn default_exponent() -> f64 {
    IterationParams::DEFAULT_EXPONENT
}
fn default_bailout() -> f64 {
    IterationParams::DEFAULT_BAILOUT
}
fn default_max_iterations() -> u32 {
    IterationParams::DEFAULT_MAX_ITERATIONS
}
fn default_seed() -> Complex {
    Complex::ZERO
}
fn default_convergence_epsilon() -> f64 {
    IterationParams::DEFAULT_CONVERGENCE_EPSILON
}

impl IterationParams {
    pub const DEFAULT_EXPONENT: f64 = 2.0;
    pub const DEFAULT_BAILOUT: f64 = 256.0;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
    pub const DEFAULT_CONVERGENCE_EPSILON: f64 = 1e-4;

    pub fn new(exponent: f64, bailout: f64, max_iterations: u32) -> crate::Result<Self> {
        let params = Self {
            exponent,
            bailout,
            max_iterations,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject parameter sets the evaluator cannot honour.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(self.max_iterations));
        }
        if self.bailout <= 0.0 || !self.bailout.is_finite() {
            return Err(CoreError::InvalidBailout(self.bailout));
        }
        if self.exponent < 1.0 || !self.exponent.is_finite() {
            return Err(CoreError::InvalidExponent(self.exponent));
        }
        if self.convergence_epsilon <= 0.0 || !self.convergence_epsilon.is_finite() {
            return Err(CoreError::InvalidEpsilon(self.convergence_epsilon));
        }
        Ok(())
    }

    /// Return a copy in dynamics space with `seed` as the Julia constant.
    pub fn into_julia(self, seed: Complex) -> Self {
        Self {
            julia_mode: true,
            seed,
            ..self
        }
    }

    /// Return a copy with a different `max_iterations` value.
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

impl Default for IterationParams {
    fn default() -> Self {
        Self {
            exponent: Self::DEFAULT_EXPONENT,
            bailout: Self::DEFAULT_BAILOUT,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            julia_mode: false,
            seed: Complex::ZERO,
            convergence_epsilon: Self::DEFAULT_CONVERGENCE_EPSILON,
        }
    }
}
