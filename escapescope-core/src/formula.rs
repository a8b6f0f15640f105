use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// The closed set of escape-time formulas.
///
/// Every variant is a pure step function `z' = step(z, c)` plus an escape
/// test and a smoothing rule (see [`EscapeKind`]). Variants carry no state,
/// so one value is shared read-only by every pixel of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// `z' = z^p + c`.
    Mandelbrot,
    /// `z' = z^p + c`, always evaluated in dynamics space.
    Julia,
    /// `z' = conj(z)^p + c`.
    Tricorn,
    /// `z' = (|Re z| + i|Im z|)^p + c`.
    BurningShip,
    /// `z' = ((z² + c − 1) / (2z + c − 2))^p`.
    MagnetType1,
    /// `z' = ((z³ + 3(c−1)z + (c−1)(c−2)) / (3z² + 3(c−2)z + (c−1)(c−2) + 1))^p`.
    MagnetType2,
}

/// How a formula decides that iteration is finished, and how the final
/// iteration count is smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    /// Divergence past the bailout radius; smoothed with a log-log term.
    Distance,
    /// Divergence past the bailout radius, or convergence onto the fixed
    /// point `1`; reported as the raw iteration count.
    Convergence,
}

impl FormulaKind {
    pub const ALL: [FormulaKind; 6] = [
        FormulaKind::Mandelbrot,
        FormulaKind::Julia,
        FormulaKind::Tricorn,
        FormulaKind::BurningShip,
        FormulaKind::MagnetType1,
        FormulaKind::MagnetType2,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia => "Julia",
            Self::Tricorn => "Tricorn",
            Self::BurningShip => "Burning Ship",
            Self::MagnetType1 => "Magnet Type 1",
            Self::MagnetType2 => "Magnet Type 2",
        }
    }

    /// Identifier used on the command line and in scene files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
            Self::Julia => "julia",
            Self::Tricorn => "tricorn",
            Self::BurningShip => "burning_ship",
            Self::MagnetType1 => "magnet_type1",
            Self::MagnetType2 => "magnet_type2",
        }
    }

    pub fn escape_kind(self) -> EscapeKind {
        match self {
            Self::MagnetType1 | Self::MagnetType2 => EscapeKind::Convergence,
            _ => EscapeKind::Distance,
        }
    }

    /// `Julia` ignores the mode flag: the plane sample is always `z₀`.
    pub fn forces_julia_mode(self) -> bool {
        matches!(self, Self::Julia)
    }

    /// One iteration step.
    ///
    /// `terms` holds the per-point constants derived from `c`; build it once
    /// per sample with [`SeedTerms::new`] rather than once per step.
    #[inline]
    pub fn step(self, z: Complex, terms: &SeedTerms, exponent: f64) -> Complex {
        match self {
            Self::Mandelbrot | Self::Julia => z.powf(exponent) + terms.c,
            Self::Tricorn => z.conj().powf(exponent) + terms.c,
            Self::BurningShip => z.abs_components().powf(exponent) + terms.c,
            Self::MagnetType1 => {
                let numerator = z.powf(2.0) + terms.c_minus_one;
                let denominator = z * 2.0 + terms.c_minus_two;
                (numerator / denominator).powf(exponent)
            }
            Self::MagnetType2 => {
                let z2 = z * z;
                let numerator = z2 * z + terms.numerator_factor * z + terms.numerator_term;
                let denominator =
                    z2 * 3.0 + terms.denominator_factor * z + terms.denominator_term;
                (numerator / denominator).powf(exponent)
            }
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FormulaKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squash = |t: &str| {
            t.chars()
                .filter(|ch| !matches!(ch, '-' | '_' | ' '))
                .collect::<String>()
                .to_ascii_lowercase()
        };
        let wanted = squash(s.trim());
        Self::ALL
            .into_iter()
            .find(|f| squash(f.key()) == wanted)
            .ok_or_else(|| CoreError::UnknownFormula(s.to_string()))
    }
}

/// Constants derived from the parameter `c`, fixed for a whole orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedTerms {
    pub c: Complex,
    /// `c − 1`
    pub c_minus_one: Complex,
    /// `c − 2`
    pub c_minus_two: Complex,
    /// `(c − 1)(c − 2)`
    pub numerator_term: Complex,
    /// `(c − 1)(c − 2) + 1`
    pub denominator_term: Complex,
    /// `3(c − 1)`
    pub numerator_factor: Complex,
    /// `3(c − 2)`
    pub denominator_factor: Complex,
}

impl SeedTerms {
    pub fn new(c: Complex) -> Self {
        let c_minus_one = c - Complex::ONE;
        let c_minus_two = c - Complex::ONE * 2.0;
        let numerator_term = c_minus_one * c_minus_two;
        Self {
            c,
            c_minus_one,
            c_minus_two,
            numerator_term,
            denominator_term: numerator_term + Complex::ONE,
            numerator_factor: c_minus_one * 3.0,
            denominator_factor: c_minus_two * 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn close(a: Complex, b: Complex) -> bool {
        (a - b).norm() < EPSILON
    }

    #[test]
    fn mandelbrot_step() {
        // z² + c where z = (0.5, 0.5), c = (-0.75, 0.1) → (-0.75, 0.6)
        let terms = SeedTerms::new(Complex::new(-0.75, 0.1));
        let next = FormulaKind::Mandelbrot.step(Complex::new(0.5, 0.5), &terms, 2.0);
        assert!(close(next, Complex::new(-0.75, 0.6)));
    }

    #[test]
    fn julia_step_matches_mandelbrot_step() {
        let terms = SeedTerms::new(Complex::new(0.2, -0.4));
        let z = Complex::new(0.1, 0.9);
        for p in [2.0, 3.0, 2.5] {
            assert_eq!(
                FormulaKind::Julia.step(z, &terms, p),
                FormulaKind::Mandelbrot.step(z, &terms, p)
            );
        }
    }

    #[test]
    fn tricorn_step_conjugates() {
        // conj(1 + i)² = (1 - i)² = -2i, plus c = 0
        let terms = SeedTerms::new(Complex::ZERO);
        let next = FormulaKind::Tricorn.step(Complex::new(1.0, 1.0), &terms, 2.0);
        assert!(close(next, Complex::new(0.0, -2.0)));
    }

    #[test]
    fn burning_ship_step_folds_components() {
        // (|-1| + |-1|i)² = 2i
        let terms = SeedTerms::new(Complex::ZERO);
        let next = FormulaKind::BurningShip.step(Complex::new(-1.0, -1.0), &terms, 2.0);
        assert!(close(next, Complex::new(0.0, 2.0)));
    }

    #[test]
    fn magnet_type1_step() {
        // z = 0, c = 3: ((0 + 2) / (0 + 1))² = 4
        let terms = SeedTerms::new(Complex::new(3.0, 0.0));
        let next = FormulaKind::MagnetType1.step(Complex::ZERO, &terms, 2.0);
        assert!(close(next, Complex::new(4.0, 0.0)));
    }

    #[test]
    fn magnet_type1_fixed_point_is_one() {
        // z = 1 is a fixed point for every c: ((1 + c - 1) / (2 + c - 2))² = 1
        for c in [Complex::new(0.3, 0.7), Complex::new(-1.2, 0.1), Complex::new(5.0, 0.0)] {
            let next = FormulaKind::MagnetType1.step(Complex::ONE, &SeedTerms::new(c), 2.0);
            assert!(close(next, Complex::ONE), "c = {c}");
        }
    }

    #[test]
    fn magnet_type2_fixed_point_is_one() {
        // Numerator and denominator both equal c² at z = 1.
        for c in [Complex::new(0.3, 0.7), Complex::new(-1.2, 0.1), Complex::new(5.0, 0.0)] {
            let next = FormulaKind::MagnetType2.step(Complex::ONE, &SeedTerms::new(c), 2.0);
            assert!((next - Complex::ONE).norm() < 1e-9, "c = {c}");
        }
    }

    #[test]
    fn magnet_type2_step() {
        // z = 0, c = 0: numerator (−1)(−2) = 2, denominator 2 + 1 = 3 → (2/3)²
        let terms = SeedTerms::new(Complex::ZERO);
        let next = FormulaKind::MagnetType2.step(Complex::ZERO, &terms, 2.0);
        assert!(close(next, Complex::new(4.0 / 9.0, 0.0)));
    }

    #[test]
    fn magnet_pole_gives_non_finite() {
        // 2z + c − 2 = 0 at z = 0, c = 2.
        let terms = SeedTerms::new(Complex::new(2.0, 0.0));
        let next = FormulaKind::MagnetType1.step(Complex::ZERO, &terms, 2.0);
        assert!(!next.is_finite());
    }

    #[test]
    fn seed_terms() {
        let t = SeedTerms::new(Complex::new(1.0, 1.0));
        assert!(close(t.c_minus_one, Complex::new(0.0, 1.0)));
        assert!(close(t.c_minus_two, Complex::new(-1.0, 1.0)));
        // i · (−1 + i) = −1 − i
        assert!(close(t.numerator_term, Complex::new(-1.0, -1.0)));
        assert!(close(t.denominator_term, Complex::new(0.0, -1.0)));
        assert!(close(t.numerator_factor, Complex::new(0.0, 3.0)));
        assert!(close(t.denominator_factor, Complex::new(-3.0, 3.0)));
    }

    #[test]
    fn escape_kinds() {
        assert_eq!(FormulaKind::Mandelbrot.escape_kind(), EscapeKind::Distance);
        assert_eq!(FormulaKind::BurningShip.escape_kind(), EscapeKind::Distance);
        assert_eq!(FormulaKind::MagnetType1.escape_kind(), EscapeKind::Convergence);
        assert_eq!(FormulaKind::MagnetType2.escape_kind(), EscapeKind::Convergence);
    }

    #[test]
    fn parse_keys_and_labels() {
        for f in FormulaKind::ALL {
            assert_eq!(f.key().parse::<FormulaKind>().unwrap(), f);
            assert_eq!(f.label().parse::<FormulaKind>().unwrap(), f);
        }
        assert_eq!("Burning-Ship".parse::<FormulaKind>().unwrap(), FormulaKind::BurningShip);
        assert!("newton".parse::<FormulaKind>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&FormulaKind::MagnetType2).unwrap();
        assert_eq!(json, "\"magnet_type2\"");
        let back: FormulaKind = serde_json::from_str("\"burning_ship\"").unwrap();
        assert_eq!(back, FormulaKind::BurningShip);
    }
}
