use tracing::debug;

use crate::complex::Complex;
use crate::formula::{EscapeKind, FormulaKind, SeedTerms};
use crate::params::IterationParams;

/// The result of iterating a single sample point.
///
/// This is the only value that flows from the evaluator to the palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleResult {
    /// The orbit left the bailout radius (or, for the Magnet formulas,
    /// reached the fixed point). `smooth` is the normalized, non-negative
    /// iteration count.
    Escaped { smooth: f64 },

    /// The orbit neither escaped nor converged within `max_iterations`.
    Interior,
}

impl SampleResult {
    #[inline]
    pub fn smooth(&self) -> Option<f64> {
        match self {
            Self::Escaped { smooth } => Some(*smooth),
            Self::Interior => None,
        }
    }

    #[inline]
    pub fn is_interior(&self) -> bool {
        matches!(self, Self::Interior)
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) < 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im < 0.0625
}

/// Drives the iteration loop of one formula under one parameter set.
///
/// Built once per frame; [`evaluate`](Self::evaluate) is a pure function of
/// the sample point, so a shared `&Evaluator` can be used from any number of
/// threads at once.
#[derive(Debug, Clone)]
pub struct Evaluator {
    formula: FormulaKind,
    params: IterationParams,
    julia_mode: bool,
    escape_kind: EscapeKind,
    bailout_sq: f64,
    ln_bailout: f64,
    ln_exponent: f64,
    /// `log2(log2(bailout²))`, the offset of the exponent-2 smoothing.
    square_offset: f64,
    /// Log-log smoothing needs `bailout > 1` and `exponent > 1`.
    smoothing: bool,
    interior_shortcut: bool,
}

impl Evaluator {
    pub fn new(formula: FormulaKind, params: IterationParams) -> crate::Result<Self> {
        params.validate()?;

        let julia_mode = params.julia_mode || formula.forces_julia_mode();
        let interior_shortcut = formula == FormulaKind::Mandelbrot
            && !julia_mode
            && params.seed == Complex::ZERO
            && params.exponent == 2.0;
        let bailout_sq = params.bailout * params.bailout;

        debug!(
            formula = formula.key(),
            julia_mode,
            max_iterations = params.max_iterations,
            bailout = params.bailout,
            exponent = params.exponent,
            interior_shortcut,
            "Evaluator configured"
        );

        Ok(Self {
            formula,
            params,
            julia_mode,
            escape_kind: formula.escape_kind(),
            bailout_sq,
            ln_bailout: params.bailout.ln(),
            ln_exponent: params.exponent.ln(),
            square_offset: bailout_sq.log2().log2(),
            smoothing: params.bailout > 1.0 && params.exponent > 1.0,
            interior_shortcut,
        })
    }

    pub fn formula(&self) -> FormulaKind {
        self.formula
    }

    pub fn params(&self) -> &IterationParams {
        &self.params
    }

    /// Effective mode after the formula's own preference is applied.
    pub fn julia_mode(&self) -> bool {
        self.julia_mode
    }

    /// Classify one point of the complex plane.
    pub fn evaluate(&self, point: Complex) -> SampleResult {
        if self.interior_shortcut
            && (in_cardioid(point.re, point.im) || in_period2_bulb(point.re, point.im))
        {
            return SampleResult::Interior;
        }
        self.evaluate_without_shortcuts(point)
    }

    /// Same as [`evaluate`](Self::evaluate) but always runs the full loop,
    /// even where a closed-form interior test applies.
    pub fn evaluate_without_shortcuts(&self, point: Complex) -> SampleResult {
        let (mut z, terms) = self.initial_state(point);
        let exponent = self.params.exponent;

        for n in 0..self.params.max_iterations {
            z = self.formula.step(z, &terms, exponent);
            if self.has_escaped(z) {
                return SampleResult::Escaped {
                    smooth: self.smooth(n, z),
                };
            }
        }

        SampleResult::Interior
    }

    /// The successive iterates `z₁, z₂, …` for `point`.
    ///
    /// Ends after the first escaping iterate, or after `max_iterations`
    /// values.
    pub fn orbit(&self, point: Complex) -> Orbit<'_> {
        let (z, terms) = self.initial_state(point);
        Orbit {
            evaluator: self,
            z,
            terms,
            remaining: self.params.max_iterations,
        }
    }

    /// Resolve `(z₀, c)` for a plane sample according to the mode.
    #[inline]
    fn initial_state(&self, point: Complex) -> (Complex, SeedTerms) {
        if self.julia_mode {
            (point, SeedTerms::new(self.params.seed))
        } else {
            (self.params.seed, SeedTerms::new(point))
        }
    }

    #[inline]
    fn has_escaped(&self, z: Complex) -> bool {
        // Written as a negated `<=` so that NaN orbits count as escaped.
        let diverged = !(z.norm_sq() <= self.bailout_sq);
        match self.escape_kind {
            EscapeKind::Distance => diverged,
            EscapeKind::Convergence => {
                diverged || z.approx_eq(Complex::ONE, self.params.convergence_epsilon)
            }
        }
    }

    /// Fractional iteration count for an orbit that escaped after `n`
    /// completed steps with final value `z`.
    #[inline]
    fn smooth(&self, n: u32, z: Complex) -> f64 {
        let raw = n as f64;
        if self.escape_kind == EscapeKind::Convergence || !self.smoothing {
            return raw;
        }
        let k = if self.params.exponent == 2.0 {
            raw - z.norm_sq().log2().log2() + self.square_offset
        } else {
            raw - (z.norm().ln() / self.ln_bailout).ln() / self.ln_exponent
        };
        if k.is_finite() {
            k.max(0.0)
        } else {
            raw
        }
    }
}

/// Iterator over the orbit of one sample point; see [`Evaluator::orbit`].
pub struct Orbit<'a> {
    evaluator: &'a Evaluator,
    z: Complex,
    terms: SeedTerms,
    remaining: u32,
}

impl Iterator for Orbit<'_> {
    type Item = Complex;

    fn next(&mut self) -> Option<Complex> {
        if self.remaining == 0 {
            return None;
        }
        let ev = self.evaluator;
        self.z = ev.formula.step(self.z, &self.terms, ev.params.exponent);
        self.remaining = if ev.has_escaped(self.z) {
            0
        } else {
            self.remaining - 1
        };
        Some(self.z)
    }
}

/// Classify `point` with a one-off evaluator.
///
/// Prefer building an [`Evaluator`] once per frame when evaluating many
/// points; this helper re-validates `params` on every call.
pub fn evaluate(
    point: Complex,
    params: &IterationParams,
    formula: FormulaKind,
) -> crate::Result<SampleResult> {
    Ok(Evaluator::new(formula, *params)?.evaluate(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn params(max_iterations: u32) -> IterationParams {
        IterationParams {
            max_iterations,
            ..IterationParams::default()
        }
    }

    fn mandelbrot(max_iterations: u32) -> Evaluator {
        Evaluator::new(FormulaKind::Mandelbrot, params(max_iterations)).unwrap()
    }

    #[test]
    fn origin_is_interior() {
        let r = evaluate(Complex::ZERO, &params(1000), FormulaKind::Mandelbrot).unwrap();
        assert_eq!(r, SampleResult::Interior);
    }

    #[test]
    fn one_plus_i_escapes_after_four_steps() {
        // 1+i → 1+3i → -7+7i → 1-97i → -9407-193i, the last exceeds 256.
        let ev = mandelbrot(1000);
        let orbit: Vec<_> = ev.orbit(Complex::new(1.0, 1.0)).collect();
        assert_eq!(orbit.len(), 5);
        assert_eq!(orbit[4], Complex::new(-9407.0, -193.0));

        let k = ev.evaluate(Complex::new(1.0, 1.0)).smooth().unwrap();
        assert!((k - 3.2776).abs() < 1e-3, "k = {k}");
    }

    #[test]
    fn far_point_escapes_immediately_with_zero_count() {
        let r = mandelbrot(100).evaluate(Complex::new(1000.0, 0.0));
        assert_eq!(r, SampleResult::Escaped { smooth: 0.0 });
    }

    #[test]
    fn minus_one_is_interior() {
        // c = -1 gives the orbit 0 → -1 → 0 → -1 … (period 2)
        assert!(mandelbrot(500).evaluate_without_shortcuts(Complex::new(-1.0, 0.0)).is_interior());
    }

    #[test]
    fn invalid_params_fail_fast() {
        let bad = IterationParams {
            max_iterations: 0,
            ..IterationParams::default()
        };
        assert!(matches!(
            Evaluator::new(FormulaKind::Tricorn, bad),
            Err(CoreError::InvalidMaxIterations(0))
        ));
        let bad = IterationParams {
            bailout: -2.0,
            ..IterationParams::default()
        };
        assert!(evaluate(Complex::ZERO, &bad, FormulaKind::Mandelbrot).is_err());
    }

    #[test]
    fn interior_shortcut_matches_full_loop() {
        let ev = mandelbrot(200);
        assert!(ev.interior_shortcut);
        let mut shortcut_hits = 0;
        for i in 0..=100 {
            for j in 0..=100 {
                let c = Complex::new(-2.0 + 2.5 * i as f64 / 100.0, -1.2 + 2.4 * j as f64 / 100.0);
                if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
                    shortcut_hits += 1;
                }
                assert_eq!(ev.evaluate(c), ev.evaluate_without_shortcuts(c), "c = {c}");
            }
        }
        assert!(shortcut_hits > 100, "grid should cover the cardioid and bulb");
    }

    #[test]
    fn interior_shortcut_only_for_plain_mandelbrot() {
        let julia = Evaluator::new(FormulaKind::Mandelbrot, params(50).into_julia(Complex::ZERO));
        assert!(!julia.unwrap().interior_shortcut);

        let cubic = IterationParams {
            exponent: 3.0,
            ..params(50)
        };
        assert!(!Evaluator::new(FormulaKind::Mandelbrot, cubic).unwrap().interior_shortcut);

        let seeded = IterationParams {
            seed: Complex::new(0.1, 0.0),
            ..params(50)
        };
        assert!(!Evaluator::new(FormulaKind::Mandelbrot, seeded).unwrap().interior_shortcut);
        assert!(!Evaluator::new(FormulaKind::Tricorn, params(50)).unwrap().interior_shortcut);
    }

    #[test]
    fn shortcut_region_tests() {
        assert!(in_cardioid(0.0, 0.0));
        assert!(in_cardioid(-0.5, 0.3));
        assert!(!in_cardioid(0.3, 0.0));
        assert!(in_period2_bulb(-1.0, 0.0));
        assert!(!in_period2_bulb(-1.3, 0.0));
    }

    #[test]
    fn evaluation_terminates_within_max_iterations() {
        let points = [
            Complex::ZERO,
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(2.0, 0.0),
            Complex::new(0.5, -0.5),
            Complex::new(1.5, 1.5),
        ];
        for formula in FormulaKind::ALL {
            for max in [1, 7, 64] {
                let ev = Evaluator::new(formula, params(max)).unwrap();
                for &p in &points {
                    assert!(ev.orbit(p).count() <= max as usize, "{formula} at {p}");
                    if let SampleResult::Escaped { smooth } = ev.evaluate(p) {
                        assert!(smooth.is_finite() && smooth >= 0.0, "{formula} at {p}");
                    }
                }
            }
        }
    }

    #[test]
    fn smooth_count_grows_towards_the_set() {
        // Along the positive real axis, farther from the set escapes sooner.
        let ev = mandelbrot(1000);
        let mut previous = f64::INFINITY;
        for i in 0..200 {
            let c = Complex::new(0.26 + i as f64 * 0.02, 0.0);
            let k = ev.evaluate(c).smooth().expect("real c > 1/4 escapes");
            assert!(k <= previous + 1e-3, "c = {c}: {k} > {previous}");
            previous = k;
        }
    }

    fn cubic() -> Evaluator {
        let params = IterationParams {
            exponent: 3.0,
            ..params(1000)
        };
        Evaluator::new(FormulaKind::Mandelbrot, params).unwrap()
    }

    #[test]
    fn cubic_smooth_count_at_one_plus_i() {
        // 1+i → -1+3i → 27-17i → escapes at the next step, so n = 3.
        let ev = cubic();
        let orbit: Vec<_> = ev.orbit(Complex::new(1.0, 1.0)).collect();
        assert_eq!(orbit.len(), 4);
        assert!((orbit[2] - Complex::new(27.0, -17.0)).norm() < 1e-9);

        let k = ev.evaluate(Complex::new(1.0, 1.0)).smooth().unwrap();
        assert!((k - 2.428590771470548).abs() < 1e-9, "k = {k}");
    }

    #[test]
    fn cubic_smooth_count_falls_away_from_the_set() {
        let ev = cubic();
        let samples: Vec<f64> = (0..=200)
            .map(|i| {
                let c = Complex::new(1.0 + i as f64 * 0.01, 0.3);
                ev.evaluate(c).smooth().expect("c outside the cubic set escapes")
            })
            .collect();
        for (i, pair) in samples.windows(2).enumerate() {
            assert!(pair[1] <= pair[0] + 5e-3, "step {i}: {} > {}", pair[1], pair[0]);
            assert!((pair[1] - pair[0]).abs() < 0.1, "step {i}: jump in smooth count");
        }
        assert!(samples[0] - samples[200] > 0.5);
    }

    #[test]
    fn smoothing_general_exponent_matches_square_form_at_two() {
        // The log2 form used at p = 2 equals the generic log-log form.
        let ev = mandelbrot(1000);
        let z = Complex::new(300.0, -40.0);
        let n = 5;
        let generic = n as f64 - (z.norm().ln() / ev.ln_bailout).ln() / ev.ln_exponent;
        assert!((ev.smooth(n, z) - generic).abs() < 1e-9);
    }

    #[test]
    fn julia_mode_round_trip() {
        // Julia at c from z₀ = 0 follows the Mandelbrot orbit of c.
        let c = Complex::new(-0.12, 0.74);
        let m = mandelbrot(300);
        let j = Evaluator::new(FormulaKind::Mandelbrot, params(300).into_julia(c)).unwrap();
        let m_orbit: Vec<_> = m.orbit(c).collect();
        let j_orbit: Vec<_> = j.orbit(Complex::ZERO).collect();
        assert_eq!(m_orbit, j_orbit);
        assert_eq!(m.evaluate_without_shortcuts(c), j.evaluate(Complex::ZERO));
    }

    #[test]
    fn julia_formula_forces_dynamics_space() {
        let seed = Complex::new(-0.7, 0.27015);
        let p = IterationParams {
            seed,
            ..params(200)
        };
        let j = Evaluator::new(FormulaKind::Julia, p).unwrap();
        assert!(j.julia_mode());
        let explicit = Evaluator::new(FormulaKind::Mandelbrot, p.into_julia(seed)).unwrap();
        for point in [Complex::ZERO, Complex::new(0.4, 0.4), Complex::new(1.5, 0.0)] {
            assert_eq!(j.evaluate(point), explicit.evaluate(point));
        }
    }

    #[test]
    fn magnet_converges_to_fixed_point_with_raw_count() {
        // z = 1 is superattracting for c ≠ 0, so a nearby start lands fast.
        let p = params(100).into_julia(Complex::new(1.5, 0.5));
        let start = Complex::new(1.01, 0.01);
        for formula in [FormulaKind::MagnetType1, FormulaKind::MagnetType2] {
            let ev = Evaluator::new(formula, p).unwrap();
            let k = ev
                .evaluate(start)
                .smooth()
                .unwrap_or_else(|| panic!("{formula} should converge"));
            assert_eq!(k.fract(), 0.0, "{formula} reports a raw count");
            assert!(k < 10.0, "{formula} took {k} steps");
            let last = ev.orbit(start).last().unwrap();
            assert!(last.approx_eq(Complex::ONE, 1e-4), "{formula} ended at {last}");
        }
    }

    #[test]
    fn magnet_pole_is_absorbed_as_escape() {
        // c = 2, z₀ = 0 divides by zero on the first step.
        let ev = Evaluator::new(FormulaKind::MagnetType1, params(50)).unwrap();
        assert_eq!(
            ev.evaluate(Complex::new(2.0, 0.0)),
            SampleResult::Escaped { smooth: 0.0 }
        );
    }

    #[test]
    fn nan_orbit_counts_as_escaped() {
        let ev = mandelbrot(10);
        assert!(ev.has_escaped(Complex::new(f64::NAN, 0.0)));
        assert!(ev.has_escaped(Complex::new(f64::INFINITY, 0.0)));
        assert!(!ev.has_escaped(Complex::new(1.0, 1.0)));
    }

    #[test]
    fn exponent_one_falls_back_to_raw_count() {
        let p = IterationParams {
            exponent: 1.0,
            ..params(100)
        };
        let ev = Evaluator::new(FormulaKind::Mandelbrot, p).unwrap();
        // z_n = n·c for p = 1, so c = 100 escapes on step 3.
        assert_eq!(
            ev.evaluate(Complex::new(100.0, 0.0)),
            SampleResult::Escaped { smooth: 2.0 }
        );
    }

    #[test]
    fn burning_ship_and_tricorn_classify_origin_as_interior() {
        for formula in [FormulaKind::BurningShip, FormulaKind::Tricorn] {
            let ev = Evaluator::new(formula, params(200)).unwrap();
            assert!(ev.evaluate(Complex::ZERO).is_interior(), "{formula}");
            assert!(!ev.evaluate(Complex::new(2.0, 2.0)).is_interior(), "{formula}");
        }
    }

    #[test]
    fn deterministic_results() {
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-2.0, 0.0),
            Complex::new(1.0, 1.0),
        ];
        for formula in FormulaKind::ALL {
            let ev = Evaluator::new(formula, params(256)).unwrap();
            let run1: Vec<_> = points.iter().map(|&c| ev.evaluate(c)).collect();
            let run2: Vec<_> = points.iter().map(|&c| ev.evaluate(c)).collect();
            assert_eq!(run1, run2, "{formula} results must be deterministic");
        }
    }
}
