use escapescope_core::{Complex, Evaluator};

use crate::error::RenderError;
use crate::palette::{CosinePalette, Rgb};

/// Largest accepted sub-sample count per pixel side.
pub const MAX_SUPERSAMPLE: u32 = 16;

/// Turns one pixel into a color by evaluating an `n × n` grid of
/// sub-pixel samples and averaging their colors.
///
/// Colors are averaged in squared space: each output channel is
/// `sqrt(Σ c² / n²)`. With `n = 1` the pixel centre is sampled directly.
#[derive(Debug, Clone)]
pub struct Compositor {
    evaluator: Evaluator,
    palette: CosinePalette,
    supersample: u32,
}

impl Compositor {
    pub fn new(
        evaluator: Evaluator,
        palette: CosinePalette,
        supersample: u32,
    ) -> crate::Result<Self> {
        if !(1..=MAX_SUPERSAMPLE).contains(&supersample) {
            return Err(RenderError::InvalidSupersample(supersample));
        }
        Ok(Self {
            evaluator,
            palette,
            supersample,
        })
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn palette(&self) -> &CosinePalette {
        &self.palette
    }

    pub fn supersample(&self) -> u32 {
        self.supersample
    }

    /// Color of the square pixel centred on `center` with side `span`
    /// (both in plane units).
    pub fn render_pixel(&self, center: Complex, span: f64) -> Rgb {
        let n = self.supersample;
        if n == 1 {
            return self.palette.color(self.evaluator.evaluate(center));
        }

        let sub = span / n as f64;
        let origin_re = center.re - 0.5 * span;
        let origin_im = center.im - 0.5 * span;
        let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
        for j in 0..n {
            let im = origin_im + (j as f64 + 0.5) * sub;
            for i in 0..n {
                let re = origin_re + (i as f64 + 0.5) * sub;
                let c = self
                    .palette
                    .color(self.evaluator.evaluate(Complex::new(re, im)));
                r += c.r * c.r;
                g += c.g * c.g;
                b += c.b * c.b;
            }
        }
        let count = f64::from(n) * f64::from(n);
        Rgb::new((r / count).sqrt(), (g / count).sqrt(), (b / count).sqrt())
    }
}
