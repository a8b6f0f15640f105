use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use escapescope_core::SampleResult;

/// A linear color with channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Quantize to opaque 8-bit RGBA. Out-of-range channels are clamped and
    /// NaN maps to 0.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f64| {
            if v.is_nan() {
                0
            } else {
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        [q(self.r), q(self.g), q(self.b), 255]
    }

    /// `#rrggbb` form, used by the palette listing.
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Cosine gradient `a + b · cos(2π · (c · t + d))`, evaluated per channel.
///
/// `t` is the smooth iteration count raised to `gamma`, shifted by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosinePalette {
    /// Phase shift added after gamma, usually in `[0, 1]`.
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_a")]
    pub a: [f64; 3],
    #[serde(default = "default_b")]
    pub b: [f64; 3],
    #[serde(default = "default_c")]
    pub c: [f64; 3],
    #[serde(default = "default_d")]
    pub d: [f64; 3],
}

fn default_gamma() -> f64 {
    1.0
}
fn default_a() -> [f64; 3] {
    [0.5, 0.5, 0.5]
}
fn default_b() -> [f64; 3] {
    [0.5, 0.5, 0.5]
}
fn default_c() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}
fn default_d() -> [f64; 3] {
    [0.2, 0.1, 0.0]
}

impl Default for CosinePalette {
    fn default() -> Self {
        Self {
            offset: 0.0,
            gamma: default_gamma(),
            a: default_a(),
            b: default_b(),
            c: default_c(),
            d: default_d(),
        }
    }
}

impl CosinePalette {
    /// Color for one sample; interior points are black.
    #[inline]
    pub fn color(&self, result: SampleResult) -> Rgb {
        match result {
            SampleResult::Interior => Rgb::BLACK,
            SampleResult::Escaped { smooth } => self.gradient(smooth.powf(self.gamma) + self.offset),
        }
    }

    /// Raw gradient at position `t`.
    #[inline]
    pub fn gradient(&self, t: f64) -> Rgb {
        let channel = |i: usize| self.a[i] + self.b[i] * (TAU * (self.c[i] * t + self.d[i])).cos();
        Rgb::new(channel(0), channel(1), channel(2))
    }

    /// `count` evenly spaced gradient colors over one unit of `t`.
    pub fn preview_colors(&self, count: usize) -> Vec<Rgb> {
        (0..count)
            .map(|i| self.gradient(i as f64 / count as f64 + self.offset))
            .collect()
    }

    /// Same palette with a different gamma.
    pub fn with_gamma(self, gamma: f64) -> Self {
        Self { gamma, ..self }
    }
}

/// A named built-in palette.
#[derive(Debug, Clone, Copy)]
pub struct PalettePreset {
    pub name: &'static str,
    pub palette: CosinePalette,
}

pub fn builtin_palettes() -> Vec<PalettePreset> {
    vec![classic(), rainbow(), ember(), ocean(), grayscale()]
}

/// Look up a built-in palette by case-insensitive name.
pub fn find_palette(name: &str) -> Option<CosinePalette> {
    builtin_palettes()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .map(|p| p.palette)
}

fn classic() -> PalettePreset {
    PalettePreset {
        name: "classic",
        palette: CosinePalette::default(),
    }
}

fn rainbow() -> PalettePreset {
    PalettePreset {
        name: "rainbow",
        palette: CosinePalette {
            d: [0.0, 0.33, 0.67],
            ..CosinePalette::default()
        },
    }
}

fn ember() -> PalettePreset {
    PalettePreset {
        name: "ember",
        palette: CosinePalette {
            c: [1.0, 1.0, 0.5],
            d: [0.8, 0.9, 0.3],
            ..CosinePalette::default()
        },
    }
}

fn ocean() -> PalettePreset {
    PalettePreset {
        name: "ocean",
        palette: CosinePalette {
            c: [1.0, 0.7, 0.4],
            d: [0.0, 0.15, 0.2],
            ..CosinePalette::default()
        },
    }
}

fn grayscale() -> PalettePreset {
    PalettePreset {
        name: "grayscale",
        palette: CosinePalette {
            d: [0.0, 0.0, 0.0],
            ..CosinePalette::default()
        },
    }
}
