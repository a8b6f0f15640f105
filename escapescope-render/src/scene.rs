use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use escapescope_core::{Evaluator, FormulaKind, IterationParams, JuliaHandoff, ViewportState};

use crate::palette::CosinePalette;
use crate::renderer::{render, RenderCancel, RenderResult};
use crate::supersample::Compositor;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_SUPERSAMPLE: u32 = 2;

/// Everything needed to render one frame.
///
/// A pass takes a copy of the scene when it starts; later edits only affect
/// the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default = "default_formula")]
    pub formula: FormulaKind,
    #[serde(default)]
    pub iteration: IterationParams,
    #[serde(default)]
    pub palette: CosinePalette,
    #[serde(default = "default_viewport")]
    pub viewport: ViewportState,
    /// Sub-samples per pixel side.
    #[serde(default = "default_supersample")]
    pub supersample: u32,
}

fn default_formula() -> FormulaKind {
    FormulaKind::Mandelbrot
}
fn default_viewport() -> ViewportState {
    ViewportState::default_mandelbrot(DEFAULT_WIDTH, DEFAULT_HEIGHT)
}
fn default_supersample() -> u32 {
    DEFAULT_SUPERSAMPLE
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(FormulaKind::Mandelbrot, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// Opening view of a page. Only the Mandelbrot parameter plane is shifted
/// left to frame the set.
fn opening_view(formula: FormulaKind, julia_mode: bool, width: u32, height: u32) -> ViewportState {
    if formula == FormulaKind::Mandelbrot && !julia_mode {
        ViewportState::default_mandelbrot(width, height)
    } else {
        ViewportState::default_julia(width, height)
    }
}

impl Scene {
    /// Fresh scene for `formula` with default parameters and palette.
    pub fn new(formula: FormulaKind, width: u32, height: u32) -> Self {
        let iteration = IterationParams::default();
        Self {
            formula,
            iteration,
            palette: CosinePalette::default(),
            viewport: opening_view(
                formula,
                iteration.julia_mode || formula.forces_julia_mode(),
                width,
                height,
            ),
            supersample: DEFAULT_SUPERSAMPLE,
        }
    }

    /// Whether the plane sample is the initial iterate.
    pub fn julia_mode(&self) -> bool {
        self.iteration.julia_mode || self.formula.forces_julia_mode()
    }

    /// Companion Julia view for a point picked in this scene. Palette,
    /// budget and canvas size carry over; the view starts from the default
    /// Julia framing.
    pub fn julia_companion(&self, handoff: JuliaHandoff) -> Self {
        Self {
            iteration: handoff.apply(self.iteration),
            viewport: ViewportState::default_julia(self.viewport.width, self.viewport.height),
            ..*self
        }
    }

    /// Validate the scene and build the per-frame compositor.
    pub fn compositor(&self) -> crate::Result<Compositor> {
        let evaluator = Evaluator::new(self.formula, self.iteration)?;
        Compositor::new(evaluator, self.palette, self.supersample)
    }
}

/// Render `scene` on the rayon pool.
pub fn render_scene(scene: &Scene, cancel: &Arc<RenderCancel>) -> crate::Result<RenderResult> {
    let compositor = scene.compositor()?;
    debug!(
        formula = scene.formula.key(),
        julia_mode = scene.julia_mode(),
        seed = %scene.iteration.seed,
        center = %scene.viewport.center,
        zoom = scene.viewport.zoom,
        "Rendering scene"
    );
    render(&compositor, &scene.viewport, cancel)
}
