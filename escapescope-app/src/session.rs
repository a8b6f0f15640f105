use serde::{Deserialize, Serialize};
use tracing::debug;

use escapescope_core::JuliaHandoff;
use escapescope_render::Scene;

/// Input events from the windowing layer, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    /// Plain drag: move the view.
    Pan { dx: f64, dy: f64 },
    /// Modifier drag: move the seed parameter instead of the view.
    SeedDrag { dx: f64, dy: f64 },
    /// Wheel notch at `(x, y)`; positive `direction` zooms out.
    Wheel { x: f64, y: f64, direction: f64 },
    /// Parameter space: hand the point under `(x, y)` to a new Julia view.
    /// Ignored in a Julia view.
    DoubleClick { x: f64, y: f64 },
    /// Canvas resized to a logical size.
    Resize {
        width: f64,
        height: f64,
        #[serde(default = "default_device_pixel_ratio")]
        device_pixel_ratio: f64,
    },
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

/// Owns the scene being explored and applies gestures to it.
///
/// Every gesture replaces the scene with a new value; a render pass only
/// ever sees a copy taken by [`take_render_request`](Self::take_render_request).
#[derive(Debug, Clone)]
pub struct Session {
    scene: Scene,
    needs_render: bool,
}

impl Session {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            needs_render: true,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Apply one gesture. Returns the handoff when a double-click picked a
    /// Julia seed; this session's own scene is left as it was.
    pub fn apply(&mut self, gesture: Gesture) -> crate::error::Result<Option<JuliaHandoff>> {
        let scene = &self.scene;
        let viewport = &scene.viewport;
        let mut handoff = None;

        let next = match gesture {
            Gesture::Pan { dx, dy } => Scene {
                viewport: viewport.panned(dx, dy),
                ..*scene
            },
            Gesture::SeedDrag { dx, dy } => {
                let mut next = *scene;
                next.iteration.seed = viewport.pan_point(scene.iteration.seed, dx, dy);
                next
            }
            Gesture::Wheel { x, y, direction } => Scene {
                viewport: viewport.zoomed_at(x, y, direction),
                ..*scene
            },
            Gesture::DoubleClick { x, y } => {
                if scene.julia_mode() {
                    debug!("Double-click ignored in Julia view");
                } else {
                    handoff = Some(viewport.pick(x, y));
                }
                *scene
            }
            Gesture::Resize {
                width,
                height,
                device_pixel_ratio,
            } => Scene {
                viewport: viewport.resized_for(width, height, device_pixel_ratio)?,
                ..*scene
            },
        };

        if next != self.scene {
            debug!(?gesture, "Scene changed");
            self.scene = next;
            self.needs_render = true;
        }
        Ok(handoff)
    }

    /// Start the companion Julia view for a picked seed. The new session
    /// shares nothing with this one except the seed.
    pub fn companion(&self, handoff: JuliaHandoff) -> Session {
        Session::new(self.scene.julia_companion(handoff))
    }

    /// Snapshot of the scene if it changed since the last request.
    pub fn take_render_request(&mut self) -> Option<Scene> {
        if self.needs_render {
            self.needs_render = false;
            Some(self.scene)
        } else {
            None
        }
    }
}
