use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;
use crate::params::IterationParams;

/// Multiplicative zoom change applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;

/// Zoom of a freshly opened view.
pub const DEFAULT_ZOOM: f64 = 0.3;

/// Defines the visible region of the complex plane.
///
/// Screen pixels have their origin at the top-left with y growing downward;
/// pixel `(x, y)` is centred at `(x + 0.5, y + 0.5)`. One plane unit spans
/// `zoom · min(width, height)` pixels.
///
/// Every gesture is a pure transition returning a new state; a render pass
/// only ever sees a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ViewportRecord")]
pub struct ViewportState {
    /// Plane point shown at the middle of the canvas.
    pub center: Complex,

    /// Magnification; larger values show a smaller region.
    pub zoom: f64,

    /// Canvas width in physical pixels.
    pub width: u32,

    /// Canvas height in physical pixels.
    pub height: u32,
}

/// Unvalidated wire form of [`ViewportState`].
#[derive(Deserialize)]
struct ViewportRecord {
    center: Complex,
    zoom: f64,
    width: u32,
    height: u32,
}

impl TryFrom<ViewportRecord> for ViewportState {
    type Error = CoreError;

    fn try_from(r: ViewportRecord) -> Result<Self, Self::Error> {
        ViewportState::new(r.center, r.zoom, r.width, r.height)
    }
}

/// Result of picking a point in parameter space: the seed for a companion
/// Julia view. The handoff is one-way; the Julia view never writes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JuliaHandoff {
    pub seed: Complex,
}

impl JuliaHandoff {
    /// Parameters for the companion view: same budget, dynamics space.
    pub fn apply(self, params: IterationParams) -> IterationParams {
        params.into_julia(self.seed)
    }
}

impl ViewportState {
    pub fn new(center: Complex, zoom: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if zoom <= 0.0 || !zoom.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("zoom must be positive and finite, got {zoom}"),
            });
        }
        if !center.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("center must be finite, got {center}"),
            });
        }
        Ok(Self {
            center,
            zoom,
            width,
            height,
        })
    }

    /// Opening view of the parameter-space page.
    pub fn default_mandelbrot(width: u32, height: u32) -> Self {
        Self {
            center: Complex::new(-0.5, 0.0),
            zoom: DEFAULT_ZOOM,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Opening view of a Julia page, centred on the origin.
    pub fn default_julia(width: u32, height: u32) -> Self {
        Self {
            center: Complex::ZERO,
            zoom: DEFAULT_ZOOM,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Plane units per physical pixel.
    #[inline]
    pub fn scale(&self) -> f64 {
        1.0 / self.zoom / self.width.min(self.height) as f64
    }

    /// Map fractional screen coordinates to a plane point.
    #[inline]
    pub fn screen_to_plane(&self, px: f64, py: f64) -> Complex {
        let s = self.scale();
        Complex::new(
            self.center.re + (px - self.width as f64 / 2.0) * s,
            self.center.im - (py - self.height as f64 / 2.0) * s,
        )
    }

    /// Inverse of [`screen_to_plane`](Self::screen_to_plane).
    #[inline]
    pub fn plane_to_screen(&self, point: Complex) -> (f64, f64) {
        let zs = self.zoom * self.width.min(self.height) as f64;
        (
            (point.re - self.center.re) * zs + self.width as f64 / 2.0,
            -(point.im - self.center.im) * zs + self.height as f64 / 2.0,
        )
    }

    /// Plane point at the centre of pixel `(x, y)`.
    #[inline]
    pub fn pixel_center(&self, x: u32, y: u32) -> Complex {
        self.screen_to_plane(x as f64 + 0.5, y as f64 + 0.5)
    }

    /// Move `point` opposite to a drag of `(dx, dy)` pixels, so that the
    /// content follows the pointer.
    #[inline]
    pub fn pan_point(&self, point: Complex, dx: f64, dy: f64) -> Complex {
        let s = self.scale();
        Complex::new(point.re - dx * s, point.im + dy * s)
    }

    /// Drag the view by `(dx, dy)` pixels.
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Self {
            center: self.pan_point(self.center, dx, dy),
            ..*self
        }
    }

    /// Zoom one step around the screen point `(px, py)`.
    ///
    /// A positive `direction` (wheel down) zooms out, a negative one zooms
    /// in, zero is a no-op. The plane point under `(px, py)` stays put.
    pub fn zoomed_at(&self, px: f64, py: f64, direction: f64) -> Self {
        if direction == 0.0 || direction.is_nan() {
            return *self;
        }
        let zoom = if direction > 0.0 {
            self.zoom / ZOOM_STEP
        } else {
            self.zoom * ZOOM_STEP
        };
        if zoom <= 0.0 || !zoom.is_finite() {
            return *self;
        }

        let anchor = self.screen_to_plane(px, py);
        let next = Self { zoom, ..*self };
        let s = next.scale();
        let center = Complex::new(
            anchor.re - (px - self.width as f64 / 2.0) * s,
            anchor.im + (py - self.height as f64 / 2.0) * s,
        );
        Self { center, ..next }
    }

    /// Pick the plane point under `(px, py)` as the seed of a Julia view.
    pub fn pick(&self, px: f64, py: f64) -> JuliaHandoff {
        JuliaHandoff {
            seed: self.screen_to_plane(px, py),
        }
    }

    /// Same view on a canvas of a different size.
    pub fn resized(&self, width: u32, height: u32) -> crate::Result<Self> {
        Self::new(self.center, self.zoom, width, height)
    }

    /// Resize to a logical canvas size scaled by the device pixel ratio.
    pub fn resized_for(
        &self,
        logical_width: f64,
        logical_height: f64,
        device_pixel_ratio: f64,
    ) -> crate::Result<Self> {
        if device_pixel_ratio <= 0.0 || !device_pixel_ratio.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("device pixel ratio must be positive, got {device_pixel_ratio}"),
            });
        }
        let physical = |logical: f64| -> crate::Result<u32> {
            let px = (logical * device_pixel_ratio).round();
            if !(px >= 1.0 && px <= u32::MAX as f64) {
                return Err(CoreError::InvalidViewport {
                    reason: format!("logical size {logical} maps to {px} physical pixels"),
                });
            }
            Ok(px as u32)
        };
        self.resized(physical(logical_width)?, physical(logical_height)?)
    }

    /// Plane width of the visible region.
    pub fn plane_width(&self) -> f64 {
        self.width as f64 * self.scale()
    }

    /// Plane height of the visible region.
    pub fn plane_height(&self) -> f64 {
        self.height as f64 * self.scale()
    }
}
