use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use escapescope_core::ViewportState;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::supersample::Compositor;
use crate::tile::{build_tile_grid, Tile};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Incrementing the generation signals all in-flight tiles to stop early.
/// The progress counters let a caller report how far a pass has got.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current render by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Read the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new pass with `total` tiles.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A completed frame. Cancelled passes never produce one.
#[derive(Debug)]
pub struct RenderResult {
    pub buffer: RenderBuffer,
    pub elapsed: Duration,
    pub tiles_rendered: usize,
}

// ---------------------------------------------------------------------------
// Per-tile rendering
// ---------------------------------------------------------------------------

/// Color every pixel of one tile. Returns `None` as soon as the generation
/// moves on.
fn render_tile(
    compositor: &Compositor,
    viewport: &ViewportState,
    tile: &Tile,
    cancel: &RenderCancel,
    gen: u64,
) -> Option<Vec<u8>> {
    let span = viewport.scale();
    let mut data = Vec::with_capacity(tile.pixel_count() * 4);
    for py in tile.y..tile.y + tile.height {
        if cancel.generation() != gen {
            return None;
        }
        for px in tile.x..tile.x + tile.width {
            let rgb = compositor.render_pixel(viewport.pixel_center(px, py), span);
            data.extend_from_slice(&rgb.to_rgba8());
        }
    }
    Some(data)
}

// ---------------------------------------------------------------------------
// Full-frame render
// ---------------------------------------------------------------------------

/// Render a full frame using the tiled, multithreaded pipeline.
///
/// Tiles are processed in parallel via Rayon; every pixel is a pure
/// function of `compositor` and `viewport`. If `cancel` advances its
/// generation before all tiles finish, the partial frame is dropped and
/// [`RenderError::Cancelled`] is returned.
pub fn render(
    compositor: &Compositor,
    viewport: &ViewportState,
    cancel: &Arc<RenderCancel>,
) -> crate::Result<RenderResult> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: viewport.width,
            height: viewport.height,
        });
    }

    let start = Instant::now();
    let gen = cancel.generation();

    let tiles = build_tile_grid(viewport.width, viewport.height);
    let tile_count = tiles.len();
    debug!(
        tile_count,
        width = viewport.width,
        height = viewport.height,
        supersample = compositor.supersample(),
        formula = compositor.evaluator().formula().key(),
        "Starting tiled render"
    );
    cancel.reset_progress(tile_count);

    let tile_data: Vec<Option<Vec<u8>>> = tiles
        .par_iter()
        .map(|tile| {
            if cancel.generation() != gen {
                return None;
            }
            let data = render_tile(compositor, viewport, tile, cancel, gen)?;
            cancel.inc_progress();
            Some(data)
        })
        .collect();

    if cancel.generation() != gen {
        let (done, _) = cancel.progress();
        debug!(tiles_done = done, tile_count, "Render superseded");
        return Err(RenderError::Cancelled);
    }

    let mut buffer = RenderBuffer::new(viewport.width, viewport.height);
    let mut tiles_rendered = 0;
    for (tile, data) in tiles.iter().zip(&tile_data) {
        match data {
            Some(d) => {
                buffer.blit_tile(tile, d);
                tiles_rendered += 1;
            }
            None => return Err(RenderError::Cancelled),
        }
    }

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        tiles_rendered,
        width = viewport.width,
        height = viewport.height,
        "Render complete"
    );

    Ok(RenderResult {
        buffer,
        elapsed,
        tiles_rendered,
    })
}
