/// Default tile size in pixels.
pub const TILE_SIZE: u32 = 64;

/// A rectangular tile within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    /// Tile width in pixels (may be smaller at the right edge).
    pub width: u32,
    /// Tile height in pixels (may be smaller at the bottom edge).
    pub height: u32,
}

impl Tile {
    /// Number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Build a row-major grid of tiles covering `width × height` pixels.
pub fn build_tile_grid(width: u32, height: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut y = 0;
    while y < height {
        let th = TILE_SIZE.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = TILE_SIZE.min(width - x);
            tiles.push(Tile {
                x,
                y,
                width: tw,
                height: th,
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_covers_frame_once() {
        let tiles = build_tile_grid(200, 150);
        let mut covered = vec![false; 200 * 150];
        for tile in &tiles {
            for py in tile.y..tile.y + tile.height {
                for px in tile.x..tile.x + tile.width {
                    let idx = py as usize * 200 + px as usize;
                    assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c), "all pixels must be covered");
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let tiles = build_tile_grid(130, 70);
        assert_eq!(tiles.len(), 3 * 2);
        assert!(tiles.iter().all(|t| t.width <= TILE_SIZE && t.height <= TILE_SIZE));
        let last = tiles[tiles.len() - 1];
        assert_eq!((last.x, last.y, last.width, last.height), (128, 64, 2, 6));
    }

    #[test]
    fn single_pixel_frame() {
        assert_eq!(
            build_tile_grid(1, 1),
            vec![Tile {
                x: 0,
                y: 0,
                width: 1,
                height: 1
            }]
        );
    }
}
