use crate::tile::Tile;

/// An RGBA pixel buffer representing one finished frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Copy a tile's RGBA data into the correct position in the buffer.
    pub fn blit_tile(&mut self, tile: &Tile, tile_pixels: &[u8]) {
        debug_assert_eq!(tile_pixels.len(), tile.pixel_count() * 4);
        let stride = self.width as usize * 4;
        let row_len = tile.width as usize * 4;
        for row in 0..tile.height as usize {
            let src_start = row * row_len;
            let dst_start = (tile.y as usize + row) * stride + tile.x as usize * 4;
            self.pixels[dst_start..dst_start + row_len]
                .copy_from_slice(&tile_pixels[src_start..src_start + row_len]);
        }
    }

    /// RGBA value of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = RenderBuffer::new(4, 4);
        assert_eq!(buf.pixels.len(), 4 * 4 * 4);
        for chunk in buf.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn blit_tile_writes_correct_region() {
        let mut buf = RenderBuffer::new(8, 8);
        let tile = Tile {
            x: 2,
            y: 1,
            width: 3,
            height: 2,
        };
        let red = [255, 0, 0, 255].repeat(tile.pixel_count());
        buf.blit_tile(&tile, &red);

        assert_eq!(buf.pixel(2, 1), [255, 0, 0, 255]);
        assert_eq!(buf.pixel(4, 2), [255, 0, 0, 255]);
        assert_eq!(buf.pixel(5, 1), [0, 0, 0, 255]);
        assert_eq!(buf.pixel(2, 3), [0, 0, 0, 255]);
    }
}
