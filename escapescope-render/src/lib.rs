pub mod buffer;
pub mod error;
pub mod export;
pub mod palette;
pub mod renderer;
pub mod scene;
pub mod supersample;
pub mod tile;

pub use buffer::RenderBuffer;
pub use error::RenderError;
pub use export::{export_png, read_png_metadata, suggested_file_name, ExportMetadata};
pub use palette::{builtin_palettes, find_palette, CosinePalette, PalettePreset, Rgb};
pub use renderer::{render, RenderCancel, RenderResult};
pub use scene::{render_scene, Scene};
pub use supersample::{Compositor, MAX_SUPERSAMPLE};
pub use tile::TILE_SIZE;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
