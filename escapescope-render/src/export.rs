//! PNG export with embedded metadata (tEXt chunks).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::scene::Scene;

const KEY_PREFIX: &str = "EscapeScope.";

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub formula: String,
    pub julia_mode: bool,
    pub seed_re: f64,
    pub seed_im: f64,
    pub center_re: f64,
    pub center_im: f64,
    pub zoom: f64,
    pub max_iterations: u32,
    pub bailout: f64,
    pub exponent: f64,
    pub supersample: u32,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            formula: scene.formula.key().to_string(),
            julia_mode: scene.julia_mode(),
            seed_re: scene.iteration.seed.re,
            seed_im: scene.iteration.seed.im,
            center_re: scene.viewport.center.re,
            center_im: scene.viewport.center.im,
            zoom: scene.viewport.zoom,
            max_iterations: scene.iteration.max_iterations,
            bailout: scene.iteration.bailout,
            exponent: scene.iteration.exponent,
            supersample: scene.supersample,
            width: scene.viewport.width,
            height: scene.viewport.height,
        }
    }

    fn description(&self) -> String {
        let mut desc = format!(
            "{} - Center: {} {}i, Zoom: {}, Iterations: {}",
            self.formula, self.center_re, self.center_im, self.zoom, self.max_iterations,
        );
        if self.julia_mode {
            desc.push_str(&format!(", Julia C: {} {}i", self.seed_re, self.seed_im));
        }
        desc
    }

    fn pairs(&self) -> Vec<(String, String)> {
        [
            ("Formula", self.formula.clone()),
            ("JuliaMode", self.julia_mode.to_string()),
            ("SeedRe", self.seed_re.to_string()),
            ("SeedIm", self.seed_im.to_string()),
            ("CenterRe", self.center_re.to_string()),
            ("CenterIm", self.center_im.to_string()),
            ("Zoom", self.zoom.to_string()),
            ("MaxIterations", self.max_iterations.to_string()),
            ("Bailout", self.bailout.to_string()),
            ("Exponent", self.exponent.to_string()),
            ("Supersample", self.supersample.to_string()),
            ("Resolution", format!("{}x{}", self.width, self.height)),
        ]
        .into_iter()
        .map(|(k, v)| (format!("{KEY_PREFIX}{k}"), v))
        .collect()
    }
}

/// File name offered when saving a scene:
/// `"<Formula>[ Julia] (seed_re,seed_im) (center_re,center_im).png"`.
pub fn suggested_file_name(scene: &Scene) -> String {
    let mut name = scene.formula.label().to_string();
    if scene.iteration.julia_mode && !scene.formula.forces_julia_mode() {
        name.push_str(" Julia");
    }
    let seed = scene.iteration.seed;
    let center = scene.viewport.center;
    format!(
        "{name} ({},{}) ({},{}).png",
        seed.re, seed.im, center.re, center.im
    )
}

fn export_err(context: &str) -> impl Fn(png::EncodingError) -> RenderError + '_ {
    move |e| RenderError::Export(format!("{context}: {e}"))
}

/// Write a finished frame as a PNG file with embedded scene metadata.
///
/// Uses the `png` crate directly to inject custom tEXt chunks readable by
/// exiftool and most image viewers.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let file = File::create(path)
        .map_err(|e| RenderError::Export(format!("failed to create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "EscapeScope".to_string())
        .map_err(export_err("failed to add text chunk"))?;
    encoder
        .add_text_chunk("Description".to_string(), metadata.description())
        .map_err(export_err("failed to add text chunk"))?;
    for (key, value) in metadata.pairs() {
        encoder
            .add_text_chunk(key, value)
            .map_err(export_err("failed to add text chunk"))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(export_err("failed to write PNG header"))?;
    png_writer
        .write_image_data(&buffer.pixels)
        .map_err(export_err("failed to write PNG image data"))?;
    png_writer
        .finish()
        .map_err(export_err("failed to finish PNG"))?;

    debug!(
        width = buffer.width,
        height = buffer.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

/// Read back the `EscapeScope.*` text chunks of an exported PNG, keyed
/// without the prefix.
pub fn read_png_metadata(path: &Path) -> crate::Result<BTreeMap<String, String>> {
    let file = File::open(path)
        .map_err(|e| RenderError::Export(format!("failed to open {}: {e}", path.display())))?;
    let reader = png::Decoder::new(file)
        .read_info()
        .map_err(|e| RenderError::Export(format!("failed to decode {}: {e}", path.display())))?;
    Ok(reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .filter_map(|t| {
            t.keyword
                .strip_prefix(KEY_PREFIX)
                .map(|k| (k.to_string(), t.text.clone()))
        })
        .collect())
}
