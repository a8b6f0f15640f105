use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use escapescope_core::{Complex, FormulaKind, ViewportState};
use escapescope_render::{
    builtin_palettes, export_png, find_palette, suggested_file_name, ExportMetadata, RenderResult,
    Scene,
};

use crate::error::{AppError, Result};
use crate::preferences::AppPreferences;
use crate::render_worker::RenderWorker;
use crate::session::{Gesture, Session};

#[derive(Parser, Debug)]
#[command(
    name = "escapescope",
    version,
    about = "Escape-time fractal renderer (Mandelbrot, Julia, Tricorn, Burning Ship, Magnet)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a scene to a PNG file
    Render {
        #[command(flatten)]
        scene: SceneArgs,
        /// Output file (default: images/<suggested name> next to the binary)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the final scene as JSON
        #[arg(long)]
        save_scene: Option<PathBuf>,
    },
    /// Print the Julia seed under a pixel of the scene as JSON
    Pick {
        #[command(flatten)]
        scene: SceneArgs,
        /// Pixel x, in physical pixels from the left edge
        x: f64,
        /// Pixel y, in physical pixels from the top edge
        y: f64,
        /// Write the companion Julia scene as JSON
        #[arg(long)]
        companion: Option<PathBuf>,
    },
    /// Apply a JSON gesture script to a scene and render the result
    Replay {
        #[command(flatten)]
        scene: SceneArgs,
        /// JSON array of gestures
        script: PathBuf,
        /// Output file (default: images/<suggested name> next to the binary)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the built-in palettes
    Palettes {
        /// Number of swatches per palette
        #[arg(long, default_value_t = 8)]
        swatches: usize,
    },
}

/// Scene selection and overrides shared by the rendering commands.
#[derive(Args, Debug, Default)]
pub struct SceneArgs {
    /// Scene JSON file to start from
    #[arg(long)]
    pub scene: Option<PathBuf>,
    /// Formula: mandelbrot, julia, tricorn, burning_ship, magnet_type1, magnet_type2
    #[arg(short, long)]
    pub formula: Option<FormulaKind>,
    /// Render the Julia set for this seed, as `re,im`
    #[arg(long, value_parser = parse_complex, allow_hyphen_values = true)]
    pub julia: Option<Complex>,
    /// Seed parameter without changing the mode, as `re,im`
    #[arg(long, value_parser = parse_complex, allow_hyphen_values = true, conflicts_with = "julia")]
    pub seed: Option<Complex>,
    /// View centre, as `re,im`
    #[arg(long, value_parser = parse_complex, allow_hyphen_values = true)]
    pub center: Option<Complex>,
    #[arg(long)]
    pub zoom: Option<f64>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub max_iterations: Option<u32>,
    #[arg(long)]
    pub bailout: Option<f64>,
    #[arg(long)]
    pub exponent: Option<f64>,
    /// Sub-samples per pixel side
    #[arg(long)]
    pub supersample: Option<u32>,
    /// Built-in palette name; the current gamma is kept
    #[arg(long)]
    pub palette: Option<String>,
    #[arg(long)]
    pub gamma: Option<f64>,
    /// Palette phase offset
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<f64>,
}

/// Parse `re,im` (spaces and surrounding parentheses allowed).
pub fn parse_complex(s: &str) -> std::result::Result<Complex, String> {
    let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
    let (re, im) = trimmed
        .split_once(',')
        .ok_or_else(|| format!("expected `re,im`, got {s:?}"))?;
    let part = |p: &str| {
        p.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number {p:?}: {e}"))
    };
    Ok(Complex::new(part(re)?, part(im)?))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| AppError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl SceneArgs {
    /// Resolve the starting scene and apply every override.
    pub fn resolve(&self, prefs: &AppPreferences) -> Result<Scene> {
        let mut scene = match &self.scene {
            Some(path) => {
                let mut scene: Scene = read_json(path)?;
                if let Some(f) = self.formula {
                    scene.formula = f;
                }
                scene
            }
            None => prefs.starting_scene(self.formula),
        };

        if let Some(seed) = self.julia {
            scene.iteration = scene.iteration.into_julia(seed);
        }
        if let Some(seed) = self.seed {
            scene.iteration.seed = seed;
        }
        if let Some(v) = self.max_iterations {
            scene.iteration.max_iterations = v;
        }
        if let Some(v) = self.bailout {
            scene.iteration.bailout = v;
        }
        if let Some(v) = self.exponent {
            scene.iteration.exponent = v;
        }
        if let Some(v) = self.supersample {
            scene.supersample = v;
        }
        if let Some(name) = &self.palette {
            let preset = find_palette(name).ok_or_else(|| AppError::UnknownPalette(name.clone()))?;
            scene.palette = preset.with_gamma(scene.palette.gamma);
        }
        if let Some(v) = self.gamma {
            scene.palette.gamma = v;
        }
        if let Some(v) = self.offset {
            scene.palette.offset = v;
        }

        let vp = scene.viewport;
        scene.viewport = ViewportState::new(
            self.center.unwrap_or(vp.center),
            self.zoom.unwrap_or(vp.zoom),
            self.width.unwrap_or(vp.width),
            self.height.unwrap_or(vp.height),
        )?;

        // Surface configuration errors before any work is scheduled.
        scene.compositor()?;
        Ok(scene)
    }
}

pub fn run(cli: Cli, prefs: &mut AppPreferences) -> Result<()> {
    match cli.command {
        Command::Render {
            scene,
            output,
            save_scene,
        } => {
            let scene = scene.resolve(prefs)?;
            let frame = render_once(scene)?;
            let path = write_frame(&scene, &frame, output)?;
            if let Some(scene_path) = save_scene {
                write_json(&scene_path, &scene)?;
                info!("Saved scene to {}", scene_path.display());
            }
            remember(prefs, scene);
            println!("{}", path.display());
        }
        Command::Pick {
            scene,
            x,
            y,
            companion,
        } => {
            let scene = scene.resolve(prefs)?;
            let handoff = scene.viewport.pick(x, y);
            info!(seed = %handoff.seed, "Picked Julia seed");
            if let Some(path) = companion {
                write_json(&path, &scene.julia_companion(handoff))?;
                info!("Saved companion scene to {}", path.display());
            }
            println!("{}", serde_json::to_string(&handoff)?);
        }
        Command::Replay {
            scene,
            script,
            output,
        } => {
            let scene = scene.resolve(prefs)?;
            let gestures: Vec<Gesture> = read_json(&script)?;
            let (final_scene, frame) = replay(scene, &gestures)?;
            let path = write_frame(&final_scene, &frame, output)?;
            remember(prefs, final_scene);
            println!("{}", path.display());
        }
        Command::Palettes { swatches } => {
            for preset in builtin_palettes() {
                let strip: Vec<String> = preset
                    .palette
                    .preview_colors(swatches.max(1))
                    .into_iter()
                    .map(|c| c.to_hex())
                    .collect();
                println!("{:<10} {}", preset.name, strip.join(" "));
            }
        }
    }
    Ok(())
}

fn render_once(scene: Scene) -> Result<RenderResult> {
    let mut worker = RenderWorker::spawn()?;
    worker.request(scene)?;
    let frame = worker.wait_latest();
    worker.shutdown();
    frame
}

/// Feed `gestures` through a session, requesting a frame after every change
/// the way an interactive front end would, and return the last frame. A
/// double-click in parameter space moves on to the companion Julia view.
pub fn replay(scene: Scene, gestures: &[Gesture]) -> Result<(Scene, RenderResult)> {
    let mut session = Session::new(scene);
    let mut worker = RenderWorker::spawn()?;
    let mut requests = 0u64;

    if let Some(snapshot) = session.take_render_request() {
        worker.request(snapshot)?;
        requests += 1;
    }
    for &gesture in gestures {
        if let Some(handoff) = session.apply(gesture)? {
            info!(seed = %handoff.seed, "Opened Julia view");
            // Later gestures drive the new view; the parameter-space view is
            // left behind untouched.
            session = session.companion(handoff);
        }
        if let Some(snapshot) = session.take_render_request() {
            worker.request(snapshot)?;
            requests += 1;
        }
    }

    let frame = worker.wait_latest();
    worker.shutdown();
    let frame = frame?;
    debug!(gestures = gestures.len(), requests, "Replay finished");
    Ok((*session.scene(), frame))
}

fn write_frame(scene: &Scene, frame: &RenderResult, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = output
        .unwrap_or_else(|| crate::app_dir::images_directory().join(suggested_file_name(scene)));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AppError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    export_png(&frame.buffer, &path, &ExportMetadata::from_scene(scene))?;
    info!(
        elapsed_ms = frame.elapsed.as_millis(),
        path = %path.display(),
        "Saved image"
    );
    Ok(path)
}

fn remember(prefs: &mut AppPreferences, scene: Scene) {
    if prefs.restore_last_scene {
        prefs.last_scene = Some(scene);
        prefs.save();
    }
}
