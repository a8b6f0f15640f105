use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use escapescope_core::{FormulaKind, IterationParams};
use escapescope_render::{find_palette, CosinePalette, Scene};

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_width")]
    pub default_width: u32,
    #[serde(default = "default_height")]
    pub default_height: u32,
    #[serde(default = "default_supersample")]
    pub supersample: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Name of a built-in palette.
    #[serde(default = "default_palette")]
    pub palette: String,
    /// Palette gamma applied to fresh scenes.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_true")]
    pub restore_last_scene: bool,
    /// Scene of the most recent successful render.
    #[serde(default)]
    pub last_scene: Option<Scene>,
}

fn default_width() -> u32 {
    escapescope_render::scene::DEFAULT_WIDTH
}
fn default_height() -> u32 {
    escapescope_render::scene::DEFAULT_HEIGHT
}
fn default_supersample() -> u32 {
    escapescope_render::scene::DEFAULT_SUPERSAMPLE
}
fn default_max_iterations() -> u32 {
    IterationParams::DEFAULT_MAX_ITERATIONS
}
fn default_palette() -> String {
    "classic".to_string()
}
fn default_gamma() -> f64 {
    0.2
}
fn default_true() -> bool {
    true
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            default_width: default_width(),
            default_height: default_height(),
            supersample: default_supersample(),
            max_iterations: default_max_iterations(),
            palette: default_palette(),
            gamma: default_gamma(),
            restore_last_scene: true,
            last_scene: None,
        }
    }
}

impl AppPreferences {
    /// Load preferences from next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    /// Preferred palette; an unknown name falls back to the default.
    pub fn palette(&self) -> CosinePalette {
        find_palette(&self.palette).unwrap_or_else(|| {
            warn!("Unknown palette {:?} in preferences, using default", self.palette);
            CosinePalette::default()
        })
    }

    /// Starting scene for a command that was given no scene file: the last
    /// rendered scene when restoring is enabled and no other formula was
    /// asked for, otherwise a fresh one.
    pub fn starting_scene(&self, formula: Option<FormulaKind>) -> Scene {
        if let Some(last) = self.last_scene.filter(|_| self.restore_last_scene) {
            if formula.map_or(true, |f| f == last.formula) {
                return last;
            }
            debug!("Formula changed, starting from a fresh scene");
        }
        let mut scene = Scene::new(
            formula.unwrap_or(FormulaKind::Mandelbrot),
            self.default_width,
            self.default_height,
        );
        scene.supersample = self.supersample;
        scene.iteration.max_iterations = self.max_iterations;
        scene.palette = self.palette().with_gamma(self.gamma);
        scene
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}
