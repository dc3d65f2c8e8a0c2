use crate::color::Rgba;
use crate::overlay::Viewport;
use crate::starfield::MotionFactors;
use serde::Deserialize;
use std::fs;

/// Top-level configuration for starglow
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default)]
    pub stars: StarsConfig,

    #[serde(default)]
    pub glow: GlowConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

/// Preview loop settings
#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Frames rendered per second (default: 30)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// How long the preview runs in seconds, 0 = until interrupted (default: 10)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Where frames go (default: log)
    #[serde(default)]
    pub output: OutputFormat,
}

/// Frame output format
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One debug summary line per frame
    #[default]
    Log,
    /// One JSON object per frame on stdout
    Json,
}

/// Surface sizes for the two layers
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport")]
    pub stars: Viewport,

    #[serde(default = "default_viewport")]
    pub glow: Viewport,
}

/// Star field settings
#[derive(Debug, Deserialize, Clone)]
pub struct StarsConfig {
    /// Number of stars (default: 1500)
    #[serde(default = "default_star_count")]
    pub count: usize,

    /// Pixels of star motion per degree of camera motion
    #[serde(default)]
    pub motion: MotionFactors,
}

/// Glow halo settings
#[derive(Debug, Deserialize, Clone)]
pub struct GlowConfig {
    /// Opacity of the glow circle (0.0 - 1.0, default: 1.0)
    #[serde(default = "default_intensity")]
    pub intensity: f32,

    #[serde(default)]
    pub colors: ColorStops,
}

/// Scripted camera path and effects for the preview
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DemoConfig {
    /// Degrees of bearing per second
    pub bearing_rate: f64,
    /// Degrees of longitude per second
    pub lng_rate: f64,
    /// Pitch oscillation amplitude in degrees
    pub pitch_amplitude: f64,
    /// Fixed center latitude
    pub lat: f64,
    /// World size in pixels
    pub world_size: f64,
    /// Zoom oscillation as a fraction of world size
    pub zoom_wobble: f64,
    /// Depth of the periodic glow intensity pulse, 0 = off
    pub glow_pulse: f32,
    /// Regenerate the star field every N seconds, 0 = never
    pub regenerate_secs: u64,
}

/// Radial gradient colors of the glow, center to edge
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ColorStops {
    pub inner: Rgba,
    pub middle: Rgba,
    pub outer: Rgba,
    pub fade: Rgba,
}

// Default value functions
fn default_fps() -> u32 {
    30
}
fn default_duration() -> u64 {
    10
}
fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}
fn default_star_count() -> usize {
    1500
}
fn default_intensity() -> f32 {
    1.0
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            duration_secs: default_duration(),
            output: OutputFormat::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            stars: default_viewport(),
            glow: default_viewport(),
        }
    }
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: default_star_count(),
            motion: MotionFactors::default(),
        }
    }
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            intensity: default_intensity(),
            colors: ColorStops::default(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bearing_rate: 6.0,
            lng_rate: 4.0,
            pitch_amplitude: 20.0,
            lat: 20.0,
            world_size: 2048.0,
            zoom_wobble: 0.25,
            glow_pulse: 0.0,
            regenerate_secs: 0,
        }
    }
}

impl Default for ColorStops {
    fn default() -> Self {
        Self {
            inner: Rgba::new(120, 180, 255, 0.9),
            middle: Rgba::new(100, 150, 255, 0.7),
            outer: Rgba::new(70, 120, 255, 0.4),
            fade: Rgba::new(40, 80, 220, 0.0),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Visual parameters the overlay session starts from
    pub fn visual(&self) -> VisualConfig {
        VisualConfig {
            star_count: self.stars.count,
            glow_intensity: self.glow.intensity,
            color_stops: self.glow.colors,
        }
    }
}

/// Runtime-mutable visual parameters of an overlay
#[derive(Debug, Clone, PartialEq)]
pub struct VisualConfig {
    pub star_count: usize,
    pub glow_intensity: f32,
    pub color_stops: ColorStops,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Config::default().visual()
    }
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualConfigUpdate {
    /// Takes effect on the next regeneration
    pub star_count: Option<usize>,
    /// Applied to the live glow immediately
    pub glow_intensity: Option<f32>,
    /// Rebuilds the gradient on the next frame
    pub color_stops: Option<ColorStops>,
}

/// Which follow-up effects an update requires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    pub star_count: bool,
    pub glow_intensity: bool,
    pub color_stops: bool,
}

impl VisualConfig {
    /// Merge the provided fields and report what changed
    pub fn update(&mut self, update: VisualConfigUpdate) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        if let Some(count) = update.star_count {
            changes.star_count = count != self.star_count;
            self.star_count = count;
        }
        if let Some(intensity) = update.glow_intensity {
            changes.glow_intensity = intensity != self.glow_intensity;
            self.glow_intensity = intensity;
        }
        if let Some(stops) = update.color_stops {
            changes.color_stops = stops != self.color_stops;
            self.color_stops = stops;
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.fps, 30);
        assert_eq!(config.general.duration_secs, 10);
        assert_eq!(config.general.output, OutputFormat::Log);
        assert_eq!(config.stars.count, 1500);
        assert_eq!(config.stars.motion, MotionFactors::default());
        assert_eq!(config.glow.intensity, 1.0);
        assert_eq!(config.glow.colors, ColorStops::default());
        assert_eq!(config.viewport.stars, default_viewport());
    }

    #[test]
    fn explicit_sections_override() {
        let config: Config = toml::from_str(
            r#"
            [general]
            fps = 60
            output = "json"

            [viewport]
            stars = { width = 1920, height = 1080 }

            [stars]
            count = 0
            motion = { lng = 4.0 }

            [glow]
            intensity = 0.5
            colors.fade = { r = 0, g = 0, b = 0, a = 0.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.general.fps, 60);
        assert_eq!(config.general.output, OutputFormat::Json);
        assert_eq!(config.viewport.stars, Viewport { width: 1920, height: 1080 });
        // Glow surface keeps its default
        assert_eq!(config.viewport.glow, default_viewport());
        // Zero stars is honored, not replaced by the default
        assert_eq!(config.stars.count, 0);
        assert_eq!(config.stars.motion.lng, 4.0);
        assert_eq!(config.stars.motion.bearing, 0.5);
        assert_eq!(config.glow.intensity, 0.5);
        assert_eq!(config.glow.colors.fade, Rgba::new(0, 0, 0, 0.0));
        assert_eq!(config.glow.colors.inner, ColorStops::default().inner);
    }

    #[test]
    fn example_file_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../starglow.example.toml")).unwrap();
        assert_eq!(config.visual(), VisualConfig::default());
        assert_eq!(config.stars.motion, MotionFactors::default());
        assert_eq!(config.demo.world_size, DemoConfig::default().world_size);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stars]\ncount = 42").unwrap();
        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.stars.count, 42);
        assert_eq!(config.visual().star_count, 42);
    }

    #[test]
    fn load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stars\ncount = ").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn update_merges_present_fields_only() {
        let mut visual = VisualConfig::default();
        let changes = visual.update(VisualConfigUpdate {
            glow_intensity: Some(0.5),
            ..Default::default()
        });
        assert_eq!(
            changes,
            ConfigChanges {
                glow_intensity: true,
                ..Default::default()
            }
        );
        assert_eq!(visual.glow_intensity, 0.5);
        assert_eq!(visual.star_count, 1500);
        assert_eq!(visual.color_stops, ColorStops::default());
    }

    #[test]
    fn update_reports_unchanged_values() {
        let mut visual = VisualConfig::default();
        let changes = visual.update(VisualConfigUpdate {
            star_count: Some(1500),
            glow_intensity: Some(1.0),
            color_stops: Some(ColorStops::default()),
        });
        assert_eq!(changes, ConfigChanges::default());
    }

    #[test]
    fn update_all_fields() {
        let mut visual = VisualConfig::default();
        let stops = ColorStops {
            inner: Rgba::new(255, 255, 255, 1.0),
            ..Default::default()
        };
        let changes = visual.update(VisualConfigUpdate {
            star_count: Some(10),
            glow_intensity: Some(0.25),
            color_stops: Some(stops),
        });
        assert!(changes.star_count && changes.glow_intensity && changes.color_stops);
        assert_eq!(visual.star_count, 10);
        assert_eq!(visual.color_stops.inner, Rgba::new(255, 255, 255, 1.0));
    }
}
