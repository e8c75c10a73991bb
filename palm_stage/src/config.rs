//! Stage configuration.
//!
//! Every threshold, duration and screen dimension the controller uses lives
//! here.  Defaults reproduce the tuned constants; a RON file can override
//! any subset of them:
//!
//! ```ron
//! (
//!     timing: (palm_hold_ms: 800),
//!     zone: (width: 200.0, height: 200.0),
//! )
//! ```

use std::fs;
use std::path::Path;

use hand_landmarks::{
    DeletionZone, PerspectiveCamera, Viewport, INDEX_CLOSE_THRESHOLD, OPEN_PALM_THRESHOLD,
    PINCH_THRESHOLD,
};
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, DEFAULT_CARD_COLOR, NEON_PALETTE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Normalized-unit thresholds for the geometric predicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    pub pinch:       f32,
    pub open_palm:   f32,
    pub index_close: f32,
    /// World-space radius within which a pinch grabs the nearest entity.
    pub grab_radius: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            pinch:       PINCH_THRESHOLD,
            open_palm:   OPEN_PALM_THRESHOLD,
            index_close: INDEX_CLOSE_THRESHOLD,
            grab_radius: 1.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// How long an open palm must be held before a card spawns.
    pub palm_hold_ms:     u64,
    /// Minimum gap between two palm-hold spawns.
    pub palm_cooldown_ms: u64,
    pub card_scale_in_ms: u64,
    pub text_fade_ms:     u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            palm_hold_ms:     1000,
            palm_cooldown_ms: 2000,
            card_scale_in_ms: 180,
            text_fade_ms:     300,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub width:           f32,
    pub height:          f32,
    /// Starting scale of the spawn scale-in.
    pub spawn_scale:     f32,
    pub default_message: String,
    pub default_color:   Rgb,
}

impl Default for CardConfig {
    fn default() -> Self {
        CardConfig {
            width:           2.8,
            height:          1.8,
            spawn_scale:     0.01,
            default_message: "Hi ! (^-^)/".to_string(),
            default_color:   DEFAULT_CARD_COLOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub palette:       Vec<Rgb>,
    /// Radians added to x and y rotation per render tick.
    pub rotation_step: f32,
    /// Fixed seed for geometry selection; `None` seeds from entropy.
    pub seed:          Option<u64>,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        ShapeConfig {
            palette:       NEON_PALETTE.to_vec(),
            rotation_step: 0.01,
            seed:          None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StageConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub thresholds: GestureThresholds,
    pub timing:     Timing,
    pub viewport:   Viewport,
    pub camera:     PerspectiveCamera,
    pub zone:       DeletionZone,
    pub card:       CardConfig,
    pub shapes:     ShapeConfig,
}

impl StageConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: StageConfig = ron::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("    ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        for (name, v) in [
            ("pinch", t.pinch),
            ("open_palm", t.open_palm),
            ("index_close", t.index_close),
            ("grab_radius", t.grab_radius),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::Invalid(format!("threshold {} must be positive, got {}", name, v)));
            }
        }
        if self.timing.palm_hold_ms == 0 {
            return Err(ConfigError::Invalid("palm_hold_ms must be non-zero".into()));
        }
        if self.viewport.width < 1.0 || self.viewport.height < 1.0 {
            return Err(ConfigError::Invalid("viewport must be at least 1×1".into()));
        }
        let z = &self.zone;
        if z.width + z.margin_right > self.viewport.width
            || z.height + z.margin_bottom > self.viewport.height
        {
            return Err(ConfigError::Invalid("deletion zone does not fit the viewport".into()));
        }
        if !(self.camera.fov_y_deg > 0.0 && self.camera.fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid(format!("fov {} out of range", self.camera.fov_y_deg)));
        }
        if self.shapes.palette.is_empty() {
            return Err(ConfigError::Invalid("shape palette is empty".into()));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
