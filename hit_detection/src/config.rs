/*!
Hit-detection settings.

`HitDetectionSettings` is handed to a detector by value when it is built. Nothing here is
global: two detectors may run with different tables or cooldowns side by side.

Settings load from TOML. Every field has a default, so a file only needs the keys it
overrides:

```toml
mode = "ccd"
hit_cooldown = 0.2

[debug]
draw = true
```
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adaptive::{AdaptiveTraceEntry, default_adaptive_table};
use crate::constants::{
    DEFAULT_CCD_HALF_HEIGHT, DEFAULT_CCD_RADIUS, DEFAULT_DEBUG_DURATION, DEFAULT_HIT_COOLDOWN,
};
use crate::debug_draw::Rgba;
use crate::error::{HitDetectionError, Result};

/// Which strategy a detector uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Socket-chain capsule sweeps with adaptive cadence.
    #[default]
    Trace,
    /// One swept capsule fitted to the weapon.
    Ccd,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub draw: bool,
    /// Lifetime of drawn shapes (seconds).
    pub duration: f32,
    pub color: Rgba,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            draw: false,
            duration: DEFAULT_DEBUG_DURATION,
            color: Rgba::RED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcdSettings {
    pub radius: f32,
    /// Used when the capsule cannot be fitted to the first socket group.
    pub half_height: f32,
    /// Scale the capsule per damage motion type when an attack is prepared.
    pub scale_by_motion: bool,
}

impl Default for CcdSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_CCD_RADIUS,
            half_height: DEFAULT_CCD_HALF_HEIGHT,
            scale_by_motion: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitDetectionSettings {
    pub mode: DetectionMode,
    /// Minimum seconds between two accepted hits on one target in multi-hit mode.
    pub hit_cooldown: f32,
    /// Ordered by ascending `speed_threshold`, first threshold 0.
    pub adaptive: Vec<AdaptiveTraceEntry>,
    pub debug: DebugSettings,
    pub ccd: CcdSettings,
}

impl Default for HitDetectionSettings {
    fn default() -> Self {
        Self {
            mode: DetectionMode::default(),
            hit_cooldown: DEFAULT_HIT_COOLDOWN,
            adaptive: default_adaptive_table(),
            debug: DebugSettings::default(),
            ccd: CcdSettings::default(),
        }
    }
}

impl HitDetectionSettings {
    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file on disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate settings for internal consistency.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(HitDetectionError::InvalidSettings(msg));

        if !(self.hit_cooldown >= 0.0) {
            return invalid(format!("hit_cooldown ({}) must be >= 0", self.hit_cooldown));
        }

        let Some(first) = self.adaptive.first() else {
            return invalid("adaptive table must not be empty".into());
        };
        if first.speed_threshold != 0.0 {
            return invalid(format!(
                "first adaptive threshold ({}) must be 0",
                first.speed_threshold
            ));
        }
        for (i, entry) in self.adaptive.iter().enumerate() {
            if !(entry.cadence_seconds > 0.0) {
                return invalid(format!("adaptive[{i}].cadence_seconds must be positive"));
            }
            if entry.interpolation_steps == 0 {
                return invalid(format!("adaptive[{i}].interpolation_steps must be >= 1"));
            }
        }
        for pair in self.adaptive.windows(2) {
            if pair[1].speed_threshold < pair[0].speed_threshold {
                return invalid(format!(
                    "adaptive thresholds must ascend ({} after {})",
                    pair[1].speed_threshold, pair[0].speed_threshold
                ));
            }
        }

        if !(self.ccd.radius > 0.0) || !(self.ccd.half_height >= 0.0) {
            return invalid("ccd radius must be positive and half_height non-negative".into());
        }
        if !(self.debug.duration >= 0.0) {
            return invalid("debug duration must be >= 0".into());
        }

        Ok(())
    }
}
