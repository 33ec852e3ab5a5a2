//! Configuration persistence for capture settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{CornerStyle, ImageFormat, PaddingSpec};

/// Capture settings persisted between sessions.
///
/// The settle delays and stuck-scroll thresholds are empirical tuning values;
/// they are kept configurable rather than derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Pause after each scroll before capturing, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause before the first capture, after overflow styles change
    #[serde(default = "default_initial_settle_delay_ms")]
    pub initial_settle_delay_ms: u64,
    /// Animation frames to wait after the settle delay
    #[serde(default = "default_animation_frames")]
    pub animation_frames: u32,
    /// Scroll movement below this counts as no progress
    #[serde(default = "default_stuck_scroll_threshold_px")]
    pub stuck_scroll_threshold_px: f64,
    /// Consecutive no-progress scrolls before the loop gives up
    #[serde(default = "default_stuck_scroll_attempts")]
    pub stuck_scroll_attempts: u32,
    /// Distance from the content end that still counts as the bottom
    #[serde(default = "default_bottom_tolerance_px")]
    pub bottom_tolerance_px: f64,
    /// Upper bound on frames in a scrolling capture
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    /// Extra area captured around element and region targets, in CSS pixels
    #[serde(default)]
    pub margin_px: f64,
    /// Hide fixed/sticky elements so they do not repeat in every tile
    #[serde(default = "default_true")]
    pub hide_fixed_elements: bool,
    /// Leave fixed elements visible for the first frame
    #[serde(default = "default_true")]
    pub keep_fixed_in_first_frame: bool,
    /// Set `overflow: hidden` on the body and container while capturing
    #[serde(default = "default_true")]
    pub hide_scrollbars: bool,
    /// Output format
    #[serde(default)]
    pub format: ImageFormat,
    /// Encoder quality for lossy formats (0-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub padding: PaddingSpec,
    #[serde(default)]
    pub corners: CornerStyle,
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_initial_settle_delay_ms() -> u64 {
    300
}

fn default_animation_frames() -> u32 {
    2
}

fn default_stuck_scroll_threshold_px() -> f64 {
    5.0
}

fn default_stuck_scroll_attempts() -> u32 {
    3
}

fn default_bottom_tolerance_px() -> f64 {
    10.0
}

fn default_max_frames() -> u32 {
    200
}

fn default_true() -> bool {
    true
}

fn default_quality() -> u8 {
    92
}

impl CaptureConfig {
    /// Directory name under the user config dir
    pub const ID: &'static str = "scrollshot";

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn initial_settle_delay(&self) -> Duration {
        Duration::from_millis(self.initial_settle_delay_ms)
    }

    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:#}", err);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            log::error!("Could not determine config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:#}", err);
        }
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            initial_settle_delay_ms: default_initial_settle_delay_ms(),
            animation_frames: default_animation_frames(),
            stuck_scroll_threshold_px: default_stuck_scroll_threshold_px(),
            stuck_scroll_attempts: default_stuck_scroll_attempts(),
            bottom_tolerance_px: default_bottom_tolerance_px(),
            max_frames: default_max_frames(),
            margin_px: 0.0,
            hide_fixed_elements: true,
            keep_fixed_in_first_frame: true,
            hide_scrollbars: true,
            format: ImageFormat::Png,
            quality: default_quality(),
            padding: PaddingSpec::default(),
            corners: CornerStyle::default(),
        }
    }
}
