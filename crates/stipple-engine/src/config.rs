//! Engine configuration loaded from TOML.

use std::path::Path;

use stipple_core::{Color, Result, StippleError};
use stipple_sampler::ColorBoost;
use stipple_sim::Tuning;

/// Top-level engine settings. Everything here has a usable default so an
/// engine can be built without any config file at all.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Grid stride in pixels between sampled points.
    pub gap: f32,
    /// Display width hints are capped here before sampling.
    pub width_cap: f32,
    /// Display width used when no hint and no layout box is available.
    pub default_width: f32,
    /// Paced frame rate for loops driven off this engine.
    pub target_fps: f64,
    /// Clear color painted behind the swarm each frame.
    pub background: Color,
    /// Optional color boost applied to sampled pixels.
    pub boost: Option<ColorBoost>,
    /// Simulation knobs.
    pub tuning: Tuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gap: 6.0,
            width_cap: 2000.0,
            default_width: 800.0,
            target_fps: 60.0,
            background: Color::from_hex(0x0A0A0A),
            boost: None,
            tuning: Tuning::default(),
        }
    }
}

impl EngineConfig {
    /// Read a config file, falling back to defaults for absent keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table: toml::value::Table = toml::from_str(&text)?;
        Self::from_toml(&table)
    }

    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut config = Self::default();

        if let Some(gap) = toml_f32(table, "gap") {
            config.gap = gap;
        }
        if let Some(cap) = toml_f32(table, "width_cap") {
            config.width_cap = cap;
        }
        if let Some(width) = toml_f32(table, "default_width") {
            config.default_width = width;
        }
        if let Some(fps) = toml_f64(table, "fps") {
            config.target_fps = fps;
        }
        if let Some(value) = table.get("background") {
            let text = value.as_str().ok_or_else(|| {
                StippleError::ConfigError("background must be a hex string".into())
            })?;
            config.background = parse_hex_color(text)?;
        }
        if let Some(boost) = table.get("boost").and_then(|v| v.as_table()) {
            let mult = toml_f32(boost, "mult").unwrap_or(1.0);
            let gamma = toml_f32(boost, "gamma").unwrap_or(1.0);
            let boost = ColorBoost { mult, gamma };
            if !boost.is_identity() {
                config.boost = Some(boost);
            }
        }
        if let Some(tuning) = table.get("tuning").and_then(|v| v.as_table()) {
            config.tuning = Tuning::from_toml(tuning);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gap <= 0.0 {
            return Err(StippleError::ConfigError(format!(
                "gap must be positive, got {}",
                self.gap
            )));
        }
        if self.width_cap < 10.0 {
            return Err(StippleError::ConfigError(format!(
                "width_cap must be at least 10, got {}",
                self.width_cap
            )));
        }
        if self.target_fps <= 0.0 {
            return Err(StippleError::ConfigError(format!(
                "fps must be positive, got {}",
                self.target_fps
            )));
        }
        self.tuning.validate()
    }
}

/// Parse `"#RRGGBB"` (leading `#` optional) into an opaque color.
fn parse_hex_color(text: &str) -> Result<Color> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(StippleError::ConfigError(format!(
            "expected 6 hex digits in color, got '{}'",
            text
        )));
    }
    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| StippleError::ConfigError(format!("invalid hex color '{}'", text)))?;
    Ok(Color::from_hex(value))
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(table: &toml::value::Table, key: &str) -> Option<f32> {
    table.get(key).and_then(|v| {
        v.as_float()
            .map(|f| f as f32)
            .or_else(|| v.as_integer().map(|i| i as f32))
    })
}

fn toml_f64(table: &toml::value::Table, key: &str) -> Option<f64> {
    table.get(key).and_then(|v| {
        v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
    })
}
