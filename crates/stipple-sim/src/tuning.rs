//! Swarm tuning knobs (parsed from TOML)

use stipple_core::{Result, StippleError};

/// The adjustable parameters of the swarm. Everything else about the motion
/// (lerp rates, impulses, lifecycle cutoffs) is fixed by the integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    /// Base draw radius of a settled dot, in pixels
    pub dot_radius: f32,
    /// Per-particle friction is drawn uniformly from [friction_min, friction_max)
    pub friction_min: f32,
    pub friction_max: f32,
    /// Per-particle spring coefficient is drawn from [ease_min, ease_max)
    pub ease_min: f32,
    pub ease_max: f32,
    /// Pointer repulsion radius in pixels
    pub mouse_radius: f32,
    /// Peak repulsion impulse at zero distance
    pub mouse_push: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dot_radius: 2.8,
            friction_min: 0.50,
            friction_max: 0.60,
            ease_min: 0.20,
            ease_max: 0.30,
            mouse_radius: 80.0,
            mouse_push: 15.0,
        }
    }
}

impl Tuning {
    /// Parse a Tuning from a TOML table, falling back to defaults per field
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut tuning = Self::default();

        if let Some(v) = table.get("dot_radius") {
            tuning.dot_radius = toml_f32(v, tuning.dot_radius);
        }
        if let Some(v) = table.get("friction_min") {
            tuning.friction_min = toml_f32(v, tuning.friction_min);
        }
        if let Some(v) = table.get("friction_max") {
            tuning.friction_max = toml_f32(v, tuning.friction_max);
        }
        if let Some(v) = table.get("ease_min") {
            tuning.ease_min = toml_f32(v, tuning.ease_min);
        }
        if let Some(v) = table.get("ease_max") {
            tuning.ease_max = toml_f32(v, tuning.ease_max);
        }
        if let Some(v) = table.get("mouse_radius") {
            tuning.mouse_radius = toml_f32(v, tuning.mouse_radius);
        }
        if let Some(v) = table.get("mouse_push") {
            tuning.mouse_push = toml_f32(v, tuning.mouse_push);
        }

        tuning
    }

    /// Reject values the integrator cannot keep stable
    pub fn validate(&self) -> Result<()> {
        check_range("friction_min", self.friction_min, 0.0, 1.0)?;
        check_range("friction_max", self.friction_max, 0.0, 1.0)?;
        if self.friction_max < self.friction_min {
            return Err(StippleError::ConfigError(
                "friction_max must be >= friction_min".to_string(),
            ));
        }
        check_range("ease_min", self.ease_min, 0.0, 1.0)?;
        check_range("ease_max", self.ease_max, 0.0, 1.0)?;
        if self.ease_max < self.ease_min {
            return Err(StippleError::ConfigError(
                "ease_max must be >= ease_min".to_string(),
            ));
        }
        if self.dot_radius <= 0.0 {
            return Err(StippleError::ConfigError(
                "dot_radius must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value <= min || value >= max {
        return Err(StippleError::ValueOutOfRange {
            field: field.to_string(),
            min: min as f64,
            max: max as f64,
            value: value as f64,
        });
    }
    Ok(())
}

// ── TOML helper (handles integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}
