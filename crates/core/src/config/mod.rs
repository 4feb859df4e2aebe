use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Difficulty, LightingError, Result};

/// Lower bound of every randomly drawn effect duration.
pub const MIN_DRAWN_DURATION: f64 = 0.1;

/// Highest light group index understood by the game.
pub const MAX_LIGHT_TYPE: u8 = 4;

/// Highest colour value understood by the game. `0` is reserved for "off".
pub const MAX_COLOR: u8 = 5;

/// Rule set that turns time points into lighting events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationPolicy {
    /// One event per time point, no duration.
    Simple,
    /// One event per time point with a clamped duration that is only attached
    /// when [`LightingConfig::attach_clamped_duration`] is set.
    #[default]
    Clamped,
    /// On event followed by an off event, skipping points that crowd the
    /// previously accepted one.
    Paired,
    /// One event per time point carrying an unclamped random duration.
    WithDuration,
}

/// Where the time points for a difficulty file come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimeSourceKind {
    /// Note timings already present in the difficulty file.
    #[default]
    Notes,
    /// Beats detected in the song's audio asset.
    Beats,
}

/// Unit that detected beats are expressed in once they reach the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BeatUnits {
    /// Keep the tracker's seconds untouched.
    #[default]
    Seconds,
    /// Convert seconds to map beats using the song's declared tempo.
    MapBeats,
}

/// Top-level configuration structure for a lighting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_types: Vec<u8>,
    pub colors: Vec<u8>,
    pub min_effect_duration: f64,
    pub max_effect_duration: f64,
    pub policy: GenerationPolicy,
    /// Attach the clamped duration under [`GenerationPolicy::Clamped`].
    /// Off by default, matching the historical output where it was dropped.
    pub attach_clamped_duration: bool,
    /// Sort the final event list by time instead of keeping generation order.
    pub sort_output: bool,
    pub atmosphere: AtmosphereConfig,
    pub source: TimeSourceKind,
    pub beat_units: BeatUnits,
    pub difficulties: Vec<Difficulty>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_types: vec![0, 1, 2, 3, 4],
            colors: vec![1, 2, 3, 4, 5],
            min_effect_duration: 0.1,
            max_effect_duration: 2.0,
            policy: GenerationPolicy::default(),
            attach_clamped_duration: false,
            sort_output: false,
            atmosphere: AtmosphereConfig::default(),
            source: TimeSourceKind::default(),
            beat_units: BeatUnits::default(),
            difficulties: Difficulty::ALL.to_vec(),
        }
    }
}

impl LightingConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the generator relies on.
    pub fn validate(&self) -> Result<()> {
        if self.light_types.is_empty() {
            return Err(invalid("light type set must not be empty"));
        }
        if let Some(ty) = self.light_types.iter().find(|ty| **ty > MAX_LIGHT_TYPE) {
            return Err(invalid(format!(
                "light type {ty} is outside 0..={MAX_LIGHT_TYPE}"
            )));
        }
        if self.colors.is_empty() {
            return Err(invalid("color set must not be empty"));
        }
        if let Some(color) = self
            .colors
            .iter()
            .find(|color| **color == 0 || **color > MAX_COLOR)
        {
            return Err(invalid(format!(
                "color {color} is outside 1..={MAX_COLOR}"
            )));
        }
        if !self.min_effect_duration.is_finite() || self.min_effect_duration < 0.0 {
            return Err(invalid("min_effect_duration must be a non-negative number"));
        }
        if !self.max_effect_duration.is_finite() || self.max_effect_duration < MIN_DRAWN_DURATION
        {
            return Err(invalid(format!(
                "max_effect_duration must be at least {MIN_DRAWN_DURATION}"
            )));
        }
        if self.min_effect_duration > self.max_effect_duration {
            return Err(invalid(
                "min_effect_duration must not exceed max_effect_duration",
            ));
        }
        self.atmosphere.validate()?;
        if self.difficulties.is_empty() {
            return Err(invalid("at least one difficulty must be selected"));
        }
        Ok(())
    }
}

/// Parameters for the intro events that are not tied to any time point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub enabled: bool,
    pub start: f64,
    pub window: f64,
    pub count: usize,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: 0.0,
            window: 4.0,
            count: 5,
        }
    }
}

impl AtmosphereConfig {
    fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(invalid("atmosphere start must be a non-negative number"));
        }
        if !self.window.is_finite() || self.window < 0.0 {
            return Err(invalid("atmosphere window must be a non-negative number"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> LightingError {
    LightingError::InvalidConfig(msg.into())
}
