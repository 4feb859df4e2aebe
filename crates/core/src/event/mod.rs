use serde::{Deserialize, Serialize};

/// Colour value that switches a light group off.
pub const OFF: u8 = 0;

/// A single timestamped lighting instruction, serialised in the map's
/// `_events` record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingEvent {
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_type")]
    pub light_type: u8,
    #[serde(rename = "_value")]
    pub value: u8,
    /// Effect duration or fade parameter consumed by the game's renderer.
    #[serde(
        rename = "_floatValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub float_value: Option<f64>,
}

impl LightingEvent {
    pub fn on(time: f64, light_type: u8, value: u8) -> Self {
        Self {
            time,
            light_type,
            value,
            float_value: None,
        }
    }

    pub fn off(time: f64, light_type: u8) -> Self {
        Self::on(time, light_type, OFF)
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.float_value = Some(duration);
        self
    }

    pub fn is_off(&self) -> bool {
        self.value == OFF
    }
}

/// Stable chronological sort, used when the configuration asks for it.
pub fn sort_by_time(events: &mut [LightingEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}
