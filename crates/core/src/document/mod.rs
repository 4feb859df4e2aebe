use std::{fs, path::Path};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};

use crate::{LightingError, LightingEvent, Result};

pub const NOTES_KEY: &str = "_notes";
pub const EVENTS_KEY: &str = "_events";
const TIME_KEY: &str = "_time";

/// In-memory difficulty document. Only `_events` is ever rewritten; every
/// other top-level field keeps its value and its position.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    root: Map<String, Value>,
}

impl MapDocument {
    /// Parses a difficulty file's text and checks its top-level shape.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| LightingError::malformed(format!("invalid JSON: {err}")))?;
        Self::from_value(value)
    }

    /// Reads and parses a difficulty file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|err| LightingError::file_io(path, err))?;
        let text = String::from_utf8(bytes).map_err(|err| {
            LightingError::malformed(format!("{}: not UTF-8: {err}", path.display()))
        })?;
        Self::parse(&text).map_err(|err| match err {
            LightingError::MalformedDocument(reason) => {
                LightingError::malformed(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(LightingError::malformed("top level is not an object"));
        };

        for key in [NOTES_KEY, EVENTS_KEY] {
            if let Some(field) = root.get(key) {
                if !field.is_array() {
                    return Err(LightingError::malformed(format!("`{key}` is not an array")));
                }
            }
        }

        Ok(Self { root })
    }

    /// Note timestamps in document order. A missing `_notes` field counts as
    /// an empty note list.
    pub fn note_times(&self) -> Result<Vec<f64>> {
        let Some(Value::Array(notes)) = self.root.get(NOTES_KEY) else {
            return Ok(Vec::new());
        };

        notes
            .iter()
            .enumerate()
            .map(|(index, note)| {
                note.get(TIME_KEY).and_then(Value::as_f64).ok_or_else(|| {
                    LightingError::malformed(format!("note {index} has no numeric `{TIME_KEY}`"))
                })
            })
            .collect()
    }

    /// Number of entries currently stored under `_events`.
    pub fn event_count(&self) -> usize {
        match self.root.get(EVENTS_KEY) {
            Some(Value::Array(events)) => events.len(),
            _ => 0,
        }
    }

    /// Returns a copy whose `_events` is exactly `events`, in order.
    pub fn with_events(&self, events: &[LightingEvent]) -> Result<Self> {
        let events = events
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut root = self.root.clone();
        root.insert(EVENTS_KEY.to_string(), Value::Array(events));
        Ok(Self { root })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Serialises with four-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.root.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|err| LightingError::msg(err.to_string()))
    }

    /// Writes the document through a sibling temporary file so a failed write
    /// never leaves a truncated map behind.
    pub fn write(&self, path: &Path) -> Result<()> {
        let text = self.to_pretty_string()?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        if let Err(err) = fs::write(&tmp, text).and_then(|()| fs::rename(&tmp, path)) {
            // Leftover partial output; it may not exist at all.
            let _ = fs::remove_file(&tmp);
            return Err(LightingError::file_io(path, err));
        }
        Ok(())
    }
}
