use std::path::Path;

use crate::{BeatAnalysis, BeatTracker, LightingError, MapDocument, Result};

/// Ordered sequence of anchor times handed to the generator.
///
/// Producers are not required to sort their output, so [`TimePoints::max`]
/// scans the whole sequence instead of trusting the last element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimePoints {
    points: Vec<f64>,
}

impl TimePoints {
    pub fn new(points: Vec<f64>) -> Self {
        Self { points }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    /// Latest time point, or `None` for an empty sequence.
    pub fn max(&self) -> Option<f64> {
        self.points.iter().copied().reduce(f64::max)
    }

    /// Returns a copy with every point multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.points.iter().map(|time| time * factor).collect())
    }
}

impl From<Vec<f64>> for TimePoints {
    fn from(points: Vec<f64>) -> Self {
        Self::new(points)
    }
}

/// Reads the note timings of a difficulty document, in document order.
///
/// `path` is only used to label the [`LightingError::EmptySource`] error.
pub fn note_times(document: &MapDocument, path: &Path) -> Result<TimePoints> {
    let points = TimePoints::new(document.note_times()?);
    if points.is_empty() {
        return Err(LightingError::EmptySource {
            path: path.to_path_buf(),
        });
    }
    Ok(points)
}

/// Runs the beat tracker over an audio asset and returns its beat times
/// together with the tracker's tempo estimate.
pub fn beat_times<T: BeatTracker + ?Sized>(
    tracker: &mut T,
    audio: &Path,
) -> Result<(TimePoints, Option<f32>)> {
    let BeatAnalysis {
        tempo_bpm,
        beat_times,
    } = tracker.track(audio)?;
    tracing::debug!(path = %audio.display(), beats = beat_times.len(), ?tempo_bpm, "tracked beats");

    if beat_times.is_empty() {
        return Err(LightingError::EmptySource {
            path: audio.to_path_buf(),
        });
    }
    Ok((TimePoints::new(beat_times), tempo_bpm))
}
