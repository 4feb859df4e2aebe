//! Core library for rewriting the lighting track of rhythm-game beatmaps.
//!
//! Time points come either from a difficulty file's notes or from beats
//! detected in the song's audio. The [`EventGenerator`] turns them into
//! lighting events under a selectable policy, [`MapDocument`] swaps them into
//! the map's `_events` list, and [`BatchDriver`] fans the work out over a
//! directory of song folders.

pub mod analysis;
pub mod assets;
pub mod audio;
pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod mapping;
pub mod report;
pub mod timeline;

pub use analysis::{
    AnalysisEngine, AnalysisFrame, AnalysisSummary, BeatAnalysis, BeatTracker, OnsetBeatTracker,
};
pub use assets::{Difficulty, SongFolder};
pub use audio::Waveform;
pub use batch::BatchDriver;
pub use config::{AtmosphereConfig, BeatUnits, GenerationPolicy, LightingConfig, TimeSourceKind};
pub use document::MapDocument;
pub use error::{LightingError, Result};
pub use event::LightingEvent;
pub use mapping::{clamp_duration, EventGenerator};
pub use report::{BatchReport, ItemStatus, ReportEntry};
pub use timeline::TimePoints;
