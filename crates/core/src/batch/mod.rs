//! Per-song fan-out: resolve a time source, generate, rewrite, persist.
//!
//! Every content problem (missing file, empty source, bad JSON, bad audio)
//! becomes a report entry. Only failures outside a single item, such as an
//! unreadable root directory or a failed write, end the run.

use std::path::Path;

use rand::Rng;
use tracing::{info, warn};

use crate::{
    assets::discover_songs, timeline, BatchReport, BeatTracker, BeatUnits, EventGenerator,
    ItemStatus, LightingConfig, LightingError, MapDocument, Result, SongFolder, TimePoints,
    TimeSourceKind,
};

/// Drives one lighting run over a root directory of song folders.
#[derive(Debug)]
pub struct BatchDriver<R, T> {
    generator: EventGenerator,
    rng: R,
    tracker: T,
    dry_run: bool,
}

impl<R: Rng, T: BeatTracker> BatchDriver<R, T> {
    pub fn new(config: LightingConfig, rng: R, tracker: T) -> Result<Self> {
        Ok(Self {
            generator: EventGenerator::new(config)?,
            rng,
            tracker,
            dry_run: false,
        })
    }

    /// When set, files are analysed and reported but never written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &LightingConfig {
        self.generator.config()
    }

    pub fn run(&mut self, root: &Path) -> Result<BatchReport> {
        let songs = discover_songs(root)?;
        info!(root = %root.display(), songs = songs.len(), "starting lighting run");

        let mut report = BatchReport::new();
        for song in &songs {
            self.process_song(song, &mut report)?;
        }

        info!(
            processed = report.count(ItemStatus::Processed),
            skipped = report.skipped().count(),
            "lighting run finished"
        );
        Ok(report)
    }

    /// Handles every selected difficulty of one song folder.
    pub fn process_song(&mut self, song: &SongFolder, report: &mut BatchReport) -> Result<()> {
        let shared = match self.config().source {
            TimeSourceKind::Notes => None,
            TimeSourceKind::Beats => match self.song_beats(song) {
                Ok(points) => Some(points),
                Err(LightingError::MissingAsset { path }) => {
                    warn!(song = %song.path().display(), "no song.ogg or song.egg, skipping song");
                    report.record(
                        song.path(),
                        ItemStatus::SkippedNoAudio,
                        format!("missing {}", path.display()),
                    );
                    return Ok(());
                }
                Err(err) => return skip(report, song.path(), err),
            },
        };

        let difficulties = self.config().difficulties.clone();
        for difficulty in difficulties {
            let path = match song.difficulty_file(difficulty) {
                Ok(path) => path,
                Err(err) => {
                    skip(report, &song.difficulty_path(difficulty), err)?;
                    continue;
                }
            };

            match self.light_file(&path, shared.as_ref()) {
                Ok(count) => {
                    info!(path = %path.display(), events = count, "lighting written");
                    report.record(&path, ItemStatus::Processed, format!("{count} events"));
                }
                Err(err) => skip(report, &path, err)?,
            }
        }
        Ok(())
    }

    /// Replaces the lighting track of one difficulty file and returns the
    /// number of events written. Without shared `points` the file's own note
    /// timings are used; an empty source leaves the file untouched.
    pub fn light_file(&mut self, path: &Path, points: Option<&TimePoints>) -> Result<usize> {
        let document = MapDocument::read(path)?;
        let notes;
        let points = match points {
            Some(points) => points,
            None => {
                notes = timeline::note_times(&document, path)?;
                &notes
            }
        };

        let events = self.generator.generate(points, &mut self.rng);
        if events.is_empty() {
            return Err(LightingError::EmptySource {
                path: path.to_path_buf(),
            });
        }

        let updated = document.with_events(&events)?;
        if !self.dry_run {
            updated.write(path)?;
        }
        Ok(events.len())
    }

    fn song_beats(&mut self, song: &SongFolder) -> Result<TimePoints> {
        let audio = song.audio_file()?;
        let (points, tempo) = timeline::beat_times(&mut self.tracker, &audio)?;

        match self.config().beat_units {
            BeatUnits::Seconds => Ok(points),
            BeatUnits::MapBeats => match song.declared_bpm() {
                Some(bpm) => Ok(points.scaled(bpm / 60.0)),
                None => {
                    warn!(
                        song = %song.path().display(),
                        detected_bpm = ?tempo,
                        "no declared tempo, keeping beats in seconds"
                    );
                    Ok(points)
                }
            },
        }
    }
}

/// Records a recoverable error against `path`, or hands a fatal one back.
fn skip(report: &mut BatchReport, path: &Path, err: LightingError) -> Result<()> {
    match ItemStatus::for_error(&err) {
        Some(status) => {
            warn!(path = %path.display(), %status, reason = %err, "skipping");
            report.record(path, status, err.to_string());
            Ok(())
        }
        None => Err(err),
    }
}
