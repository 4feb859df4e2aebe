//! End-to-end runs of the batch driver over temporary song folders.

use std::fs;
use std::path::{Path, PathBuf};

use beatmap_lighting_core::{
    BatchDriver, BeatAnalysis, BeatTracker, BeatUnits, GenerationPolicy, ItemStatus,
    LightingConfig, LightingError, MapDocument, Result, TimeSourceKind,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Value};
use tempfile::tempdir;

/// Tracker that returns canned beats and remembers which files it was asked
/// to analyse.
#[derive(Default)]
struct StubTracker {
    beats: Vec<f64>,
    calls: Vec<PathBuf>,
    fail: bool,
}

impl BeatTracker for StubTracker {
    fn track(&mut self, audio: &Path) -> Result<BeatAnalysis> {
        self.calls.push(audio.to_path_buf());
        if self.fail {
            return Err(LightingError::AudioDecode {
                path: audio.to_path_buf(),
                reason: "corrupt".to_string(),
            });
        }
        Ok(BeatAnalysis {
            tempo_bpm: Some(120.0),
            beat_times: self.beats.clone(),
        })
    }
}

fn write_map(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn sample_map(note_times: &[f64]) -> Value {
    let notes: Vec<Value> = note_times
        .iter()
        .map(|time| json!({ "_time": time, "_lineIndex": 1, "_type": 0 }))
        .collect();
    json!({
        "_version": "2.0.0",
        "_notes": notes,
        "_events": [ { "_time": 99.0, "_type": 8, "_value": 0 } ],
        "_obstacles": [ { "_time": 1.0, "_duration": 2.0 } ],
        "_customField": { "author": "mapper" }
    })
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn driver(config: LightingConfig, tracker: StubTracker) -> BatchDriver<StdRng, StubTracker> {
    BatchDriver::new(config, StdRng::seed_from_u64(7), tracker).unwrap()
}

#[test]
fn note_mode_rewrites_events_and_preserves_everything_else() {
    let root = tempdir().unwrap();
    let song = root.path().join("song-a");
    fs::create_dir(&song).unwrap();
    let original = sample_map(&[1.0, 2.0, 3.0]);
    let hard = write_map(&song, "Hard.dat", &original);

    let config = LightingConfig {
        policy: GenerationPolicy::Simple,
        ..Default::default()
    };
    let report = driver(config, StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&hard), Some(ItemStatus::Processed));
    let written = read_json(&hard);
    assert_eq!(written["_notes"], original["_notes"]);
    assert_eq!(written["_obstacles"], original["_obstacles"]);
    assert_eq!(written["_customField"], original["_customField"]);
    assert_eq!(written["_version"], original["_version"]);

    let events = written["_events"].as_array().unwrap();
    // Five atmospheric events followed by one per note.
    assert_eq!(events.len(), 8);
    assert!(events.iter().all(|event| event["_time"] != 99.0));
    let tail: Vec<f64> = events[5..]
        .iter()
        .map(|event| event["_time"].as_f64().unwrap())
        .collect();
    assert_eq!(tail, vec![1.0, 2.0, 3.0]);
}

#[test]
fn missing_difficulties_are_reported_not_fatal() {
    let root = tempdir().unwrap();
    let song = root.path().join("song");
    fs::create_dir(&song).unwrap();
    write_map(&song, "Expert.dat", &sample_map(&[0.5]));

    let report = driver(LightingConfig::default(), StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.count(ItemStatus::Processed), 1);
    assert_eq!(report.count(ItemStatus::SkippedMissing), 3);
    assert_eq!(
        report.status_of(&song.join("Normal.dat")),
        Some(ItemStatus::SkippedMissing)
    );
}

#[test]
fn empty_note_list_leaves_file_byte_identical() {
    let root = tempdir().unwrap();
    let song = root.path().join("quiet");
    fs::create_dir(&song).unwrap();
    let path = song.join("Normal.dat");
    let text = "{\"_notes\": [], \"_events\": [{\"_time\": 1, \"_type\": 0, \"_value\": 1}]}";
    fs::write(&path, text).unwrap();

    let report = driver(LightingConfig::default(), StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&path), Some(ItemStatus::SkippedNoSource));
    assert_eq!(fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn corrupt_document_is_skipped_and_batch_continues() {
    let root = tempdir().unwrap();
    let broken = root.path().join("a-broken");
    let fine = root.path().join("b-fine");
    fs::create_dir(&broken).unwrap();
    fs::create_dir(&fine).unwrap();
    let bad_path = broken.join("Hard.dat");
    fs::write(&bad_path, "{ not json").unwrap();
    let good_path = write_map(&fine, "Hard.dat", &sample_map(&[1.0]));

    let report = driver(LightingConfig::default(), StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&bad_path), Some(ItemStatus::SkippedMalformed));
    assert_eq!(fs::read_to_string(&bad_path).unwrap(), "{ not json");
    assert_eq!(report.status_of(&good_path), Some(ItemStatus::Processed));
}

#[test]
fn beat_mode_shares_one_analysis_per_song() {
    let root = tempdir().unwrap();
    let song = root.path().join("beats");
    fs::create_dir(&song).unwrap();
    fs::write(song.join("song.egg"), b"stub").unwrap();
    let normal = write_map(&song, "Normal.dat", &sample_map(&[]));
    let expert = write_map(&song, "Expert.dat", &sample_map(&[4.0]));

    let config = LightingConfig {
        source: TimeSourceKind::Beats,
        policy: GenerationPolicy::Paired,
        min_effect_duration: 0.1,
        ..Default::default()
    };
    let tracker = StubTracker {
        beats: vec![0.5, 0.55, 1.0, 1.5],
        ..Default::default()
    };
    let mut driver = driver(config, tracker);
    let report = driver.run(root.path()).unwrap();

    // Beats drive generation even when a difficulty has no notes.
    assert_eq!(report.status_of(&normal), Some(ItemStatus::Processed));
    assert_eq!(report.status_of(&expert), Some(ItemStatus::Processed));

    for path in [&normal, &expert] {
        let events = read_json(path)["_events"].as_array().unwrap().clone();
        let offs = events.iter().filter(|event| event["_value"] == 0).count();
        // 0.55 crowds 0.5, leaving three on/off pairs after the intro.
        assert_eq!(offs, 3);
        assert_eq!(events.len(), 5 + 6);
    }
}

#[test]
fn beat_mode_calls_tracker_once_per_song() {
    let root = tempdir().unwrap();
    let song = root.path().join("beats");
    fs::create_dir(&song).unwrap();
    fs::write(song.join("song.ogg"), b"stub").unwrap();
    write_map(&song, "Normal.dat", &sample_map(&[1.0]));
    write_map(&song, "Hard.dat", &sample_map(&[1.0]));

    let config = LightingConfig {
        source: TimeSourceKind::Beats,
        ..Default::default()
    };
    let mut tracker = StubTracker {
        beats: vec![1.0, 2.0],
        ..Default::default()
    };
    let report = BatchDriver::new(config, StdRng::seed_from_u64(1), &mut tracker)
        .unwrap()
        .run(root.path())
        .unwrap();

    assert_eq!(report.count(ItemStatus::Processed), 2);
    assert_eq!(tracker.calls, vec![song.join("song.ogg")]);
}

#[test]
fn beat_mode_without_audio_skips_song() {
    let root = tempdir().unwrap();
    let song = root.path().join("silent");
    fs::create_dir(&song).unwrap();
    let normal = write_map(&song, "Normal.dat", &sample_map(&[1.0]));
    let before = fs::read_to_string(&normal).unwrap();

    let config = LightingConfig {
        source: TimeSourceKind::Beats,
        ..Default::default()
    };
    let report = driver(config, StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&song), Some(ItemStatus::SkippedNoAudio));
    assert_eq!(report.entries().len(), 1);
    assert_eq!(fs::read_to_string(&normal).unwrap(), before);
}

#[test]
fn undecodable_audio_skips_song() {
    let root = tempdir().unwrap();
    let song = root.path().join("corrupt");
    fs::create_dir(&song).unwrap();
    fs::write(song.join("song.ogg"), b"junk").unwrap();
    write_map(&song, "Hard.dat", &sample_map(&[1.0]));

    let config = LightingConfig {
        source: TimeSourceKind::Beats,
        ..Default::default()
    };
    let tracker = StubTracker {
        fail: true,
        ..Default::default()
    };
    let report = driver(config, tracker).run(root.path()).unwrap();

    assert_eq!(report.status_of(&song), Some(ItemStatus::SkippedNoAudio));
    assert_eq!(report.count(ItemStatus::Processed), 0);
}

#[test]
fn map_beat_units_use_declared_tempo() {
    let root = tempdir().unwrap();
    let song = root.path().join("tempo");
    fs::create_dir(&song).unwrap();
    fs::write(song.join("song.ogg"), b"stub").unwrap();
    fs::write(song.join("Info.dat"), r#"{ "_beatsPerMinute": 120 }"#).unwrap();
    let hard = write_map(&song, "Hard.dat", &sample_map(&[]));

    let mut config = LightingConfig {
        source: TimeSourceKind::Beats,
        policy: GenerationPolicy::Simple,
        beat_units: BeatUnits::MapBeats,
        ..Default::default()
    };
    config.atmosphere.enabled = false;
    let tracker = StubTracker {
        beats: vec![0.5, 1.0],
        ..Default::default()
    };
    driver(config, tracker).run(root.path()).unwrap();

    let times: Vec<f64> = read_json(&hard)["_events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["_time"].as_f64().unwrap())
        .collect();
    assert_eq!(times, vec![1.0, 2.0]);
}

#[test]
fn dry_run_writes_nothing() {
    let root = tempdir().unwrap();
    let song = root.path().join("song");
    fs::create_dir(&song).unwrap();
    let hard = write_map(&song, "Hard.dat", &sample_map(&[1.0, 2.0]));
    let before = fs::read_to_string(&hard).unwrap();

    let report = driver(LightingConfig::default(), StubTracker::default())
        .dry_run(true)
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&hard), Some(ItemStatus::Processed));
    assert_eq!(fs::read_to_string(&hard).unwrap(), before);
}

#[test]
fn missing_root_is_fatal() {
    let root = tempdir().unwrap();
    let err = driver(LightingConfig::default(), StubTracker::default())
        .run(&root.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, LightingError::Io(_)));
}

#[test]
fn rewritten_file_parses_as_map_document() {
    let root = tempdir().unwrap();
    let song = root.path().join("song");
    fs::create_dir(&song).unwrap();
    let path = write_map(&song, "ExpertPlus.dat", &sample_map(&[0.0, 0.25]));

    let mut config = LightingConfig {
        policy: GenerationPolicy::WithDuration,
        ..Default::default()
    };
    config.atmosphere.enabled = false;
    driver(config, StubTracker::default()).run(root.path()).unwrap();

    let doc = MapDocument::read(&path).unwrap();
    assert_eq!(doc.event_count(), 2);
    assert_eq!(doc.note_times().unwrap(), vec![0.0, 0.25]);
    let events = doc.get("_events").unwrap().as_array().unwrap();
    assert!(events.iter().all(|event| event.get("_floatValue").is_some()));
}

#[test]
fn write_failure_is_skipped_and_later_songs_still_run() {
    let root = tempdir().unwrap();
    let first = root.path().join("a-song");
    let second = root.path().join("b-song");
    fs::create_dir(&first).unwrap();
    fs::create_dir(&second).unwrap();
    let blocked = write_map(&first, "Hard.dat", &sample_map(&[1.0]));
    let blocked_before = fs::read_to_string(&blocked).unwrap();
    // The sibling temp path is taken by a directory, so the write cannot land.
    fs::create_dir(first.join("Hard.dat.tmp")).unwrap();
    let open = write_map(&second, "Hard.dat", &sample_map(&[1.0]));

    let report = driver(LightingConfig::default(), StubTracker::default())
        .run(root.path())
        .unwrap();

    assert_eq!(report.status_of(&blocked), Some(ItemStatus::SkippedIo));
    assert_eq!(fs::read_to_string(&blocked).unwrap(), blocked_before);
    assert_eq!(report.status_of(&open), Some(ItemStatus::Processed));
    assert_eq!(read_json(&open)["_events"].as_array().unwrap().len(), 6);
    assert!(report.summary().contains("[skipped-io]"));
}
