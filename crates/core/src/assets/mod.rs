use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{LightingError, Result};

/// Audio asset names recognised inside a song folder, in lookup order.
pub const AUDIO_FILE_NAMES: [&str; 2] = ["song.ogg", "song.egg"];

const INFO_FILE_NAMES: [&str; 2] = ["Info.dat", "info.dat"];
const BPM_KEY: &str = "_beatsPerMinute";

/// Difficulty levels a song folder may provide, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Normal,
    Hard,
    Expert,
    ExpertPlus,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::ExpertPlus,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Difficulty::Normal => "Normal.dat",
            Difficulty::Hard => "Hard.dat",
            Difficulty::Expert => "Expert.dat",
            Difficulty::ExpertPlus => "ExpertPlus.dat",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name().trim_end_matches(".dat"))
    }
}

/// One song directory under the batch root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongFolder {
    path: PathBuf,
}

impl SongFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path where the difficulty file would live, whether or not it exists.
    pub fn difficulty_path(&self, difficulty: Difficulty) -> PathBuf {
        self.path.join(difficulty.file_name())
    }

    /// Resolves a difficulty file or reports it as missing.
    pub fn difficulty_file(&self, difficulty: Difficulty) -> Result<PathBuf> {
        let path = self.difficulty_path(difficulty);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LightingError::MissingAsset { path })
        }
    }

    /// First `song.ogg` / `song.egg` present in the folder.
    pub fn audio_file(&self) -> Result<PathBuf> {
        AUDIO_FILE_NAMES
            .iter()
            .map(|name| self.path.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| LightingError::MissingAsset {
                path: self.path.join(AUDIO_FILE_NAMES[0]),
            })
    }

    /// Tempo declared in the song's info file, if it has one.
    pub fn declared_bpm(&self) -> Option<f64> {
        let path = INFO_FILE_NAMES
            .iter()
            .map(|name| self.path.join(name))
            .find(|path| path.is_file())?;
        let text = std::fs::read_to_string(&path).ok()?;
        let info: Value = serde_json::from_str(&text).ok()?;
        info.get(BPM_KEY)
            .and_then(Value::as_f64)
            .filter(|bpm| *bpm > 0.0)
    }
}

/// Lists the immediate subdirectories of `root` in name order.
///
/// Failing to read `root` itself is the only error; unreadable entries are
/// logged and skipped.
pub fn discover_songs(root: &Path) -> Result<Vec<SongFolder>> {
    let mut songs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), %err, "unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            songs.push(SongFolder::new(path));
        }
    }
    songs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(songs)
}
