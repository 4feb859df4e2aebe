use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::LightingError;

/// Outcome recorded for a difficulty file or song folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Processed,
    SkippedNoSource,
    SkippedMalformed,
    SkippedNoAudio,
    SkippedMissing,
    SkippedIo,
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Processed => "processed",
            ItemStatus::SkippedNoSource => "skipped-no-source",
            ItemStatus::SkippedMalformed => "skipped-malformed",
            ItemStatus::SkippedNoAudio => "skipped-no-audio",
            ItemStatus::SkippedMissing => "skipped-missing",
            ItemStatus::SkippedIo => "skipped-io",
        }
    }

    pub fn is_skip(self) -> bool {
        self != ItemStatus::Processed
    }

    /// Status for a recoverable error, or `None` when the error is fatal.
    pub fn for_error(err: &LightingError) -> Option<Self> {
        match err {
            LightingError::EmptySource { .. } => Some(ItemStatus::SkippedNoSource),
            LightingError::MalformedDocument(_) | LightingError::Json(_) => {
                Some(ItemStatus::SkippedMalformed)
            }
            LightingError::AudioDecode { .. } => Some(ItemStatus::SkippedNoAudio),
            LightingError::MissingAsset { .. } => Some(ItemStatus::SkippedMissing),
            LightingError::FileIo { .. } => Some(ItemStatus::SkippedIo),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single line of the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub status: ItemStatus,
    /// Event count for processed files, skip reason otherwise.
    pub detail: String,
}

/// Per-item status log accumulated over one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    entries: Vec<ReportEntry>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, status: ItemStatus, detail: impl Into<String>) {
        self.entries.push(ReportEntry {
            path: path.into(),
            status,
            detail: detail.into(),
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    pub fn processed(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|entry| !entry.status.is_skip())
            .map(|entry| entry.path.as_path())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| entry.status.is_skip())
    }

    pub fn status_of(&self, path: &Path) -> Option<ItemStatus> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.status)
    }

    /// Human-readable listing: processed paths first, then skips with reasons.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let processed = self.count(ItemStatus::Processed);
        out.push_str(&format!("processed {processed} file(s)\n"));
        for entry in self.entries.iter().filter(|entry| !entry.status.is_skip()) {
            out.push_str(&format!("  {} ({})\n", entry.path.display(), entry.detail));
        }

        let skipped: Vec<_> = self.skipped().collect();
        out.push_str(&format!("skipped {} item(s)\n", skipped.len()));
        for entry in skipped {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                entry.status,
                entry.path.display(),
                entry.detail
            ));
        }
        out
    }
}
