use chrono::{DateTime, Utc};
use file_sorter_core::{normalize_extension, InspectError, SampleKind, TextSample};
use serde::Serialize;
use std::cell::OnceCell;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// A regular file found at the top level of the directory being organized.
///
/// The content sample is taken at most once, and only if the classifier
/// asks for it.
#[derive(Debug)]
pub struct FileEntry {
    path: PathBuf,
    file_name: OsString,
    name: String,
    extension: String,
    sample: OnceCell<Result<TextSample, InspectError>>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let name = file_name.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize_extension)
            .unwrap_or_default();

        Self {
            path,
            file_name,
            name,
            extension,
            sample: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The name exactly as stored on disk.
    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    /// Display form of [`Self::file_name`]; invalid UTF-8 is replaced.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase with the leading dot, empty when the file has none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `None` when the extension has no content sampler.
    pub fn sample(&self) -> Option<&Result<TextSample, InspectError>> {
        let kind = SampleKind::for_extension(&self.extension)?;
        Some(self.sample.get_or_init(|| kind.sample(&self.path)))
    }

    pub fn is_sampled(&self) -> bool {
        self.sample.get().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    Moved { destination: PathBuf },
    Planned { destination: PathBuf },
    Failed { reason: String },
}

/// Outcome of classifying and relocating one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    file_name: String,
    category: String,
    #[serde(flatten)]
    status: MoveStatus,
}

impl MoveResult {
    pub fn new(file_name: impl Into<String>, category: impl Into<String>, status: MoveStatus) -> Self {
        Self {
            file_name: file_name.into(),
            category: category.into(),
            status,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn status(&self) -> &MoveStatus {
        &self.status
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, MoveStatus::Failed { .. })
    }

    pub fn destination(&self) -> Option<&Path> {
        match &self.status {
            MoveStatus::Moved { destination } | MoveStatus::Planned { destination } => {
                Some(destination)
            }
            MoveStatus::Failed { .. } => None,
        }
    }
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            MoveStatus::Moved { .. } => write!(f, "Moved {} -> {}", self.file_name, self.category),
            MoveStatus::Planned { .. } => {
                write!(f, "Would move {} -> {}", self.file_name, self.category)
            }
            MoveStatus::Failed { reason } => write!(
                f,
                "Failed to move {} -> {}: {}",
                self.file_name, self.category, reason
            ),
        }
    }
}

/// Ordered log of one organize pass. Produced once, when the pass completes.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizeReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<MoveResult>,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, MoveStatus::Moved { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Files per category, in first-seen order.
    pub fn count_by_category(&self) -> Vec<(&str, usize)> {
        self.results
            .iter()
            .filter(|r| !r.is_failure())
            .fold(Vec::<(&str, usize)>::new(), |mut acc, r| {
                match acc.iter_mut().find(|(c, _)| *c == r.category()) {
                    Some((_, n)) => *n += 1,
                    None => acc.push((r.category(), 1)),
                }
                acc
            })
    }
}
