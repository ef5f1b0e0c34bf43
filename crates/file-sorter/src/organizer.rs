use chrono::Utc;
use file_sorter_core::{CategoryRegistry, EnabledCategories};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, RuleBasedClassifier};
use crate::error::OrganizeError;
use crate::scanner::scan_directory;
use crate::types::{FileEntry, MoveResult, MoveStatus, OrganizeReport};

const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// What to do when the destination folder already holds a file of the same
/// name. Existing files are never overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Move as `name (1).ext`, `name (2).ext`, ... using the first free name.
    #[default]
    Rename,
    /// Leave the file where it is and report the entry as failed.
    Skip,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rename => "rename",
            Self::Skip => "skip",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown conflict policy '{}' (expected rename or skip)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    pub conflict: ConflictPolicy,
    pub dry_run: bool,
}

/// Progress signals emitted during a pass, in order: one `Scanned`, one
/// `Processed` per file, one `Complete`.
#[derive(Debug, Clone, Copy)]
pub enum OrganizeEvent<'a> {
    Scanned { files: usize },
    Processed(&'a MoveResult),
    Complete(&'a OrganizeReport),
}

pub struct Organizer {
    registry: CategoryRegistry,
    options: OrganizeOptions,
}

impl Organizer {
    pub fn new(registry: CategoryRegistry) -> Self {
        Self {
            registry,
            options: OrganizeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrganizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn options(&self) -> &OrganizeOptions {
        &self.options
    }

    pub fn organize(
        &self,
        root: &Path,
        enabled: &EnabledCategories,
    ) -> Result<OrganizeReport, OrganizeError> {
        self.organize_with_progress(root, enabled, |_| {})
    }

    /// One sequential pass over the files directly under `root`.
    ///
    /// Per-file classification or move failures are recorded in the report
    /// and never abort the pass; only an unreadable root is an error.
    pub fn organize_with_progress<F>(
        &self,
        root: &Path,
        enabled: &EnabledCategories,
        mut on_event: F,
    ) -> Result<OrganizeReport, OrganizeError>
    where
        F: FnMut(OrganizeEvent<'_>),
    {
        let started_at = Utc::now();
        let entries = scan_directory(root)?;

        info!(root = %root.display(), files = entries.len(), "organizing");
        on_event(OrganizeEvent::Scanned {
            files: entries.len(),
        });

        let classifier = RuleBasedClassifier::new(&self.registry);
        let results = entries
            .into_iter()
            .map(|entry| {
                let category = classifier.classify(&entry, enabled).category;
                let plan = plan_move(&entry, category, root, self.options.conflict);
                let result = if self.options.dry_run {
                    plan.into_planned()
                } else {
                    execute_move(plan)
                };
                on_event(OrganizeEvent::Processed(&result));
                result
            })
            .collect();

        let report = OrganizeReport {
            root: root.to_path_buf(),
            dry_run: self.options.dry_run,
            started_at,
            finished_at: Utc::now(),
            results,
        };

        info!(
            moved = report.moved_count(),
            failed = report.failed_count(),
            "organization complete"
        );
        on_event(OrganizeEvent::Complete(&report));

        Ok(report)
    }
}

/// Organize `root` with the builtin registry and default options.
pub fn organize_directory(
    root: &Path,
    enabled: &EnabledCategories,
) -> Result<OrganizeReport, OrganizeError> {
    Organizer::new(CategoryRegistry::builtin()).organize(root, enabled)
}

/// Where one file should go. Built without touching the filesystem beyond
/// existence checks.
struct MovePlan {
    source: PathBuf,
    file_name: String,
    category: String,
    target_dir: PathBuf,
    target: Result<PathBuf, String>,
}

impl MovePlan {
    fn into_planned(self) -> MoveResult {
        let status = match self.target {
            Ok(destination) => MoveStatus::Planned { destination },
            Err(reason) => MoveStatus::Failed { reason },
        };
        MoveResult::new(self.file_name, self.category, status)
    }
}

fn plan_move(entry: &FileEntry, category: String, root: &Path, policy: ConflictPolicy) -> MovePlan {
    let target_dir = root.join(&category);
    let target = resolve_target(&target_dir, entry.file_name(), policy);

    MovePlan {
        source: entry.path().to_path_buf(),
        file_name: entry.name().to_string(),
        category,
        target_dir,
        target,
    }
}

fn resolve_target(
    dir: &Path,
    file_name: &OsStr,
    policy: ConflictPolicy,
) -> Result<PathBuf, String> {
    let candidate = dir.join(file_name);
    if !occupied(&candidate) {
        return Ok(candidate);
    }

    match policy {
        ConflictPolicy::Skip => Err(format!(
            "destination already exists: {}",
            candidate.display()
        )),
        ConflictPolicy::Rename => (1..=MAX_RENAME_ATTEMPTS)
            .map(|n| dir.join(numbered_name(file_name, n)))
            .find(|p| !occupied(p))
            .ok_or_else(|| {
                format!(
                    "no free name for {} in {}",
                    file_name.to_string_lossy(),
                    dir.display()
                )
            }),
    }
}

fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// "report.pdf" -> "report (2).pdf"; "README" -> "README (2)".
fn numbered_name(file_name: &OsStr, n: u32) -> OsString {
    let path = Path::new(file_name);
    let suffix = format!(" ({})", n);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut name = stem.to_os_string();
            name.push(suffix);
            name.push(".");
            name.push(ext);
            name
        }
        _ => {
            let mut name = file_name.to_os_string();
            name.push(suffix);
            name
        }
    }
}

fn execute_move(plan: MovePlan) -> MoveResult {
    let status = match plan.target {
        Err(reason) => {
            warn!(file = %plan.file_name, %reason, "not moved");
            MoveStatus::Failed { reason }
        }
        Ok(target) => match ensure_category_dir(&plan.target_dir)
            .and_then(|()| move_file(&plan.source, &target))
        {
            Ok(()) => {
                info!(file = %plan.file_name, category = %plan.category, "moved");
                MoveStatus::Moved {
                    destination: target,
                }
            }
            Err(e) => {
                warn!(file = %plan.file_name, category = %plan.category, error = %e, "move failed");
                MoveStatus::Failed {
                    reason: e.to_string(),
                }
            }
        },
    };

    MoveResult::new(plan.file_name, plan.category, status)
}

/// Creates the category folder inside an existing root. The root itself is
/// never created.
fn ensure_category_dir(dir: &Path) -> io::Result<()> {
    match fs::create_dir(dir) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        result => result,
    }
}

/// Rename, falling back to copy + delete when rename is not possible (for
/// example across filesystems). A copy whose source cannot be removed is
/// rolled back.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    let rename_err = match fs::rename(source, target) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    debug!(error = %rename_err, "rename failed, copying instead");

    let mut reader = File::open(source)?;
    let permissions = reader.metadata()?.permissions();
    copy_to_new(&mut reader, target)?;
    if let Err(e) = fs::set_permissions(target, permissions) {
        debug!(error = %e, "could not copy permissions");
    }

    fs::remove_file(source).inspect_err(|_| {
        let _ = fs::remove_file(target);
    })
}

/// Writes `reader` to `target`, which must not exist yet. A partly written
/// target is removed before the error is returned.
fn copy_to_new<R: Read + ?Sized>(reader: &mut R, target: &Path) -> io::Result<()> {
    let mut file = File::create_new(target)?;
    io::copy(reader, &mut file)
        .and_then(|_| file.sync_all())
        .inspect_err(|_| {
            let _ = fs::remove_file(target);
        })
}
