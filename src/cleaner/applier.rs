use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::common::errors::ApplyError;
use crate::duplicates::record::{Action, DispositionRecord};
use crate::duplicates::resolver::numbered_variant;

/// What actually happened to one disposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Outcome {
    Kept,
    Moved,
    Deleted,
    Failed(ApplyError),
}

/// One disposition after the apply phase
#[derive(Debug, Clone, Serialize)]
pub struct AppliedAction {
    pub disposition: DispositionRecord,
    pub outcome: Outcome,
    /// Where a moved file ended up (differs from the plan after a late collision)
    pub final_path: Option<PathBuf>,
    pub warning: Option<String>,
}

impl AppliedAction {
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Totals for the human summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub actions: Vec<AppliedAction>,
    pub moved: usize,
    pub deleted: usize,
    pub failed: usize,
    pub bytes_freed: u64,
}

/// Carry out a plan, one disposition at a time, in plan order.
///
/// Failures are recorded and the remaining dispositions still run.
pub fn apply_plan(dispositions: &[DispositionRecord]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for disposition in dispositions {
        let applied = apply_one(disposition);
        match &applied.outcome {
            Outcome::Moved => {
                report.moved += 1;
                report.bytes_freed += disposition.file_size_bytes;
            }
            Outcome::Deleted => {
                report.deleted += 1;
                report.bytes_freed += disposition.file_size_bytes;
            }
            Outcome::Failed(e) => {
                report.failed += 1;
                warn!(path = %disposition.source_path.display(), error = %e, "action failed");
            }
            Outcome::Kept => {}
        }
        report.actions.push(applied);
    }

    info!(
        moved = report.moved,
        deleted = report.deleted,
        failed = report.failed,
        "apply phase finished"
    );
    report
}

fn apply_one(disposition: &DispositionRecord) -> AppliedAction {
    let mut applied = AppliedAction {
        disposition: disposition.clone(),
        outcome: Outcome::Kept,
        final_path: None,
        warning: None,
    };

    let source = &disposition.source_path;
    match (disposition.action, &disposition.target_path) {
        (Action::KeepMaster, _) => {}
        (Action::Delete, _) => {
            applied.outcome = match std::fs::remove_file(source) {
                Ok(()) => Outcome::Deleted,
                Err(e) => Outcome::Failed(e.into()),
            };
        }
        (Action::Move, Some(planned)) => {
            if !source.exists() {
                applied.outcome = Outcome::Failed(ApplyError::SourceMissing);
                return applied;
            }
            let target = free_target(planned);
            if &target != planned {
                applied.warning = Some(format!(
                    "'{}' appeared after planning, moved to '{}' instead",
                    planned.display(),
                    target.display()
                ));
            }
            applied.outcome = match move_file(source, &target) {
                Ok(()) => {
                    applied.final_path = Some(target);
                    Outcome::Moved
                }
                Err(e) => Outcome::Failed(e.into()),
            };
        }
        (Action::Move, None) => {
            applied.outcome = Outcome::Failed(ApplyError::Io("move has no target".to_string()));
        }
    }
    applied
}

/// `planned`, or its first numbered variant not on disk
fn free_target(planned: &Path) -> PathBuf {
    let mut candidate = planned.to_path_buf();
    let mut n = 0;
    while candidate.exists() {
        n += 1;
        candidate = numbered_variant(planned, n);
    }
    candidate
}

/// Rename, falling back to copy + remove only across filesystems.
///
/// A failed move leaves exactly one copy behind: the source.
fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, target)
        }
        Err(e) => Err(e),
    }
}

fn copy_then_remove(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Err(e) = std::fs::copy(source, target) {
        let _ = std::fs::remove_file(target);
        return Err(e);
    }
    if let Err(e) = std::fs::remove_file(source) {
        if let Err(cleanup) = std::fs::remove_file(target) {
            warn!(
                path = %target.display(),
                error = %cleanup,
                "could not remove partial copy"
            );
        }
        return Err(e);
    }
    Ok(())
}
