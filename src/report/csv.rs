//! Per-cluster CSV report.
//!
//! One row per duplicate cluster. List-valued cells hold one entry per
//! non-master member, joined with `;`, in the same order in every column.

use std::fmt::Write as _;
use std::path::Path;

use crate::cleaner::{AppliedAction, Outcome};
use crate::common::errors::DedupError;
use crate::duplicates::record::{Action, Cluster, DispositionRecord};
use crate::duplicates::resolver::Plan;

pub const HEADER: &[&str] = &[
    "group_id",
    "kind",
    "master_path",
    "duplicate_paths",
    "similarity_scores",
    "action_taken",
    "original_sizes",
    "resolutions",
];

/// Quote a cell when it contains a delimiter, quote or line break
pub fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Label for the `action_taken` column
pub fn action_label(disposition: &DispositionRecord, applied: Option<&AppliedAction>) -> String {
    match applied {
        None => match disposition.action {
            Action::Move => "would_move".to_string(),
            Action::Delete => "would_delete".to_string(),
            Action::KeepMaster => "keep".to_string(),
        },
        Some(a) => match &a.outcome {
            Outcome::Moved => match &a.final_path {
                Some(p) => format!("moved:{}", p.display()),
                None => "moved".to_string(),
            },
            Outcome::Deleted => "deleted".to_string(),
            Outcome::Kept => "keep".to_string(),
            Outcome::Failed(e) => format!("failed:{}", e),
        },
    }
}

/// Render the whole report. `applied` is empty for dry runs.
pub fn render(clusters: &[Cluster], plan: &Plan, applied: &[AppliedAction]) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.join(","));
    out.push('\n');

    for cluster in clusters {
        let master = cluster.master();
        let dispositions: Vec<&DispositionRecord> = plan
            .for_cluster(cluster.id)
            .filter(|d| d.action != Action::KeepMaster)
            .collect();

        let mut paths = Vec::new();
        let mut scores = Vec::new();
        let mut actions = Vec::new();
        let mut sizes = vec![master.file_size_bytes.to_string()];
        let mut resolutions = vec![format_resolution(master.resolution)];

        for d in &dispositions {
            paths.push(d.source_path.display().to_string());
            scores.push(d.similarity_score.to_string());
            let outcome = applied.iter().find(|a| {
                a.disposition.cluster_id == d.cluster_id && a.disposition.source_path == d.source_path
            });
            actions.push(action_label(d, outcome));
            sizes.push(d.file_size_bytes.to_string());
            let member = cluster.members.iter().find(|m| m.path == d.source_path);
            resolutions.push(format_resolution(member.and_then(|m| m.resolution)));
        }

        let row = [
            cluster.id.to_string(),
            cluster.kind.to_string(),
            master.path.display().to_string(),
            paths.join(";"),
            scores.join(";"),
            actions.join(";"),
            sizes.join(";"),
            resolutions.join(";"),
        ];
        let cells: Vec<String> = row.iter().map(|c| escape(c)).collect();
        let _ = writeln!(out, "{}", cells.join(","));
    }
    out
}

/// Write the report, creating parent directories as needed
pub fn write_report(
    path: &Path,
    clusters: &[Cluster],
    plan: &Plan,
    applied: &[AppliedAction],
) -> Result<(), DedupError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DedupError::io(parent, e))?;
    }
    std::fs::write(path, render(clusters, plan, applied)).map_err(|e| DedupError::Report {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn format_resolution(res: Option<(u32, u32)>) -> String {
    match res {
        Some((w, h)) => format!("{}x{}", w, h),
        None => "?".to_string(),
    }
}
