use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use super::batch;
use super::cluster::build_clusters;
use super::perceptual::PerceptualHasher;
use super::record::{Cluster, ImageRecord};
use super::resolver::{plan_on_disk, Plan, PlanOptions};
use crate::cleaner::{apply_plan, ApplyReport};
use crate::common::config::DedupConfig;
use crate::common::errors::DedupError;
use crate::report;
use crate::scanner::{collect_images, WalkOptions};

/// Clusters and the plan derived from one set of records
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub clusters: Vec<Cluster>,
    pub plan: Plan,
    pub max_distance: u32,
    pub bit_len: usize,
}

/// Complete results from a deduplication run
#[derive(Debug, Clone, Serialize)]
pub struct DupResults {
    /// Every scanned image, failures included, sorted by path
    pub records: Vec<ImageRecord>,
    /// Duplicate clusters with masters assigned
    pub clusters: Vec<Cluster>,
    /// Planned dispositions
    pub plan: Plan,
    /// Outcome of the apply phase; `None` for dry runs
    pub applied: Option<ApplyReport>,
    pub contact_sheets: Vec<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub files_scanned: usize,
    pub load_failures: usize,
    pub max_distance: u32,
    pub bit_len: usize,
    pub total_wasted: u64,
    pub total_duplicates: usize,
    pub duration_secs: f64,
    pub dry_run: bool,
}

impl DupResults {
    pub fn failed_records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter().filter(|r| r.load_error().is_some())
    }
}

/// Paths the run will hash
pub fn scan(config: &DedupConfig) -> Vec<PathBuf> {
    let options = WalkOptions {
        exclude_dirs: config.exclude_dirs.clone(),
        exclude_paths: vec![config.duplicates_root.clone()],
        extensions: config.extensions.clone(),
    };
    collect_images(&config.root, &options)
}

/// Pure compute: cluster the records and plan dispositions.
///
/// Records are sorted by path first, so the outcome does not depend on the
/// order hashing finished in.
pub fn analyze(records: &mut [ImageRecord], config: &DedupConfig) -> Analysis {
    records.sort_by(|a, b| a.path.cmp(&b.path));
    let max_distance = config.max_distance();
    let clusters = build_clusters(records, max_distance);
    let plan = plan_on_disk(
        &clusters,
        &PlanOptions {
            scan_root: config.root.clone(),
            duplicates_root: config.duplicates_root.clone(),
            delete: config.delete,
        },
    );
    Analysis {
        clusters,
        plan,
        max_distance,
        bit_len: config.hash.bit_len(),
    }
}

/// Run the full pipeline: scan, hash, cluster, plan, then (unless dry run)
/// render contact sheets and apply the plan, and finally write the report.
pub fn find_duplicates(config: &DedupConfig, show_progress: bool) -> Result<DupResults, DedupError> {
    let start = Instant::now();

    // ── Scan ──────────────────────────────────────────────────────────────
    let pb = make_spinner(show_progress, "Collecting images...");
    let paths = scan(config);
    finish_spinner(pb, &format!("Found {} images", paths.len()));
    info!(root = %config.root.display(), images = paths.len(), "scan complete");

    // ── Hash ──────────────────────────────────────────────────────────────
    let hasher = PerceptualHasher::new(config.hash);
    let pb = make_progress(show_progress, paths.len() as u64, "Computing perceptual hashes...");
    let mut records = batch::hash_all(&paths, &hasher, config.workers, pb.as_ref())?;
    let load_failures = records.iter().filter(|r| !r.is_hashed()).count();
    finish_progress(pb, &format!("Hashed {} images", records.len() - load_failures));
    info!(hashed = records.len() - load_failures, failed = load_failures, "hashing complete");

    // ── Cluster + plan ────────────────────────────────────────────────────
    let pb = make_spinner(show_progress, "Grouping similar images...");
    let analysis = analyze(&mut records, config);
    finish_spinner(pb, &format!("Found {} duplicate groups", analysis.clusters.len()));
    info!(
        clusters = analysis.clusters.len(),
        max_distance = analysis.max_distance,
        "clustering complete"
    );

    // ── Apply ─────────────────────────────────────────────────────────────
    let mut contact_sheets = Vec::new();
    let applied = if config.dry_run {
        None
    } else {
        if config.contact_sheets {
            contact_sheets = report::write_contact_sheets(&analysis.clusters, &config.duplicates_root);
        }
        Some(apply_plan(&analysis.plan.dispositions))
    };

    // ── Report ────────────────────────────────────────────────────────────
    if let Some(path) = &config.report_path {
        let actions = applied.as_ref().map(|a| a.actions.as_slice()).unwrap_or(&[]);
        report::write_report(path, &analysis.clusters, &analysis.plan, actions)?;
        info!(path = %path.display(), "report written");
    }

    let total_wasted = analysis.clusters.iter().map(|c| c.wasted_bytes()).sum();
    let total_duplicates = analysis.clusters.iter().map(|c| c.len() - 1).sum();

    Ok(DupResults {
        files_scanned: records.len(),
        records,
        clusters: analysis.clusters,
        plan: analysis.plan,
        applied,
        contact_sheets,
        report_path: config.report_path.clone(),
        load_failures,
        max_distance: analysis.max_distance,
        bit_len: analysis.bit_len,
        total_wasted,
        total_duplicates,
        duration_secs: start.elapsed().as_secs_f64(),
        dry_run: config.dry_run,
    })
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(show: bool, msg: &str) -> Option<ProgressBar> {
    if show {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        Some(pb)
    } else {
        None
    }
}

fn finish_spinner(pb: Option<ProgressBar>, msg: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(msg.to_string());
    }
}

fn make_progress(show: bool, total: u64, msg: &str) -> Option<ProgressBar> {
    if show {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━░"),
        );
        pb.set_message(msg.to_string());
        Some(pb)
    } else {
        None
    }
}

fn finish_progress(pb: Option<ProgressBar>, msg: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(msg.to_string());
    }
}
