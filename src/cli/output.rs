use colored::*;
use std::path::Path;

use crate::cleaner::Outcome;
use crate::common::format::{
    self, format_path_in, format_resolution, format_similarity, format_size, format_size_colored,
};
use crate::duplicates::record::{Action, ClusterKind};
use crate::duplicates::DupResults;

/// Print deduplication results in human-readable format
pub fn print_dup_results(results: &DupResults, root: &Path) {
    println!();
    println!("  {} imgdedup", "👯");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned {} in {}  •  max distance {}/{} bits{}",
        format::format_count(results.files_scanned).cyan(),
        format::format_duration(results.duration_secs).cyan(),
        results.max_distance,
        results.bit_len,
        if results.dry_run {
            "  •  dry run".yellow().to_string()
        } else {
            String::new()
        }
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if results.clusters.is_empty() {
        println!("  {} No duplicates found!", "✨");
        println!();
    }

    for cluster in &results.clusters {
        let (dot, label) = match cluster.kind {
            ClusterKind::Exact => ("●".red(), "exact".red().bold()),
            ClusterKind::Near => ("●".yellow(), "similar".yellow().bold()),
        };
        println!(
            "  {} Group {} — {} {} images, {} reclaimable",
            dot,
            cluster.id.to_string().bold(),
            cluster.len(),
            label,
            format_size(cluster.wasted_bytes()),
        );

        let master = cluster.master();
        println!(
            "      {} {} ({}, {})",
            "keep →".dimmed(),
            format_path_in(&master.path, root).green(),
            format_resolution(master.resolution),
            format_size(master.file_size_bytes),
        );

        for d in results
            .plan
            .for_cluster(cluster.id)
            .filter(|d| d.action != Action::KeepMaster)
        {
            let verb = match d.action {
                Action::Delete => "  del →",
                _ => " move →",
            };
            let mut line = format!(
                "      {} {} {}",
                verb.dimmed(),
                format_path_in(&d.source_path, root).dimmed(),
                format_similarity(d.similarity_score),
            );
            if d.byte_identical {
                line.push_str(&format!(" {}", "(identical file)".dimmed()));
            }
            if let Some(target) = &d.target_path {
                line.push_str(&format!(" {} {}", "⇒".dimmed(), format_path_in(target, root).dimmed()));
            }
            println!("{}", line);
        }
        println!();
    }

    if !results.plan.collisions.is_empty() {
        println!(
            "  {} {} move targets renamed to avoid overwriting",
            "⚠".yellow(),
            results.plan.collisions.len()
        );
        println!();
    }

    if results.load_failures > 0 {
        println!(
            "  {} {} ({})",
            "●".red(),
            "Could not load".red().bold(),
            results.load_failures
        );
        for rec in results.failed_records() {
            if let Some(err) = rec.load_error() {
                println!(
                    "      {} — {}",
                    format_path_in(&rec.path, root).dimmed(),
                    format::truncate(&err.to_string(), 80)
                );
            }
        }
        println!();
    }

    println!("{}", "─".repeat(60).dimmed());
    match &results.applied {
        None => {
            println!(
                "  {} groups, {} duplicates, {} reclaimable (nothing changed)",
                results.clusters.len().to_string().bold(),
                results.total_duplicates.to_string().bold(),
                format_size_colored(results.total_wasted),
            );
        }
        Some(report) => {
            println!(
                "  Moved {}  •  Deleted {}  •  Failed {}  •  Freed {}",
                report.moved.to_string().green(),
                report.deleted.to_string().green(),
                if report.failed > 0 {
                    report.failed.to_string().red()
                } else {
                    report.failed.to_string().normal()
                },
                format_size_colored(report.bytes_freed),
            );
            for a in &report.actions {
                if let Outcome::Failed(e) = &a.outcome {
                    println!(
                        "    {} {} — {}",
                        "✗".red(),
                        format_path_in(&a.disposition.source_path, root),
                        e
                    );
                }
                if let Some(w) = &a.warning {
                    println!("    {} {}", "⚠".yellow(), w);
                }
            }
        }
    }
    for sheet in &results.contact_sheets {
        println!("  {} Contact sheet: {}", "🖼️", format_path_in(sheet, root).cyan());
    }
    if let Some(path) = &results.report_path {
        println!("  {} Report: {}", "📄", format::format_path(path).cyan());
    }
    println!();
}

/// Print results as JSON
pub fn print_dup_json(results: &DupResults) {
    match serde_json::to_string_pretty(results) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing: {}", e),
    }
}

/// One line: groups, duplicates, reclaimable bytes
pub fn print_dup_quiet(results: &DupResults) {
    println!(
        "{}  {}  {}",
        results.clusters.len(),
        results.total_duplicates,
        format_size(results.total_wasted)
    );
}
