use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// imgdedup: find and manage duplicate and near-duplicate images
#[derive(Parser, Debug)]
#[command(
    name = "imgdedup",
    version,
    about = "Find duplicate and near-duplicate images with perceptual hashing",
    long_about = "imgdedup fingerprints every image under a folder with a DCT-based\n\
                   perceptual hash, groups images that look alike, keeps the best copy\n\
                   of each group and moves (or deletes) the rest.",
    after_help = "EXAMPLES:\n  \
        imgdedup ~/Pictures                        Move duplicates to ~/Pictures/duplicates_found\n  \
        imgdedup ~/Pictures --dry-run              Plan only, write the report\n  \
        imgdedup ~/Pictures --threshold 95         Only very close matches\n  \
        imgdedup ~/Pictures --delete --threads 8   Delete duplicates, 8 hashing threads\n  \
        imgdedup ~/Pictures --format json          Machine-readable output"
)]
pub struct Cli {
    /// Folder to scan (recursively)
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Similarity threshold in percent (0-100)
    #[arg(long, short = 't', value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,

    /// Delete duplicates instead of moving them
    #[arg(long)]
    pub delete: bool,

    /// Plan and report without moving or deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Hashing threads (default: one per CPU core)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// Where moved duplicates go (default: <FOLDER>/duplicates_found)
    #[arg(long, value_name = "PATH")]
    pub duplicates_dir: Option<PathBuf>,

    /// CSV report path (default: <FOLDER>/dedupe_report.csv)
    #[arg(long, value_name = "PATH", conflicts_with = "no_report")]
    pub report: Option<PathBuf>,

    /// Do not write the CSV report
    #[arg(long)]
    pub no_report: bool,

    /// Do not render contact sheets for near-duplicate groups
    #[arg(long)]
    pub no_contact_sheets: bool,

    /// Settings file (default: ~/.imgdedup/config.toml)
    #[arg(long, value_name = "PATH", env = "IMGDEDUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Quiet mode: no progress, one summary line (groups, duplicates, reclaimable)
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn threshold_above_100_is_rejected() {
        assert!(Cli::try_parse_from(["imgdedup", "/tmp", "--threshold", "101"]).is_err());
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(Cli::try_parse_from(["imgdedup", "/tmp", "--threads", "0"]).is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["imgdedup", "/tmp"]).unwrap();
        assert_eq!(cli.threshold, None);
        assert!(!cli.delete);
        assert!(!cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Human);
    }
}
