use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::DedupError;
use crate::duplicates::loader::IMAGE_EXTENSIONS;
use crate::duplicates::perceptual::HashParams;

/// Persistent user defaults (~/.imgdedup/config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default similarity percentage (0-100)
    #[serde(default = "default_similarity")]
    pub similarity: u8,

    /// Worker threads for hashing (0 = one per CPU core)
    #[serde(default)]
    pub workers: usize,

    /// Side of the grayscale grid fed to the transform
    #[serde(default = "default_grid")]
    pub grid: u32,

    /// Side of the retained low-frequency block
    #[serde(default = "default_block")]
    pub block: u32,

    /// Name of the duplicates folder created under the scanned root
    #[serde(default = "default_duplicates_dir_name")]
    pub duplicates_dir_name: String,

    /// File name of the CSV report written under the scanned root
    #[serde(default = "default_report_name")]
    pub report_name: String,

    /// Directory names never descended into
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Extensions treated as images (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_similarity() -> u8 {
    85
}
fn default_grid() -> u32 {
    HashParams::default().grid
}
fn default_block() -> u32 {
    HashParams::default().block
}
fn default_duplicates_dir_name() -> String {
    "duplicates_found".to_string()
}
fn default_report_name() -> String {
    "dedupe_report.csv".to_string()
}
fn default_extensions() -> Vec<String> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            similarity: default_similarity(),
            workers: 0,
            grid: default_grid(),
            block: default_block(),
            duplicates_dir_name: default_duplicates_dir_name(),
            report_name: default_report_name(),
            exclude_dirs: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

impl Settings {
    /// Get the imgdedup data directory (~/.imgdedup)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".imgdedup")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load settings from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific file, or defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(settings)
    }

    pub fn hash_params(&self) -> HashParams {
        HashParams {
            grid: self.grid,
            block: self.block,
        }
    }
}

/// Validated configuration for one deduplication run
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Similarity percentage; two images cluster when at least this similar
    pub similarity: u8,
    /// Delete duplicates instead of moving them
    pub delete: bool,
    /// Plan and report only, never touch the filesystem
    pub dry_run: bool,
    /// Hashing worker count (always >= 1 after validation)
    pub workers: usize,
    /// Where moved duplicates land, mirroring their path under `root`
    pub duplicates_root: PathBuf,
    /// Transform sizes shared by every image in the run
    pub hash: HashParams,
    /// Render contact sheets for larger near-duplicate clusters
    pub contact_sheets: bool,
    /// CSV report destination, if any
    pub report_path: Option<PathBuf>,
    /// Directory names skipped during the walk
    pub exclude_dirs: Vec<String>,
    /// Extensions treated as images
    pub extensions: Vec<String>,
}

impl DedupConfig {
    /// Build a config for `root` from persisted settings
    pub fn from_settings(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        let root = root.into();
        Self {
            duplicates_root: root.join(&settings.duplicates_dir_name),
            report_path: Some(root.join(&settings.report_name)),
            similarity: settings.similarity,
            delete: false,
            dry_run: false,
            workers: settings.workers,
            hash: settings.hash_params(),
            contact_sheets: true,
            exclude_dirs: settings.exclude_dirs.clone(),
            extensions: settings.extensions.clone(),
            root,
        }
    }

    /// Check every field and resolve defaults. Nothing is read or written
    /// beyond probing the root directory.
    pub fn validate(mut self) -> Result<Self, DedupError> {
        if !self.root.exists() {
            return Err(DedupError::config(format!(
                "folder does not exist: {}",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(DedupError::config(format!(
                "not a directory: {}",
                self.root.display()
            )));
        }
        if let Err(e) = std::fs::read_dir(&self.root) {
            return Err(DedupError::config(format!(
                "folder is not readable: {} ({})",
                self.root.display(),
                e
            )));
        }
        if self.similarity > 100 {
            return Err(DedupError::config(format!(
                "threshold must be between 0 and 100, got {}",
                self.similarity
            )));
        }
        if self.workers == 0 {
            self.workers = default_workers();
        }
        self.hash.validate()?;

        let canonical = self
            .root
            .canonicalize()
            .map_err(|e| DedupError::io(&self.root, e))?;
        self.duplicates_root = rebase(&self.duplicates_root, &self.root, &canonical);
        self.report_path = self
            .report_path
            .map(|p| rebase(&p, &self.root, &canonical));
        self.root = canonical;
        Ok(self)
    }

    /// Maximum Hamming distance for this run's similarity setting
    pub fn max_distance(&self) -> u32 {
        crate::duplicates::distance::threshold_from_similarity(self.similarity, self.hash.bit_len())
    }
}

/// Re-anchor a path derived from `root` (or relative to it) onto `canonical`
fn rebase(path: &Path, root: &Path, canonical: &Path) -> PathBuf {
    if let Ok(rel) = path.strip_prefix(root) {
        canonical.join(rel)
    } else if path.is_relative() {
        canonical.join(path)
    } else {
        path.to_path_buf()
    }
}

/// One worker per available core
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_config_error() {
        let cfg = DedupConfig::from_settings("/definitely/not/here", &Settings::default());
        assert!(matches!(cfg.validate(), Err(DedupError::Config { .. })));
    }

    #[test]
    fn out_of_range_similarity_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cfg = DedupConfig::from_settings(dir.path(), &Settings::default());
        cfg.similarity = 101;
        assert!(matches!(cfg.validate(), Err(DedupError::Config { .. })));
    }

    #[test]
    fn zero_workers_resolve_to_cpu_count() {
        let dir = TempDir::new().unwrap();
        let mut cfg = DedupConfig::from_settings(dir.path(), &Settings::default());
        cfg.workers = 0;
        let cfg = cfg.validate().unwrap();
        assert!(cfg.workers >= 1);
    }

    #[test]
    fn invalid_hash_params_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cfg = DedupConfig::from_settings(dir.path(), &Settings::default());
        cfg.hash = HashParams { grid: 8, block: 16 };
        assert!(matches!(cfg.validate(), Err(DedupError::Config { .. })));
    }

    #[test]
    fn relative_root_defaults_land_directly_under_root() {
        // Unit tests run from the package root, where `src` exists
        let cfg = DedupConfig::from_settings("src", &Settings::default())
            .validate()
            .unwrap();
        assert!(cfg.root.is_absolute());
        assert!(cfg.root.ends_with("src"));
        assert_eq!(cfg.duplicates_root, cfg.root.join("duplicates_found"));
        assert_eq!(cfg.report_path, Some(cfg.root.join("dedupe_report.csv")));
    }

    #[test]
    fn current_dir_root_defaults_land_directly_under_root() {
        let cfg = DedupConfig::from_settings(".", &Settings::default())
            .validate()
            .unwrap();
        assert_eq!(cfg.duplicates_root, cfg.root.join("duplicates_found"));
    }

    #[test]
    fn absolute_paths_outside_root_are_kept() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let mut cfg = DedupConfig::from_settings(dir.path(), &Settings::default());
        cfg.duplicates_root = elsewhere.path().join("dupes");
        let cfg = cfg.validate().unwrap();
        assert_eq!(cfg.duplicates_root, elsewhere.path().join("dupes"));
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "similarity = 90\nexclude_dirs = [\"raw\"]\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.similarity, 90);
        assert_eq!(settings.exclude_dirs, vec!["raw".to_string()]);
        assert_eq!(settings.grid, 32);
        assert_eq!(settings.duplicates_dir_name, "duplicates_found");
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "similarity = \"high\"").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }
}
