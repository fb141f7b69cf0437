use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::perceptual::Fingerprint;
use crate::common::errors::LoadError;

/// One scanned image. Either fingerprinted or failed, never both.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    pub path: PathBuf,
    fingerprint: Option<Fingerprint>,
    pub file_size_bytes: u64,
    pub modified_time: DateTime<Utc>,
    /// (width, height) after orientation correction
    pub resolution: Option<(u32, u32)>,
    /// Hex SHA-256 of the file bytes
    pub content_digest: Option<String>,
    load_error: Option<LoadError>,
}

/// Filesystem facts captured once at scan time
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

impl Default for FileStat {
    fn default() -> Self {
        Self {
            size_bytes: 0,
            modified: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
        }
    }
}

impl FileStat {
    /// Read size and mtime; unreadable metadata falls back to zero values
    pub fn of(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) => Self {
                size_bytes: meta.len(),
                modified: meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or(DateTime::<Utc>::from(std::time::UNIX_EPOCH)),
            },
            Err(_) => Self::default(),
        }
    }
}

impl ImageRecord {
    pub fn loaded(
        path: PathBuf,
        stat: FileStat,
        fingerprint: Fingerprint,
        resolution: (u32, u32),
        content_digest: String,
    ) -> Self {
        Self {
            path,
            fingerprint: Some(fingerprint),
            file_size_bytes: stat.size_bytes,
            modified_time: stat.modified,
            resolution: Some(resolution),
            content_digest: Some(content_digest),
            load_error: None,
        }
    }

    pub fn failed(path: PathBuf, stat: FileStat, error: LoadError) -> Self {
        Self {
            path,
            fingerprint: None,
            file_size_bytes: stat.size_bytes,
            modified_time: stat.modified,
            resolution: None,
            content_digest: None,
            load_error: Some(error),
        }
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    pub fn is_hashed(&self) -> bool {
        self.fingerprint.is_some()
    }

    /// width × height, 0 when unknown
    pub fn pixel_count(&self) -> u64 {
        self.resolution
            .map(|(w, h)| w as u64 * h as u64)
            .unwrap_or(0)
    }
}

/// How tightly a cluster's members match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// Every member has the same fingerprint
    Exact,
    /// At least two members differ but are connected through near matches
    Near,
}

impl std::fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterKind::Exact => write!(f, "exact"),
            ClusterKind::Near => write!(f, "near"),
        }
    }
}

/// A connected group of at least two images
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub id: usize,
    pub kind: ClusterKind,
    pub members: Vec<ImageRecord>,
    /// Index into `members`
    pub master: usize,
}

impl Cluster {
    pub fn master(&self) -> &ImageRecord {
        &self.members[self.master]
    }

    /// Every member except the master, in member order
    pub fn duplicates(&self) -> impl Iterator<Item = &ImageRecord> {
        self.members
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.master)
            .map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Bytes reclaimed if every non-master is removed
    pub fn wasted_bytes(&self) -> u64 {
        self.duplicates().map(|m| m.file_size_bytes).sum()
    }
}

/// What happens to one member of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    KeepMaster,
    Move,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::KeepMaster => write!(f, "keep"),
            Action::Move => write!(f, "move"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Planned disposition of one non-master cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispositionRecord {
    pub cluster_id: usize,
    pub source_path: PathBuf,
    pub master_path: PathBuf,
    pub action: Action,
    /// Set only for `Action::Move`
    pub target_path: Option<PathBuf>,
    pub distance: u32,
    /// 0-100, from the Hamming distance to the master
    pub similarity_score: u8,
    /// File bytes equal the master's
    pub byte_identical: bool,
    pub file_size_bytes: u64,
}
