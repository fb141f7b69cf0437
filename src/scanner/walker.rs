use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::duplicates::loader::has_extension;

/// What the walk skips and keeps
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Subtrees never descended into (e.g. the duplicates output folder)
    pub exclude_paths: Vec<PathBuf>,
    /// Extensions treated as images, lowercase without the dot
    pub extensions: Vec<String>,
}

/// Collect image files under `root`, sorted by path.
///
/// Hidden directories, excluded names and excluded subtrees are pruned;
/// symlinks are not followed. Entries that cannot be read are skipped.
pub fn collect_images(root: &Path, options: &WalkOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.')
                && !options.exclude_dirs.iter().any(|x| *x == name)
                && !options.exclude_paths.iter().any(|p| e.path() == p)
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), &options.extensions) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => debug!(error = %e, "skipping unreadable entry"),
        }
    }

    files.sort();
    files
}
