use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::loader;
use super::perceptual::PerceptualHasher;
use super::record::{FileStat, ImageRecord};
use crate::common::errors::DedupError;

/// Load and fingerprint a single file. Failures become a failed record.
pub fn process_file(path: &Path, hasher: &PerceptualHasher) -> ImageRecord {
    let stat = FileStat::of(path);
    match loader::load_frame(path, hasher.params().grid) {
        Ok(loaded) => {
            let fingerprint = hasher.hash(&loaded.frame);
            debug!(path = %path.display(), hash = %fingerprint.to_hex(), "hashed");
            ImageRecord::loaded(
                path.to_path_buf(),
                stat,
                fingerprint,
                loaded.resolution,
                loaded.digest,
            )
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load image");
            ImageRecord::failed(path.to_path_buf(), stat, e)
        }
    }
}

/// Load and hash every path on a dedicated pool of `workers` threads.
///
/// Records are appended as workers finish, so the result is in completion
/// order. Per-file failures never stop sibling work. Returns once every
/// path has a record.
pub fn hash_all(
    paths: &[PathBuf],
    hasher: &PerceptualHasher,
    workers: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<ImageRecord>, DedupError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("imgdedup-hash-{i}"))
        .build()
        .map_err(|e| DedupError::config(format!("cannot start {workers} workers: {e}")))?;

    let results = Mutex::new(Vec::with_capacity(paths.len()));

    pool.install(|| {
        paths.par_iter().for_each(|path| {
            let record = process_file(path, hasher);
            results
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(record);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        });
    });

    Ok(results
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner()))
}
