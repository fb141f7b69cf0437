use image::{imageops, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::common::errors::DedupError;
use crate::duplicates::loader::decode_oriented;
use crate::duplicates::record::{Cluster, ClusterKind};

/// Longest side of each thumbnail cell
pub const CELL: u32 = 200;
pub const MAX_COLUMNS: u32 = 4;
const GAP: u32 = 8;

/// Near-duplicate clusters large enough to be worth a visual check
pub fn wants_sheet(cluster: &Cluster) -> bool {
    cluster.kind == ClusterKind::Near && cluster.len() > 2
}

/// Grid of thumbnails, master first, white background
pub fn render_sheet(paths: &[&Path]) -> Result<RgbImage, DedupError> {
    let count = paths.len().max(1) as u32;
    let columns = count.min(MAX_COLUMNS);
    let rows = count.div_ceil(columns);
    let width = columns * CELL + (columns + 1) * GAP;
    let height = rows * CELL + (rows + 1) * GAP;
    let mut sheet = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (i, path) in paths.iter().enumerate() {
        let bytes = std::fs::read(path).map_err(|e| DedupError::io(*path, e))?;
        let img = decode_oriented(&bytes).map_err(|e| DedupError::Report {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let thumb = img.thumbnail(CELL, CELL).to_rgb8();

        let col = i as u32 % columns;
        let row = i as u32 / columns;
        // Center each thumbnail in its cell
        let x = GAP + col * (CELL + GAP) + (CELL - thumb.width()) / 2;
        let y = GAP + row * (CELL + GAP) + (CELL - thumb.height()) / 2;
        imageops::overlay(&mut sheet, &thumb, x as i64, y as i64);
    }
    Ok(sheet)
}

/// Render and save one sheet per qualifying cluster into `out_dir`.
/// Individual failures are logged and skipped.
pub fn write_contact_sheets(clusters: &[Cluster], out_dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for cluster in clusters.iter().filter(|c| wants_sheet(c)) {
        let mut paths: Vec<&Path> = vec![cluster.master().path.as_path()];
        paths.extend(cluster.duplicates().map(|m| m.path.as_path()));

        let out = out_dir.join(format!("contact_sheet_group_{}.png", cluster.id));
        let result = render_sheet(&paths).and_then(|sheet| {
            std::fs::create_dir_all(out_dir).map_err(|e| DedupError::io(out_dir, e))?;
            sheet.save(&out).map_err(|e| DedupError::Report {
                path: out.clone(),
                message: e.to_string(),
            })
        });

        match result {
            Ok(()) => {
                debug!(path = %out.display(), members = cluster.len(), "contact sheet written");
                written.push(out);
            }
            Err(e) => warn!(cluster = cluster.id, error = %e, "contact sheet skipped"),
        }
    }
    written
}
