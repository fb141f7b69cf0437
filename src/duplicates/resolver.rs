use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::distance::{hamming_distance, similarity_score};
use super::record::{Action, Cluster, DispositionRecord, ImageRecord};

/// Ranking used to pick a cluster's master. `Less` means `a` is the better master:
/// more pixels, then earlier modification time, then the smaller path.
pub fn master_order(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    b.pixel_count()
        .cmp(&a.pixel_count())
        .then_with(|| a.modified_time.cmp(&b.modified_time))
        .then_with(|| a.path.cmp(&b.path))
}

/// Index of the master among `members` (0 for an empty slice)
pub fn select_master(members: &[ImageRecord]) -> usize {
    members
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| master_order(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Where planned moves land and whether to delete instead
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub scan_root: PathBuf,
    pub duplicates_root: PathBuf,
    pub delete: bool,
}

/// A move target that had to be renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub source_path: PathBuf,
    pub wanted: PathBuf,
    pub resolved: PathBuf,
}

/// Every disposition for one run, in cluster order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    /// Per cluster: the master's `KeepMaster` record, then one record per other member
    pub dispositions: Vec<DispositionRecord>,
    pub collisions: Vec<Collision>,
}

impl Plan {
    /// Records that move or delete a file
    pub fn actionable(&self) -> impl Iterator<Item = &DispositionRecord> {
        self.dispositions
            .iter()
            .filter(|d| d.action != Action::KeepMaster)
    }

    pub fn for_cluster(&self, cluster_id: usize) -> impl Iterator<Item = &DispositionRecord> {
        self.dispositions
            .iter()
            .filter(move |d| d.cluster_id == cluster_id)
    }
}

/// Plan against the real filesystem
pub fn plan_on_disk(clusters: &[Cluster], options: &PlanOptions) -> Plan {
    plan_actions(clusters, options, |p| p.exists())
}

/// Decide what happens to every member of every cluster.
///
/// `exists` reports whether a path is already taken on disk. Move targets
/// that are taken, or already claimed earlier in this plan, get `_1`, `_2`, ...
/// appended to the file stem.
pub fn plan_actions(
    clusters: &[Cluster],
    options: &PlanOptions,
    exists: impl Fn(&Path) -> bool,
) -> Plan {
    let mut plan = Plan::default();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for cluster in clusters {
        let master = cluster.master();
        let bit_len = master.fingerprint().map(|f| f.len()).unwrap_or(0);

        plan.dispositions.push(DispositionRecord {
            cluster_id: cluster.id,
            source_path: master.path.clone(),
            master_path: master.path.clone(),
            action: Action::KeepMaster,
            target_path: None,
            distance: 0,
            similarity_score: 100,
            byte_identical: true,
            file_size_bytes: master.file_size_bytes,
        });

        for member in cluster.duplicates() {
            let distance = match (master.fingerprint(), member.fingerprint()) {
                (Some(a), Some(b)) => hamming_distance(a, b),
                _ => bit_len as u32,
            };

            let (action, target_path) = if options.delete {
                (Action::Delete, None)
            } else {
                let wanted = mirrored_target(&options.duplicates_root, &options.scan_root, &member.path);
                let resolved = claim_free_path(&wanted, &mut claimed, &exists);
                if resolved != wanted {
                    warn!(
                        source = %member.path.display(),
                        wanted = %wanted.display(),
                        resolved = %resolved.display(),
                        "move target already taken, renamed"
                    );
                    plan.collisions.push(Collision {
                        source_path: member.path.clone(),
                        wanted,
                        resolved: resolved.clone(),
                    });
                }
                (Action::Move, Some(resolved))
            };

            plan.dispositions.push(DispositionRecord {
                cluster_id: cluster.id,
                source_path: member.path.clone(),
                master_path: master.path.clone(),
                action,
                target_path,
                distance,
                similarity_score: similarity_score(distance, bit_len),
                byte_identical: member.content_digest.is_some()
                    && member.content_digest == master.content_digest,
                file_size_bytes: member.file_size_bytes,
            });
        }
    }

    plan
}

/// `duplicates_root` + the source's path relative to `scan_root`.
/// Sources outside the scan root keep only their file name.
pub fn mirrored_target(duplicates_root: &Path, scan_root: &Path, source: &Path) -> PathBuf {
    match source.strip_prefix(scan_root) {
        Ok(relative) => duplicates_root.join(relative),
        Err(_) => duplicates_root.join(source.file_name().unwrap_or(source.as_os_str())),
    }
}

/// `photo.jpg` + 2 -> `photo_2.jpg`
pub fn numbered_variant(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

/// First of `wanted`, `wanted_1`, `wanted_2`, ... that is neither on disk nor
/// claimed, and claim it.
pub fn claim_free_path(
    wanted: &Path,
    claimed: &mut HashSet<PathBuf>,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    let mut candidate = wanted.to_path_buf();
    let mut n = 0;
    while claimed.contains(&candidate) || exists(&candidate) {
        n += 1;
        candidate = numbered_variant(wanted, n);
    }
    claimed.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::perceptual::Fingerprint;
    use crate::duplicates::record::{ClusterKind, FileStat};
    use chrono::{DateTime, Duration, Utc};

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from(std::time::UNIX_EPOCH)
    }

    fn rec(path: &str, res: (u32, u32), age_secs: i64, ones: usize) -> ImageRecord {
        let bits: Vec<bool> = (0..63).map(|i| i < ones).collect();
        ImageRecord::loaded(
            PathBuf::from(path),
            FileStat {
                size_bytes: 1000,
                modified: epoch() + Duration::seconds(age_secs),
            },
            Fingerprint::from_bits(&bits),
            res,
            format!("digest-{ones}"),
        )
    }

    fn cluster(members: Vec<ImageRecord>) -> Cluster {
        let master = select_master(&members);
        Cluster {
            id: 1,
            kind: ClusterKind::Near,
            members,
            master,
        }
    }

    fn options(delete: bool) -> PlanOptions {
        PlanOptions {
            scan_root: PathBuf::from("/photos"),
            duplicates_root: PathBuf::from("/photos/duplicates_found"),
            delete,
        }
    }

    #[test]
    fn highest_resolution_wins() {
        let members = vec![
            rec("/photos/small.jpg", (500, 500), 0, 0),
            rec("/photos/big.jpg", (1000, 1000), 50, 0),
        ];
        assert_eq!(select_master(&members), 1);
    }

    #[test]
    fn earliest_modified_breaks_resolution_tie() {
        let members = vec![
            rec("/photos/a.jpg", (800, 600), 20, 0),
            rec("/photos/b.jpg", (600, 800), 10, 0),
        ];
        assert_eq!(select_master(&members), 1);
    }

    #[test]
    fn path_breaks_full_tie() {
        let members = vec![
            rec("/photos/z/img.jpg", (800, 600), 10, 0),
            rec("/photos/a/img.jpg", (800, 600), 10, 0),
        ];
        assert_eq!(select_master(&members), 1);
    }

    #[test]
    fn master_selection_is_order_independent() {
        let a = rec("/photos/a.jpg", (800, 600), 10, 0);
        let b = rec("/photos/b.jpg", (800, 600), 10, 0);
        let c = rec("/photos/c.jpg", (640, 480), 0, 0);
        let first = vec![a.clone(), b.clone(), c.clone()];
        let second = vec![c, b, a];
        assert_eq!(first[select_master(&first)].path, second[select_master(&second)].path);
    }

    #[test]
    fn moves_preserve_relative_structure() {
        let c = cluster(vec![
            rec("/photos/2020/trip/a.jpg", (1000, 1000), 0, 0),
            rec("/photos/backup/a.jpg", (500, 500), 0, 3),
        ]);
        let plan = plan_actions(&[c], &options(false), |_| false);
        let moves: Vec<_> = plan.actionable().collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].action, Action::Move);
        assert_eq!(
            moves[0].target_path.as_deref(),
            Some(Path::new("/photos/duplicates_found/backup/a.jpg"))
        );
        assert_eq!(moves[0].distance, 3);
        assert_eq!(moves[0].similarity_score, 95);
        assert!(!moves[0].byte_identical);
    }

    #[test]
    fn master_gets_keep_record() {
        let c = cluster(vec![
            rec("/photos/a.jpg", (1000, 1000), 0, 0),
            rec("/photos/b.jpg", (500, 500), 0, 0),
        ]);
        let plan = plan_actions(&[c], &options(false), |_| false);
        assert_eq!(plan.dispositions[0].action, Action::KeepMaster);
        assert_eq!(plan.dispositions[0].source_path, PathBuf::from("/photos/a.jpg"));
        assert_eq!(plan.actionable().count(), 1);
    }

    #[test]
    fn delete_flag_has_no_targets() {
        let c = cluster(vec![
            rec("/photos/a.jpg", (1000, 1000), 0, 0),
            rec("/photos/b.jpg", (500, 500), 0, 0),
        ]);
        let plan = plan_actions(&[c], &options(true), |_| false);
        let d: Vec<_> = plan.actionable().collect();
        assert_eq!(d[0].action, Action::Delete);
        assert!(d[0].target_path.is_none());
        assert_eq!(d[0].similarity_score, 100);
        assert!(d[0].byte_identical);
    }

    #[test]
    fn existing_target_is_renamed_not_overwritten() {
        let c = cluster(vec![
            rec("/photos/a.jpg", (1000, 1000), 0, 0),
            rec("/photos/b.jpg", (500, 500), 0, 0),
        ]);
        let taken = PathBuf::from("/photos/duplicates_found/b.jpg");
        let plan = plan_actions(&[c], &options(false), |p| p == taken);
        let d: Vec<_> = plan.actionable().collect();
        assert_eq!(
            d[0].target_path.as_deref(),
            Some(Path::new("/photos/duplicates_found/b_1.jpg"))
        );
        assert_eq!(plan.collisions.len(), 1);
    }

    #[test]
    fn targets_claimed_earlier_in_plan_are_not_reused() {
        let mut claimed = HashSet::new();
        let wanted = Path::new("/dup/x.png");
        assert_eq!(claim_free_path(wanted, &mut claimed, |_| false), PathBuf::from("/dup/x.png"));
        assert_eq!(claim_free_path(wanted, &mut claimed, |_| false), PathBuf::from("/dup/x_1.png"));
        assert_eq!(claim_free_path(wanted, &mut claimed, |_| false), PathBuf::from("/dup/x_2.png"));
    }

    #[test]
    fn numbered_variant_without_extension() {
        assert_eq!(numbered_variant(Path::new("/d/README"), 3), PathBuf::from("/d/README_3"));
    }

    #[test]
    fn outside_root_keeps_file_name() {
        let t = mirrored_target(Path::new("/dup"), Path::new("/photos"), Path::new("/elsewhere/p.jpg"));
        assert_eq!(t, PathBuf::from("/dup/p.jpg"));
    }
}
