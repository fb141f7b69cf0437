use tracing::debug;

use super::distance::hamming_distance;
use super::record::{Cluster, ClusterKind, ImageRecord};
use super::resolver::select_master;

/// Disjoint-set forest with path halving and union by rank
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns false when both were already in the same set
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Partition the fingerprinted records into connected components of the
/// "distance <= max_distance" graph.
///
/// Every pair is considered; pairs already known to be connected skip the
/// distance computation, which cannot change the components. Returned groups
/// hold indices into `records` in ascending order, groups ordered by their
/// smallest index. Records without a fingerprint appear in no group.
pub fn partition(records: &[ImageRecord], max_distance: u32) -> Vec<Vec<usize>> {
    let hashed: Vec<usize> = (0..records.len())
        .filter(|&i| records[i].is_hashed())
        .collect();
    let mut sets = DisjointSet::new(hashed.len());
    let mut comparisons = 0usize;

    for a in 0..hashed.len() {
        let Some(fa) = records[hashed[a]].fingerprint() else {
            continue;
        };
        for b in (a + 1)..hashed.len() {
            if sets.find(a) == sets.find(b) {
                continue;
            }
            let Some(fb) = records[hashed[b]].fingerprint() else {
                continue;
            };
            comparisons += 1;
            if hamming_distance(fa, fb) <= max_distance {
                sets.union(a, b);
            }
        }
    }
    debug!(records = hashed.len(), comparisons, max_distance, "pairwise comparison done");

    // Roots in order of first appearance keep the output ordered by smallest member
    let mut slot_of_root: Vec<Option<usize>> = vec![None; hashed.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for a in 0..hashed.len() {
        let root = sets.find(a);
        let slot = match slot_of_root[root] {
            Some(slot) => slot,
            None => {
                groups.push(Vec::new());
                slot_of_root[root] = Some(groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].push(hashed[a]);
    }
    groups
}

/// EXACT when every member shares one fingerprint
pub fn classify(members: &[ImageRecord]) -> ClusterKind {
    let mut prints = members.iter().filter_map(|m| m.fingerprint());
    match prints.next() {
        Some(first) if prints.all(|p| p == first) => ClusterKind::Exact,
        Some(_) => ClusterKind::Near,
        None => ClusterKind::Exact,
    }
}

/// Build duplicate clusters: components with two or more members, each with
/// its master chosen and ids assigned from 1 in output order.
pub fn build_clusters(records: &[ImageRecord], max_distance: u32) -> Vec<Cluster> {
    partition(records, max_distance)
        .into_iter()
        .filter(|group| group.len() > 1)
        .enumerate()
        .map(|(n, group)| {
            let members: Vec<ImageRecord> = group.iter().map(|&i| records[i].clone()).collect();
            let master = select_master(&members);
            Cluster {
                id: n + 1,
                kind: classify(&members),
                members,
                master,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::LoadError;
    use crate::duplicates::perceptual::Fingerprint;
    use crate::duplicates::record::FileStat;
    use std::path::PathBuf;

    /// 16-bit fingerprint with the first `ones` bits set
    fn fp(ones: usize) -> Fingerprint {
        let bits: Vec<bool> = (0..16).map(|i| i < ones).collect();
        Fingerprint::from_bits(&bits)
    }

    fn rec(name: &str, print: Fingerprint) -> ImageRecord {
        ImageRecord::loaded(
            PathBuf::from(format!("/photos/{name}")),
            FileStat::default(),
            print,
            (100, 100),
            name.to_string(),
        )
    }

    fn failed(name: &str) -> ImageRecord {
        ImageRecord::failed(
            PathBuf::from(format!("/photos/{name}")),
            FileStat::default(),
            LoadError::Decode("bad".into()),
        )
    }

    #[test]
    fn union_find_basics() {
        let mut ds = DisjointSet::new(5);
        assert!(ds.union(0, 1));
        assert!(ds.union(3, 4));
        assert!(!ds.union(1, 0));
        assert_eq!(ds.find(0), ds.find(1));
        assert_ne!(ds.find(1), ds.find(3));
        assert!(ds.union(1, 4));
        assert_eq!(ds.find(0), ds.find(3));
    }

    #[test]
    fn chain_of_near_matches_forms_one_cluster() {
        // a-b = 5, b-c = 5, a-c = 10 > threshold 6
        let records = vec![rec("a", fp(0)), rec("b", fp(5)), rec("c", fp(10))];
        let groups = partition(&records, 6);
        assert_eq!(groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn partition_covers_every_hashed_record_once() {
        let records = vec![
            rec("a", fp(0)),
            rec("b", fp(8)),
            failed("broken"),
            rec("c", fp(1)),
            rec("d", fp(16)),
            rec("e", fp(9)),
        ];
        let groups = partition(&records, 1);
        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 3, 4, 5]);
        assert_eq!(groups, vec![vec![0, 3], vec![1, 5], vec![4]]);
    }

    #[test]
    fn singletons_and_failures_are_not_clusters() {
        let records = vec![rec("a", fp(0)), rec("b", fp(16)), failed("c")];
        assert!(build_clusters(&records, 3).is_empty());
    }

    #[test]
    fn zero_threshold_only_groups_identical_prints() {
        let records = vec![rec("a", fp(4)), rec("b", fp(5)), rec("c", fp(4))];
        let clusters = build_clusters(&records, 0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, ClusterKind::Exact);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn full_threshold_groups_everything() {
        let records = vec![rec("a", fp(0)), rec("b", fp(16)), rec("c", fp(8))];
        let clusters = build_clusters(&records, 16);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
        assert_eq!(clusters[0].kind, ClusterKind::Near);
    }

    #[test]
    fn ids_follow_output_order() {
        let records = vec![
            rec("a", fp(0)),
            rec("b", fp(16)),
            rec("c", fp(0)),
            rec("d", fp(16)),
        ];
        let clusters = build_clusters(&records, 0);
        let ids: Vec<usize> = clusters.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(clusters[0].members[0].path, PathBuf::from("/photos/a"));
        assert_eq!(clusters[1].members[0].path, PathBuf::from("/photos/b"));
    }
}
