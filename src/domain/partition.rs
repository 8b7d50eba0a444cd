// ============================================================
// Layer 3 — Cluster Partition
// ============================================================
// Samples are split by cluster id, not by row, so images of the
// same place never appear on both sides of the split.
//
// The two sets must be disjoint. They do not have to cover every
// cluster: rows whose cluster is in neither set are excluded.

use std::collections::BTreeSet;

use anyhow::{bail, Result};

/// Which side of the split a sample falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Validation,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterPartition {
    train: BTreeSet<String>,
    val:   BTreeSet<String>,
}

impl ClusterPartition {
    /// Build a partition, failing if any id is listed on both sides.
    pub fn new<I, J>(train: I, val: J) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        let train: BTreeSet<String> = train.into_iter().map(Into::into).collect();
        let val:   BTreeSet<String> = val.into_iter().map(Into::into).collect();

        let shared: Vec<&String> = train.intersection(&val).collect();
        if !shared.is_empty() {
            bail!(
                "{} cluster id(s) are listed for both training and validation, e.g. '{}'",
                shared.len(),
                shared[0]
            );
        }

        Ok(Self { train, val })
    }

    /// Side of the split for a cluster, or None if it is excluded.
    pub fn side(&self, cluster: &str) -> Option<Split> {
        if self.train.contains(cluster) {
            Some(Split::Train)
        } else if self.val.contains(cluster) {
            Some(Split::Validation)
        } else {
            None
        }
    }

    pub fn train_len(&self) -> usize { self.train.len() }

    pub fn val_len(&self) -> usize { self.val.len() }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_sets_rejected() {
        let err = ClusterPartition::new(["a", "b"], ["b", "c"]).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_side_lookup() {
        let p = ClusterPartition::new(["a", "b"], ["c"]).unwrap();
        assert_eq!(p.side("a"), Some(Split::Train));
        assert_eq!(p.side("c"), Some(Split::Validation));
        // Clusters in neither list are excluded
        assert_eq!(p.side("z"), None);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let p = ClusterPartition::new(["a", "a"], ["b"]).unwrap();
        assert_eq!(p.train_len(), 1);
        assert_eq!(p.val_len(), 1);
    }
}
