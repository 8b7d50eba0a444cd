// ============================================================
// Layer 4 — Cluster-Based Train/Validation Splitter
// ============================================================
// Assigns every sample row to training or validation according
// to its cluster id:
//   - cluster in the train list      → training set
//   - cluster in the validation list → validation set
//   - cluster in neither             → excluded
//
// Why split by cluster instead of by row?
//   Images from the same cluster are near-duplicates of each
//   other. A random row split would put neighbours on both sides
//   and inflate the validation accuracy.
//
// Cluster list files hold one id per line. Trailing whitespace
// (including Windows line endings) is trimmed and blank lines
// are ignored.
//
// Reference: Rust Book §8 (Collections)

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use crate::domain::partition::{ClusterPartition, Split};
use crate::domain::sample::SampleRecord;

/// Read a cluster list: one id per line.
pub fn read_cluster_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read cluster list '{}'", path.display()))?;

    Ok(text
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Load both cluster lists and build a disjoint partition.
pub fn load_partition(train_path: &Path, val_path: &Path) -> Result<ClusterPartition> {
    let train = read_cluster_list(train_path)?;
    let val   = read_cluster_list(val_path)?;

    let partition = ClusterPartition::new(train, val).with_context(|| {
        format!(
            "Cluster lists '{}' and '{}' overlap",
            train_path.display(),
            val_path.display()
        )
    })?;

    tracing::info!(
        "Cluster partition: {} train clusters, {} validation clusters",
        partition.train_len(),
        partition.val_len()
    );
    Ok(partition)
}

/// Split rows by cluster. Returns (train, validation); excluded rows are dropped.
///
/// Fails if either side ends up empty: a run with nothing to
/// train on or nothing to validate on cannot produce a checkpoint.
pub fn split_by_cluster(
    samples:   Vec<SampleRecord>,
    partition: &ClusterPartition,
) -> Result<(Vec<SampleRecord>, Vec<SampleRecord>)> {
    let total = samples.len();
    let mut train = Vec::new();
    let mut val   = Vec::new();

    for sample in samples {
        match partition.side(&sample.cluster) {
            Some(Split::Train)      => train.push(sample),
            Some(Split::Validation) => val.push(sample),
            None                    => {}
        }
    }

    let excluded = total - train.len() - val.len();
    tracing::info!(
        "Dataset split: {} training, {} validation, {} excluded",
        train.len(),
        val.len(),
        excluded,
    );

    if train.is_empty() {
        bail!("no sample belongs to a training cluster");
    }
    if val.is_empty() {
        bail!("no sample belongs to a validation cluster");
    }

    Ok((train, val))
}
