// ============================================================
// Layer 4 — Sample Table Reader
// ============================================================
// Reads the CSV sample table with the csv crate.
//
// The table has a header row. Three columns matter:
//   - the image path column   (default: img_path_224x224)
//   - the cluster id column   (default: unique_cluster)
//   - the selected label column (pov_label / pop_label / bmi_label)
// Any other columns are ignored.
//
// Label cells are parsed as numbers ("1", "0", "1.0") and must be
// exactly 0 or 1. Anything else aborts the load.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use csv::StringRecord;

use crate::domain::sample::{LabelField, SampleRecord};
use crate::domain::traits::SampleSource;

/// Reads SampleRecords from a CSV file with a header row.
pub struct CsvSampleTable {
    path:           PathBuf,
    image_column:   String,
    cluster_column: String,
    label:          LabelField,
}

impl CsvSampleTable {
    pub fn new(
        path:           impl Into<PathBuf>,
        image_column:   impl Into<String>,
        cluster_column: impl Into<String>,
        label:          LabelField,
    ) -> Self {
        Self {
            path:           path.into(),
            image_column:   image_column.into(),
            cluster_column: cluster_column.into(),
            label,
        }
    }

    fn column_index(&self, headers: &StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| {
                format!("column '{}' not found in '{}'", name, self.path.display())
            })
    }
}

impl SampleSource for CsvSampleTable {
    fn load_all(&self) -> Result<Vec<SampleRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot open sample table '{}'", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .clone();

        let image_idx   = self.column_index(&headers, &self.image_column)?;
        let cluster_idx = self.column_index(&headers, &self.cluster_column)?;
        let label_idx   = self.column_index(&headers, self.label.column())?;

        let mut samples = Vec::new();
        for row in reader.records() {
            let row  = row.with_context(|| format!("Malformed row in '{}'", self.path.display()))?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            let image_path = row.get(image_idx).unwrap_or_default().trim();
            let cluster    = row.get(cluster_idx).unwrap_or_default().trim();
            let label_cell = row.get(label_idx).unwrap_or_default();

            let label = parse_label(label_cell)
                .with_context(|| format!("line {line} of '{}'", self.path.display()))?;

            samples.push(SampleRecord::new(image_path, cluster, label));
        }

        tracing::info!(
            "Read {} rows from '{}' (label column '{}')",
            samples.len(),
            self.path.display(),
            self.label
        );
        Ok(samples)
    }
}

/// Parse a 0/1 label cell. Accepts integer or float spellings.
pub fn parse_label(cell: &str) -> Result<u8> {
    let value: f64 = cell
        .trim()
        .parse()
        .with_context(|| format!("label '{cell}' is not a number"))?;

    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        bail!("label {value} is not binary (expected 0 or 1)")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    fn write_table(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("samples.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_reads_selected_label_column() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_table(
            dir.path(),
            "img_path_224x224,unique_cluster,pov_label,pop_label\n\
             a.png,c1,1,0\n\
             b.png,c2,0.0,1\n",
        );

        let table = CsvSampleTable::new(&path, "img_path_224x224", "unique_cluster", LabelField::PovLabel);
        let rows  = table.load_all().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], SampleRecord::new("a.png", "c1", 1));
        assert_eq!(rows[1].label, 0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir   = tempfile::tempdir().unwrap();
        let path  = write_table(dir.path(), "img_path_224x224,unique_cluster\na.png,c1\n");
        let table = CsvSampleTable::new(&path, "img_path_224x224", "unique_cluster", LabelField::BmiLabel);

        let err = table.load_all().unwrap_err();
        assert!(format!("{err:#}").contains("bmi_label"));
    }

    #[test]
    fn test_non_binary_label_rejected() {
        assert_eq!(parse_label(" 1 ").unwrap(), 1);
        assert!(parse_label("2").is_err());
        assert!(parse_label("yes").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let table = CsvSampleTable::new("/nonexistent/table.csv", "p", "c", LabelField::PovLabel);
        assert!(table.load_all().is_err());
    }
}
