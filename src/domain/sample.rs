// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// A SampleRecord is one row of the sample table: where the
// image lives, which cluster it belongs to, and its 0/1 label.
//
// Architecture and LabelField are the two closed choices on the
// command line. Both implement FromStr so clap rejects unknown
// names before any file is touched.
//
// Reference: Rust Book §6 (Enums), §5 (Structs)

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// One labelled image, immutable once read from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Path to the image file, as written in the table
    pub image_path: PathBuf,

    /// Grouping key used for the train/validation split
    pub cluster: String,

    /// Binary class: 0 or 1
    pub label: u8,
}

impl SampleRecord {
    pub fn new(image_path: impl Into<PathBuf>, cluster: impl Into<String>, label: u8) -> Self {
        Self {
            image_path: image_path.into(),
            cluster:    cluster.into(),
            label,
        }
    }
}

// ─── Architecture ─────────────────────────────────────────────────────────────
/// The two supported residual-network backbones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    ResNet18,
    ResNet34,
}

impl Architecture {
    pub const ALL: [Architecture; 2] = [Architecture::ResNet18, Architecture::ResNet34];

    pub fn name(&self) -> &'static str {
        match self {
            Architecture::ResNet18 => "resnet18",
            Architecture::ResNet34 => "resnet34",
        }
    }

    /// Number of basic blocks in each of the four residual stages.
    pub fn stage_depths(&self) -> [usize; 4] {
        match self {
            Architecture::ResNet18 => [2, 2, 2, 2],
            Architecture::ResNet34 => [3, 4, 6, 3],
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unsupported architecture '{s}' (choose resnet18 or resnet34)"))
    }
}

// ─── LabelField ───────────────────────────────────────────────────────────────
/// Which table column provides the training target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    PovLabel,
    PopLabel,
    BmiLabel,
}

impl LabelField {
    pub const ALL: [LabelField; 3] = [LabelField::PovLabel, LabelField::PopLabel, LabelField::BmiLabel];

    /// The column header in the sample table
    pub fn column(&self) -> &'static str {
        match self {
            LabelField::PovLabel => "pov_label",
            LabelField::PopLabel => "pop_label",
            LabelField::BmiLabel => "bmi_label",
        }
    }
}

impl fmt::Display for LabelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for LabelField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelField::ALL
            .into_iter()
            .find(|l| l.column() == s)
            .ok_or_else(|| {
                format!("unsupported label '{s}' (choose pov_label, pop_label or bmi_label)")
            })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_architecture_names_parse_back() {
        for arch in Architecture::ALL {
            assert_eq!(arch.name().parse::<Architecture>().unwrap(), arch);
        }
    }

    #[test]
    fn test_unknown_architecture_rejected() {
        let err = "resnet50".parse::<Architecture>().unwrap_err();
        assert!(err.contains("resnet50"));
    }

    #[test]
    fn test_label_field_rejects_unknown_column() {
        assert_eq!("bmi_label".parse::<LabelField>().unwrap(), LabelField::BmiLabel);
        assert!("income_label".parse::<LabelField>().is_err());
    }

    #[test]
    fn test_resnet34_is_deeper() {
        let shallow: usize = Architecture::ResNet18.stage_depths().iter().sum();
        let deep: usize    = Architecture::ResNet34.stage_depths().iter().sum();
        assert_eq!(shallow, 8);
        assert_eq!(deep, 16);
    }
}
