// ============================================================
// Layer 6 — Run Log
// ============================================================
// Human-readable, append-only log at <save_dir>/log.
//
// Every line has the form
//   2026-10-19 14:03:11 INFO Train Epoch: 1 [0/5 (0%)] ...
//
// Each record also goes to the console through tracing, so the
// file and the terminal always show the same progress.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { path: dir.join("log") })
    }

    pub fn info(&self, message: &str) -> Result<()> {
        tracing::info!("{message}");

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open run log '{}'", self.path.display()))?;

        writeln!(
            f,
            "{} INFO {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
