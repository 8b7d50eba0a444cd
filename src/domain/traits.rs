// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer reads samples through SampleSource so
// it never depends on the table format directly.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sample::SampleRecord;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the full list of sample rows.
///
/// Implementations:
///   - CsvSampleTable → reads a comma-separated table with a header row
pub trait SampleSource {
    /// Load every sample row. A malformed row is an error, not a skip.
    fn load_all(&self) -> Result<Vec<SampleRecord>>;
}
