// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run writes to disk:
//
//   checkpoint.rs   — Best-accuracy checkpoint policy, and
//                     saving/loading model weights with Burn's
//                     CompactRecorder. Also saves/loads
//                     TrainConfig as JSON so `eval` can rebuild
//                     the model.
//
//   run_log.rs      — Append-only, timestamped run log
//
//   metrics.rs      — Scalar series (loss, accuracy) appended
//                     to a CSV file for plotting
//
//   run_context.rs  — Bundles the three above for one run
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint policy, saving and loading
pub mod checkpoint;

/// Human-readable run log
pub mod run_log;

/// Training metrics CSV stream
pub mod metrics;

/// Per-run output bundle passed through the epoch loop
pub mod run_context;
