// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the classifier trains on:
// sample rows, the binary label choice, the backbone choice,
// and the cluster-based train/validation partition.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or image decoding
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One row of the sample table and the enums naming its columns
pub mod sample;

// Disjoint train / validation cluster sets
pub mod partition;

// Core abstractions (traits) that other layers implement
pub mod traits;
