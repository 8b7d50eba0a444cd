// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the CSV sample table
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   samples.csv + cluster lists
//       │
//       ▼
//   CsvSampleTable    → reads rows (path, cluster, label)
//       │
//       ▼
//   split_by_cluster  → train / validation / excluded
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait,
//       │               decodes one image per access
//       ▼
//   ImageBatcher      → stacks items into tensor batches
//       │
//       ▼
//   DataLoader        → shuffles per epoch, decodes on worker
//                       threads, feeds the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the CSV sample table
pub mod table;

/// Splits rows into train/validation by cluster id
pub mod splitter;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
