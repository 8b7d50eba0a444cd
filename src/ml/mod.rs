// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer holds the network and everything that runs it.
//
// What's in this layer:
//
//   model.rs     — ResNet-18 / ResNet-34 backbones
//                  • 7x7 stem + max pool
//                  • four stages of basic residual blocks
//                  • global average pool
//                  • 2-way linear head (optionally swapped in
//                    over an ImageNet-pretrained backbone)
//
//   step.rs      — One forward + backward pass, optionally
//                  split across several devices
//
//   trainer.rs   — The epoch loop
//                  Training step, evaluation step and the
//                  best-accuracy checkpoint policy, in order
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// ResNet classifier and model factory
pub mod model;

/// Forward/backward step with data-parallel chunking
pub mod step;

/// Epoch loop with evaluation and checkpointing
pub mod trainer;
