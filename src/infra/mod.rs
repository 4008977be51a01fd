// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   artifact_store.rs — Saving and loading model bundles
//                       Frames a bincode-encoded ModelBundle
//                       with a magic/version header and maps
//                       read failures onto ArtifactError.
//
//   metrics.rs        — Training metrics logging
//                       Writes per-epoch MLP loss and accuracy
//                       to a CSV next to the artifact.

/// Model artifact encoding, decoding, and file storage
pub mod artifact_store;

/// Training metrics CSV logger
pub mod metrics;
