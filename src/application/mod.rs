// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal each: train a model, serve it, or run one prediction.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing or printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Classification and regression training workflows
pub mod train_use_case;

// Load an artifact and run the HTTP server
pub mod serve_use_case;

// Offline single-row prediction
pub mod predict_use_case;
