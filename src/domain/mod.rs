// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define the core concepts:
// what a prediction is, what kinds of model exist, and the
// interfaces the other layers implement.
//
// Rules for this layer:
//   - NO burn or linfa types
//   - NO file I/O or network calls
//   - Only structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Model kinds and single-row predictions
pub mod prediction;

// Core abstractions (traits) that other layers implement
pub mod traits;
