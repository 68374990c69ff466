// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits defining the core
// concepts of the RUL pipeline.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or tensor code
//   - Only plain Rust structs, enums, and traits
//
// What lives here:
//   table.rs  — the in-memory sensor table (units, cycles, features)
//   rul.rs    — remaining-useful-life label reconstruction
//   errors.rs — the typed error taxonomy for the whole pipeline
//   traits.rs — the WindowPolicy capability both indexers implement
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The parsed sensor table and its per-unit structure
pub mod table;

// RUL label math for train and test units
pub mod rul;

// Typed pipeline errors (thiserror)
pub mod errors;

// Core abstractions (traits) that other layers implement
pub mod traits;
