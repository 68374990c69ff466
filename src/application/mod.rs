// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training a model or scoring test data).
//
// Rules for this layer:
//   - No ML math or tensor code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file-format knowledge (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow
pub mod train_use_case;

// The test-set scoring workflow
pub mod predict_use_case;
