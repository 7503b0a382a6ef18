// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: these modules tell the other
// layers what to do and hand structured results back to the
// CLI, which decides how to print them.

// The training workflow
pub mod train_use_case;

// Scoring elements with an exported model
pub mod detect_use_case;
