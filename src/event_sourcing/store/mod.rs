// ============================================================================
// Event Sourcing Store - Generic Recording Layer
// ============================================================================
//
// Generic, in-memory recording infrastructure for event sourcing.
// Works with ANY event type.
//
// ============================================================================

pub mod history;

pub use history::EventHistory;
