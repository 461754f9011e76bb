// ============================================================================
// Loyalty Domain - Business Logic for one customer's membership
// ============================================================================
//
// This module contains ALL loyalty-specific code:
// - Tier catalog (Member, Bronze, Silver, Gold, Platinum)
// - Customer record (the state an actor owns and hands off)
// - Commands, Events, Errors
// - Aggregate (LoyaltyAccount with the promotion and guest rules)
// - Notification texts
//
// This is completely separate from the actor runtime that hosts it.
//
// ============================================================================

pub mod tier;
pub mod record;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod notifications;

// Re-export for convenience
pub use tier::*;
pub use record::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use notifications::*;
