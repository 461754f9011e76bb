// ============================================================================
// Customer Loyalty Actors
// ============================================================================
//
// Each customer is a long-lived actor holding points, a status tier and a
// guest list. Customers invite guests, which creates or raises the guest's
// own actor, and a busy actor periodically continues as a fresh run to keep
// its history bounded.
//
// ============================================================================

pub mod actors;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod notification;
pub mod utils;
