// ============================================================================
// Actors Module
// ============================================================================
//
// One kameo actor per customer, addressed through a host registry.
//
// Structure:
// - customer_actor - The loyalty state machine and its messages
// - invitation     - Guest invitation protocol between two actors
// - outbox         - Per-customer notification delivery, off the signal path
// - host/          - ActorHost contract, LocalHost registry, CustomerHandle
// - snapshot       - Published state that queries read
//
// ============================================================================

mod customer_actor;
mod invitation;
mod outbox;
mod snapshot;

pub mod host;

pub use customer_actor::{
    AddPoints, CancelAccount, CustomerActor, CustomerActorArgs, EnsureMinimumStatus, InviteGuest, Settle,
};
pub use host::{ActorHost, Creation, CustomerHandle, HostError, LocalHost, Signal, SignalError};
pub use invitation::{invite_guest, InviteOutcome};
pub use outbox::{Deliver, Flush, NotificationOutbox};
pub use snapshot::{CustomerSnapshot, RunInfo, RunOutcome, StatusReport};
