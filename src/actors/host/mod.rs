// ============================================================================
// Actor Host - registry and delivery contract for customer actors
// ============================================================================
//
// The invitation protocol and the customer actor only see `ActorHost`:
// - create_if_absent: idempotent creation with a distinguishable outcome;
//   an existing actor whose account is canceled is reported as such
// - signal: resolve whatever instance is current for an id, then enqueue
//
// `LocalHost` implements the contract in-process on top of kameo.
//
// ============================================================================

mod handle;
mod local;

use async_trait::async_trait;

use crate::domain::loyalty::{ActorId, CustomerRecord, Tier};

pub use handle::{CustomerHandle, SignalError};
pub use local::LocalHost;

/// Outcome of an idempotent create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    Created,
    AlreadyExists,
    /// An actor exists under the id but its account is canceled
    Canceled,
}

/// Fire-and-forget messages that mutate a customer actor
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    AddPoints { points: u64 },
    InviteGuest { guest: CustomerRecord },
    EnsureMinimumStatus { floor: Tier },
    CancelAccount,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::AddPoints { .. } => "add_points",
            Signal::InviteGuest { .. } => "invite_guest",
            Signal::EnsureMinimumStatus { .. } => "ensure_minimum_status",
            Signal::CancelAccount => "cancel_account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("No actor registered under {0}")]
    NotFound(ActorId),

    #[error("An actor is already registered under {0}")]
    AlreadyStarted(ActorId),

    #[error("Actor {0} is not accepting messages")]
    MailboxClosed(ActorId),

    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid initial state: {0}")]
    InvalidState(String),
}

#[async_trait]
pub trait ActorHost: Send + Sync {
    /// Start an actor under `actor_id` unless one is already registered
    async fn create_if_absent(&self, actor_id: &ActorId, initial: CustomerRecord) -> Result<Creation, HostError>;

    /// Deliver `signal` to the instance currently registered under `actor_id`
    /// Returns once the signal is enqueued, not once it is applied
    async fn signal(&self, actor_id: &ActorId, signal: Signal) -> Result<(), HostError>;
}
