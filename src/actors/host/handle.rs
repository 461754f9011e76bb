use kameo::actor::ActorRef;
use kameo::error::SendError;
use tokio::sync::watch;

use crate::actors::customer_actor::{AddPoints, CancelAccount, CustomerActor, EnsureMinimumStatus, InviteGuest, Settle};
use crate::actors::outbox::{Flush, NotificationOutbox};
use crate::actors::snapshot::{CustomerSnapshot, RunInfo, RunOutcome, StatusReport};
use crate::domain::loyalty::{ActorId, CustomerRecord, LoyaltyError, Tier};
use super::{HostError, Signal};

// ============================================================================
// Customer Handle - the caller-facing side of one customer actor
// ============================================================================
//
// Signals go through the mailbox. Queries read the last published snapshot
// and never queue behind signals.
//
// ============================================================================

/// Failure of a signal whose caller waited for it to be applied
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error(transparent)]
    Rejected(#[from] LoyaltyError),

    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Clone)]
pub struct CustomerHandle {
    actor_id: ActorId,
    actor_ref: ActorRef<CustomerActor>,
    outbox: ActorRef<NotificationOutbox>,
    snapshot: watch::Receiver<CustomerSnapshot>,
}

impl CustomerHandle {
    pub(crate) fn new(
        actor_id: ActorId,
        actor_ref: ActorRef<CustomerActor>,
        outbox: ActorRef<NotificationOutbox>,
        snapshot: watch::Receiver<CustomerSnapshot>,
    ) -> Self {
        Self { actor_id, actor_ref, outbox, snapshot }
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    pub(crate) fn actor_ref(&self) -> &ActorRef<CustomerActor> {
        &self.actor_ref
    }

    fn closed(&self) -> HostError {
        HostError::MailboxClosed(self.actor_id.clone())
    }

    // ------------------------------------------------------------------------
    // Signals (fire-and-forget)
    // ------------------------------------------------------------------------

    /// Enqueue a signal; returns before it is applied
    pub async fn signal(&self, signal: Signal) -> Result<(), HostError> {
        let sent = match signal {
            Signal::AddPoints { points } => self.actor_ref.tell(AddPoints { points }).await.is_ok(),
            Signal::InviteGuest { guest } => self.actor_ref.tell(InviteGuest { guest }).await.is_ok(),
            Signal::EnsureMinimumStatus { floor } => {
                self.actor_ref.tell(EnsureMinimumStatus { floor }).await.is_ok()
            }
            Signal::CancelAccount => self.actor_ref.tell(CancelAccount).await.is_ok(),
        };

        if sent { Ok(()) } else { Err(self.closed()) }
    }

    pub async fn add_points(&self, points: u64) -> Result<(), HostError> {
        self.signal(Signal::AddPoints { points }).await
    }

    pub async fn invite_guest(&self, guest: CustomerRecord) -> Result<(), HostError> {
        self.signal(Signal::InviteGuest { guest }).await
    }

    pub async fn ensure_minimum_status(&self, floor: Tier) -> Result<(), HostError> {
        self.signal(Signal::EnsureMinimumStatus { floor }).await
    }

    pub async fn cancel_account(&self) -> Result<(), HostError> {
        self.signal(Signal::CancelAccount).await
    }

    /// Apply a signal and wait for its result
    pub async fn apply(&self, signal: Signal) -> Result<(), SignalError> {
        match signal {
            Signal::AddPoints { points } => self.actor_ref.ask(AddPoints { points }).await.map_err(|e| self.ask_error(e)),
            Signal::InviteGuest { guest } => self.actor_ref.ask(InviteGuest { guest }).await.map_err(|e| self.ask_error(e)),
            Signal::EnsureMinimumStatus { floor } => {
                self.actor_ref.ask(EnsureMinimumStatus { floor }).await.map_err(|e| self.ask_error(e))
            }
            Signal::CancelAccount => self.actor_ref.ask(CancelAccount).await.map_err(|e| self.ask_error(e)),
        }
    }

    fn ask_error<M>(&self, err: SendError<M, LoyaltyError>) -> SignalError {
        match err {
            SendError::HandlerError(rejected) => SignalError::Rejected(rejected),
            _ => SignalError::Host(self.closed()),
        }
    }

    /// Wait until every signal enqueued before this call has been applied
    /// and the notifications it emitted are delivered or given up on
    pub async fn settle(&self) -> Result<CustomerSnapshot, HostError> {
        let snapshot = self.actor_ref.ask(Settle).await.map_err(|_| self.closed())?;
        self.outbox.ask(Flush).await.map_err(|_| self.closed())?;
        Ok(snapshot)
    }

    // ------------------------------------------------------------------------
    // Queries (read-only, answered from the last published snapshot)
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> CustomerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn get_status(&self) -> Tier {
        self.snapshot.borrow().record.tier
    }

    pub fn get_guests(&self) -> Vec<CustomerRecord> {
        self.snapshot.borrow().record.guests.clone()
    }

    pub fn get_customer(&self) -> CustomerRecord {
        self.snapshot.borrow().record.clone()
    }

    pub fn get_status_report(&self) -> StatusReport {
        self.snapshot.borrow().status_report()
    }

    pub fn get_run_info(&self) -> RunInfo {
        self.snapshot.borrow().run.clone()
    }

    /// Resolves once the account is canceled
    pub async fn wait_for_completion(&self) -> Result<RunOutcome, HostError> {
        let mut snapshot = self.snapshot.clone();
        snapshot
            .wait_for(|s| !s.is_active())
            .await
            .map_err(|_| self.closed())?;
        Ok(RunOutcome::Done)
    }
}
