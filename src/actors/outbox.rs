use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::mailbox;
use kameo::message::{Context, Message};
use kameo::prelude::*;

use crate::domain::loyalty::{CustomerId, Notification};
use crate::notification::NotificationDispatcher;

// ============================================================================
// Notification Outbox Actor
// ============================================================================
//
// One outbox per customer actor. Notifications are handed over with `tell`
// and delivered here in the order they were emitted, retries included, so
// a slow or failing mail gateway never holds up the customer's mailbox.
//
// ============================================================================

pub struct NotificationOutbox {
    dispatcher: NotificationDispatcher,
}

impl NotificationOutbox {
    /// Spawn an outbox on an unbounded mailbox, so handing over never waits
    pub fn spawn_for(dispatcher: NotificationDispatcher) -> ActorRef<Self> {
        Self::spawn_with_mailbox(dispatcher, mailbox::unbounded())
    }
}

impl Actor for NotificationOutbox {
    type Args = NotificationDispatcher;
    type Error = Infallible;

    async fn on_start(dispatcher: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        Ok(Self { dispatcher })
    }
}

// ============================================================================
// Messages
// ============================================================================

pub struct Deliver {
    pub recipient: CustomerId,
    pub notification: Notification,
}

/// Replies once every notification queued before it has been delivered or given up on
pub struct Flush;

impl Message<Deliver> for NotificationOutbox {
    type Reply = ();

    async fn handle(&mut self, msg: Deliver, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.dispatcher.dispatch(&msg.recipient, msg.notification).await;
    }
}

impl Message<Flush> for NotificationOutbox {
    type Reply = ();

    async fn handle(&mut self, _msg: Flush, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {}
}
