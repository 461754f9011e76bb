use kameo::Actor;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::{ActorStopReason, Infallible, PanicError};
use kameo::mailbox;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use kameo::reply::{Reply, ReplyError};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::{CanceledSignalPolicy, LoyaltyConfig};
use crate::domain::loyalty::{
    AccountStatus, CustomerRecord, LoyaltyAccount, LoyaltyCommand, LoyaltyError, LoyaltyEvent, Notification, Tier,
};
use crate::event_sourcing::{Aggregate, EventHistory};
use crate::metrics::Metrics;
use crate::notification::NotificationDispatcher;
use super::host::{ActorHost, CustomerHandle};
use super::invitation::{invite_guest, InviteOutcome};
use super::outbox::{Deliver, NotificationOutbox};
use super::snapshot::{CustomerSnapshot, RunInfo};

// ============================================================================
// Customer Loyalty Actor
// ============================================================================
//
// One actor per customer id. The mailbox serializes every signal, so the
// account is only ever touched by one handler at a time.
//
// Lifecycle:
// - on_start is the entry operation: validate the record, welcome the
//   customer
// - each signal is applied, recorded in the run history and published
// - cancel flips the account to Canceled and completes the run ("Done");
//   the actor stays up so queries keep answering
// - notifications are handed to the customer's outbox and never awaited
// - once the run history reaches the configured threshold, the run hands
//   its record verbatim to a fresh run under the same identity
//
// ============================================================================

pub struct CustomerActor {
    account: LoyaltyAccount,
    history: EventHistory<LoyaltyEvent>,
    continued_from: Option<Uuid>,
    continuations: u64,
    host: Arc<dyn ActorHost>,
    outbox: ActorRef<NotificationOutbox>,
    metrics: Arc<Metrics>,
    config: LoyaltyConfig,
    snapshot: watch::Sender<CustomerSnapshot>,
}

/// Everything needed to activate a customer actor
pub struct CustomerActorArgs {
    pub record: CustomerRecord,
    pub run_id: Uuid,
    pub host: Arc<dyn ActorHost>,
    pub outbox: ActorRef<NotificationOutbox>,
    pub metrics: Arc<Metrics>,
    pub config: LoyaltyConfig,
    pub snapshot: watch::Sender<CustomerSnapshot>,
}

impl CustomerActor {
    /// Spawn a customer actor and its outbox on unbounded mailboxes
    pub(crate) fn launch(
        record: CustomerRecord,
        host: Arc<dyn ActorHost>,
        notifications: NotificationDispatcher,
        metrics: Arc<Metrics>,
        config: LoyaltyConfig,
    ) -> CustomerHandle {
        let actor_id = record.actor_id();
        let run_id = Uuid::now_v7();
        let (snapshot_tx, snapshot_rx) = watch::channel(CustomerSnapshot {
            record: record.clone(),
            status: AccountStatus::Active,
            run: RunInfo {
                run_id,
                continued_from: None,
                history_length: 0,
                continuations: 0,
            },
        });

        let outbox = NotificationOutbox::spawn_for(notifications);
        let actor_ref = Self::spawn_with_mailbox(
            CustomerActorArgs {
                record,
                run_id,
                host,
                outbox: outbox.clone(),
                metrics,
                config,
                snapshot: snapshot_tx,
            },
            mailbox::unbounded(),
        );

        CustomerHandle::new(actor_id, actor_ref, outbox, snapshot_rx)
    }

    fn snapshot_now(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            record: self.account.record.clone(),
            status: self.account.status,
            run: RunInfo {
                run_id: self.history.run_id(),
                continued_from: self.continued_from,
                history_length: self.history.len(),
                continuations: self.continuations,
            },
        }
    }

    async fn notify(&self, notification: Notification) {
        let deliver = Deliver {
            recipient: self.account.record.customer_id.clone(),
            notification,
        };
        if self.outbox.tell(deliver).await.is_err() {
            tracing::warn!(
                customer_id = %self.account.record.customer_id,
                kind = notification.kind(),
                "Notification outbox stopped; dropping notification"
            );
            self.metrics.record_notification(notification.kind(), false);
        }
    }

    /// Apply a command and record its events in the run history
    fn apply(&mut self, signal: &'static str, command: LoyaltyCommand) -> Result<Vec<LoyaltyEvent>, LoyaltyError> {
        match self.account.execute(&command) {
            Ok(events) => {
                self.history.append(events.clone(), LoyaltyEvent::name);
                Ok(events)
            }
            Err(LoyaltyError::AccountCanceled)
                if self.config.canceled_signal_policy == CanceledSignalPolicy::Ignore =>
            {
                tracing::debug!(
                    customer_id = %self.account.record.customer_id,
                    signal = signal,
                    "Account canceled; ignoring signal"
                );
                self.metrics.record_dropped_signal(signal, "canceled");
                Ok(vec![])
            }
            Err(err) => Err(err),
        }
    }

    async fn add_points(&mut self, points: u64) -> Result<(), LoyaltyError> {
        let events = self.apply("add_points", LoyaltyCommand::AddPoints { points })?;

        for event in &events {
            match event {
                LoyaltyEvent::PointsAdded(e) => {
                    tracing::info!(
                        customer_id = %self.account.record.customer_id,
                        points_added = e.points,
                        total = e.total,
                        "Added points to customer"
                    );
                }
                LoyaltyEvent::Promoted(e) => {
                    tracing::info!(
                        customer_id = %self.account.record.customer_id,
                        from = %e.old_tier,
                        to = %e.new_tier,
                        "Promoting customer"
                    );
                    self.metrics.record_promotion(e.new_tier.name());
                    self.notify(Notification::Promoted { tier: e.new_tier }).await;
                }
                _ => {}
            }
        }

        Ok(())
    }

    async fn invite(&mut self, guest: CustomerRecord) -> Result<(), LoyaltyError> {
        if !self.account.is_active() {
            // Route through the policy check without touching the host
            self.apply("invite_guest", LoyaltyCommand::AddGuest { guest })?;
            return Ok(());
        }

        let outcome = invite_guest(&mut self.account, &mut self.history, self.host.as_ref(), guest).await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.metrics.record_invitation("failed");
                return Err(err);
            }
        };
        self.metrics.record_invitation(outcome.label());

        match outcome {
            InviteOutcome::Dropped => {}
            InviteOutcome::Created { .. } => {
                self.notify(Notification::GuestInvited).await;
            }
            InviteOutcome::AlreadyExisted { floor, .. } => {
                self.notify(Notification::GuestRaisedToMinimum { floor }).await;
            }
            InviteOutcome::GuestCanceled { .. } => {
                self.notify(Notification::GuestCanceled).await;
            }
        }

        Ok(())
    }

    fn ensure_minimum_status(&mut self, floor: Tier) -> Result<(), LoyaltyError> {
        tracing::info!(
            customer_id = %self.account.record.customer_id,
            floor = %floor,
            "Ensuring status is at least the floor"
        );

        let events = self.apply("ensure_minimum_status", LoyaltyCommand::EnsureMinimumStatus { floor })?;

        for event in &events {
            if let LoyaltyEvent::StatusRaised(e) = event {
                tracing::debug!(
                    customer_id = %self.account.record.customer_id,
                    from = %e.old_tier,
                    to = %e.new_tier,
                    "Raised status one level"
                );
                self.metrics.record_promotion(e.new_tier.name());
            }
        }

        Ok(())
    }

    async fn cancel(&mut self) -> Result<(), LoyaltyError> {
        let events = self.apply("cancel_account", LoyaltyCommand::CancelAccount)?;
        if events.is_empty() {
            return Ok(());
        }

        self.notify(Notification::AccountCanceled).await;
        tracing::info!(
            customer_id = %self.account.record.customer_id,
            "Account canceled; run complete"
        );
        Ok(())
    }

    /// Hand the record to a fresh run once the history threshold is crossed
    fn maybe_continue_as_new(&mut self) {
        if !self.account.is_active() || self.history.len() < self.config.history_threshold {
            return;
        }

        let next_run = Uuid::now_v7();
        let previous_run = self.history.run_id();
        let finished = self.history.start_new_run(next_run);

        self.continued_from = Some(previous_run);
        self.continuations += 1;
        self.metrics.record_continuation();

        tracing::info!(
            customer_id = %self.account.record.customer_id,
            previous_run = %previous_run,
            run_id = %next_run,
            history_length = finished,
            "Account still active but history crossed threshold; continuing as new run"
        );
    }

    /// Close out a signal: count it, continue if due, publish the result
    fn finish_signal(&mut self, signal: &'static str, result: &Result<(), LoyaltyError>) {
        match result {
            Ok(()) => self.metrics.record_signal(signal),
            Err(err) => {
                tracing::error!(
                    customer_id = %self.account.record.customer_id,
                    signal = signal,
                    error = %err,
                    "Signal failed"
                );
                self.metrics.record_dropped_signal(signal, "rejected");
            }
        }

        self.maybe_continue_as_new();
        self.snapshot.send_replace(self.snapshot_now());
    }
}

impl Actor for CustomerActor {
    type Args = CustomerActorArgs;
    type Error = LoyaltyError;

    async fn on_start(args: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        args.record.validate()?;

        let stream_id = args.record.actor_id().to_string();
        let actor = Self {
            account: LoyaltyAccount::new(args.record),
            history: EventHistory::new(stream_id, args.run_id),
            continued_from: None,
            continuations: 0,
            host: args.host,
            outbox: args.outbox,
            metrics: args.metrics,
            config: args.config,
            snapshot: args.snapshot,
        };

        tracing::info!(
            customer_id = %actor.account.record.customer_id,
            tier = %actor.account.record.tier,
            run_id = %actor.history.run_id(),
            "Customer actor started; sending welcome"
        );
        // Continued runs never pass through here, so only fresh customers are welcomed
        actor
            .notify(Notification::Welcome { tier: actor.account.record.tier })
            .await;

        actor.snapshot.send_replace(actor.snapshot_now());
        Ok(actor)
    }

    async fn on_panic(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        err: PanicError,
    ) -> Result<ControlFlow<ActorStopReason>, Self::Error> {
        // A failed signal is fatal to that signal only
        tracing::error!(
            customer_id = %self.account.record.customer_id,
            error = %err,
            "Signal handler failed; actor keeps running"
        );
        Ok(ControlFlow::Continue(()))
    }

    async fn on_stop(&mut self, _actor_ref: WeakActorRef<Self>, reason: ActorStopReason) -> Result<(), Self::Error> {
        // Pending notifications still go out before the outbox stops
        let _ = self.outbox.stop_gracefully().await;
        tracing::info!(
            customer_id = %self.account.record.customer_id,
            reason = ?reason,
            "🛑 Customer actor stopped"
        );
        Ok(())
    }
}

// ============================================================================
// Messages
// ============================================================================

pub struct AddPoints {
    pub points: u64,
}

pub struct InviteGuest {
    pub guest: CustomerRecord,
}

pub struct EnsureMinimumStatus {
    pub floor: Tier,
}

pub struct CancelAccount;

/// Replies once every message queued before it has been applied
pub struct Settle;

// Implement Reply for CustomerSnapshot to use it as a message reply type
impl Reply for CustomerSnapshot {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<AddPoints> for CustomerActor {
    type Reply = Result<(), LoyaltyError>;

    async fn handle(&mut self, msg: AddPoints, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.add_points(msg.points).await;
        self.finish_signal("add_points", &result);
        result
    }
}

impl Message<InviteGuest> for CustomerActor {
    type Reply = Result<(), LoyaltyError>;

    async fn handle(&mut self, msg: InviteGuest, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.invite(msg.guest).await;
        self.finish_signal("invite_guest", &result);
        result
    }
}

impl Message<EnsureMinimumStatus> for CustomerActor {
    type Reply = Result<(), LoyaltyError>;

    async fn handle(&mut self, msg: EnsureMinimumStatus, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.ensure_minimum_status(msg.floor);
        self.finish_signal("ensure_minimum_status", &result);
        result
    }
}

impl Message<CancelAccount> for CustomerActor {
    type Reply = Result<(), LoyaltyError>;

    async fn handle(&mut self, _msg: CancelAccount, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.cancel().await;
        self.finish_signal("cancel_account", &result);
        result
    }
}

impl Message<Settle> for CustomerActor {
    type Reply = CustomerSnapshot;

    async fn handle(&mut self, _msg: Settle, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.snapshot_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::host::{Creation, HostError, LocalHost, Signal, SignalError};
    use crate::actors::snapshot::RunOutcome;
    use crate::domain::loyalty::{ActorId, CustomerId, TierTable};
    use crate::notification::{Notifier, RecordingNotifier};
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::{timeout, Duration};

    fn tier(name: &str) -> Tier {
        TierTable::by_name(name).unwrap()
    }

    fn setup(config: LoyaltyConfig) -> (Arc<LocalHost>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let host = LocalHost::new(config, notifier.clone() as Arc<dyn Notifier>).unwrap();
        (host, notifier)
    }

    #[tokio::test]
    async fn test_new_customer_is_welcomed_once() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1").with_name("Ada")).await.unwrap();
        handle.settle().await.unwrap();

        let expected = Notification::Welcome { tier: TierTable::floor() }.to_string();
        assert_eq!(notifier.texts_for(&"c1".into()), vec![expected]);
    }

    #[tokio::test]
    async fn test_add_points_promotes_to_bronze() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();

        handle.add_points(500).await.unwrap();
        handle.settle().await.unwrap();

        assert_eq!(handle.get_status(), tier("Bronze"));
        assert_eq!(handle.get_status().level(), 1);
        assert_eq!(notifier.count(&Notification::Promoted { tier: tier("Bronze") }.to_string()), 1);
    }

    #[tokio::test]
    async fn test_points_accumulate_and_tier_never_drops() {
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();

        let mut total = 0;
        let mut last_level = 0;
        for delta in [100, 450, 600, 3_000, 1] {
            handle.add_points(delta).await.unwrap();
            let snapshot = handle.settle().await.unwrap();
            total += delta;

            assert_eq!(snapshot.record.loyalty_points, total);
            assert_eq!(snapshot.record.tier, TierTable::max_tier_for(total));
            assert!(snapshot.record.tier.level() >= last_level);
            last_level = snapshot.record.tier.level();
        }
        assert_eq!(handle.get_status(), tier("Gold"));
    }

    #[tokio::test]
    async fn test_platinum_host_invites_same_guest_twice() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let inviter = host.start(CustomerRecord::new("host").with_tier(TierTable::top())).await.unwrap();

        inviter.invite_guest(CustomerRecord::new("g1")).await.unwrap();
        inviter.invite_guest(CustomerRecord::new("g1")).await.unwrap();
        inviter.settle().await.unwrap();
        let guest = host.handle(&"g1".into()).await.unwrap();
        guest.settle().await.unwrap();

        assert_eq!(guest.get_status(), tier("Gold"));
        assert_eq!(host.len().await, 2);

        let host_mail = notifier.texts_for(&"host".into());
        let invited = Notification::GuestInvited.to_string();
        let raised = Notification::GuestRaisedToMinimum { floor: tier("Gold") }.to_string();
        assert_eq!(host_mail.iter().filter(|t| **t == invited).count(), 1);
        assert_eq!(host_mail.iter().filter(|t| **t == raised).count(), 1);

        // The guest actor was welcomed exactly once, at Gold
        assert_eq!(
            notifier.texts_for(&"g1".into()),
            vec![Notification::Welcome { tier: tier("Gold") }.to_string()]
        );
    }

    #[tokio::test]
    async fn test_existing_member_guest_is_raised_to_silver() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let guest = host.start(CustomerRecord::new("g1").with_points(200)).await.unwrap();
        let inviter = host.start(CustomerRecord::new("host").with_tier(tier("Gold"))).await.unwrap();

        inviter.invite_guest(CustomerRecord::new("g1")).await.unwrap();
        inviter.settle().await.unwrap();
        let snapshot = guest.settle().await.unwrap();

        assert_eq!(snapshot.record.tier, tier("Silver"));
        assert_eq!(snapshot.record.loyalty_points, 1_000);
        // Two single-level steps plus the points raise
        assert_eq!(snapshot.run.history_length, 3);
        assert_eq!(
            notifier.count(&Notification::GuestRaisedToMinimum { floor: tier("Silver") }.to_string()),
            1
        );
        assert_eq!(notifier.count(&Notification::GuestInvited.to_string()), 0);
    }

    #[tokio::test]
    async fn test_ensure_minimum_status_is_idempotent() {
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1").with_points(1_200)).await.unwrap();

        handle.apply(Signal::EnsureMinimumStatus { floor: tier("Gold") }).await.unwrap();
        let once = handle.get_customer();
        handle.apply(Signal::EnsureMinimumStatus { floor: tier("Gold") }).await.unwrap();
        let twice = handle.get_customer();

        assert_eq!(once, twice);
        assert_eq!(twice.tier, tier("Gold"));
        assert_eq!(twice.loyalty_points, 2_000);
    }

    #[tokio::test]
    async fn test_floor_below_current_tier_changes_nothing() {
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1").with_points(6_000).with_tier(TierTable::top())).await.unwrap();

        handle.apply(Signal::EnsureMinimumStatus { floor: tier("Silver") }).await.unwrap();

        assert_eq!(handle.get_status(), TierTable::top());
        assert_eq!(handle.get_status_report().points, 6_000);
    }

    #[tokio::test]
    async fn test_guest_list_never_exceeds_allowance() {
        let (host, _) = setup(LoyaltyConfig::local());
        let inviter = host.start(CustomerRecord::new("host").with_tier(tier("Bronze"))).await.unwrap();

        for guest in ["g1", "g2", "g3"] {
            inviter.invite_guest(CustomerRecord::new(guest)).await.unwrap();
            inviter.settle().await.unwrap();
            assert!(inviter.get_guests().len() <= tier("Bronze").guests_allowed());
        }

        assert_eq!(inviter.get_guests().len(), 1);
        assert!(matches!(host.handle(&"g2".into()).await, Err(HostError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_threshold_continues_as_new_run() {
        let (host, notifier) = setup(LoyaltyConfig::local().with_history_threshold(3));
        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();
        let first_run = handle.get_run_info();

        for _ in 0..3 {
            handle.add_points(10).await.unwrap();
        }
        handle.settle().await.unwrap();

        let run = handle.get_run_info();
        assert_ne!(run.run_id, first_run.run_id);
        assert_eq!(run.continued_from, Some(first_run.run_id));
        assert_eq!(run.continuations, 1);
        assert_eq!(run.history_length, 0);

        // State carries over untouched and the customer is not welcomed again
        assert_eq!(handle.get_status_report().points, 30);
        assert_eq!(notifier.texts_for(&"c1".into()).len(), 1);
        assert_eq!(host.metrics().continuations_total.get(), 1);

        handle.add_points(470).await.unwrap();
        handle.settle().await.unwrap();
        assert_eq!(handle.get_status(), tier("Bronze"));
        assert_eq!(handle.get_run_info().history_length, 2);
    }

    #[tokio::test]
    async fn test_cancel_completes_run_and_queries_keep_answering() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1").with_points(600)).await.unwrap();

        handle.cancel_account().await.unwrap();
        assert_eq!(handle.wait_for_completion().await.unwrap(), RunOutcome::Done);

        let report = handle.get_status_report();
        assert!(!report.account_active);
        assert_eq!(report.points, 600);
        handle.settle().await.unwrap();
        assert_eq!(notifier.count(&Notification::AccountCanceled.to_string()), 1);

        // Ignored by default once canceled
        handle.add_points(1_000).await.unwrap();
        handle.cancel_account().await.unwrap();
        handle.settle().await.unwrap();
        assert_eq!(handle.get_status_report().points, 600);
        assert_eq!(notifier.count(&Notification::AccountCanceled.to_string()), 1);
    }

    #[tokio::test]
    async fn test_reject_policy_reports_canceled_account() {
        let config = LoyaltyConfig::local().with_canceled_signal_policy(CanceledSignalPolicy::Reject);
        let (host, _) = setup(config);
        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();

        handle.apply(Signal::CancelAccount).await.unwrap();
        let result = handle.apply(Signal::AddPoints { points: 5 }).await;

        assert_eq!(result, Err(SignalError::Rejected(LoyaltyError::AccountCanceled)));
    }

    #[tokio::test]
    async fn test_failed_signal_does_not_stop_actor() {
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();

        let rejected = handle.apply(Signal::AddPoints { points: 0 }).await;
        assert_eq!(rejected, Err(SignalError::Rejected(LoyaltyError::InvalidPoints)));

        // Same failure without a waiting caller
        handle.add_points(0).await.unwrap();
        handle.add_points(25).await.unwrap();
        let snapshot = handle.settle().await.unwrap();

        assert_eq!(snapshot.record.loyalty_points, 25);
    }

    #[tokio::test]
    async fn test_self_invitation_is_rejected() {
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = host.start(CustomerRecord::new("c1").with_tier(tier("Gold"))).await.unwrap();

        let result = handle.apply(Signal::InviteGuest { guest: CustomerRecord::new("c1") }).await;

        assert_eq!(result, Err(SignalError::Rejected(LoyaltyError::SelfInvitation)));
        assert!(handle.get_guests().is_empty());
    }

    #[tokio::test]
    async fn test_notification_retries_until_delivered() {
        let notifier = Arc::new(RecordingNotifier::failing(2));
        let host = LocalHost::new(LoyaltyConfig::local(), notifier.clone() as Arc<dyn Notifier>).unwrap();

        let handle = host.start(CustomerRecord::new("c1")).await.unwrap();
        handle.settle().await.unwrap();

        assert_eq!(notifier.texts_for(&CustomerId::new("c1")).len(), 1);
    }

    /// Host whose guest creation parks until the gate opens
    struct GatedHost {
        entered: Notify,
        gate: watch::Receiver<bool>,
    }

    #[async_trait]
    impl ActorHost for GatedHost {
        async fn create_if_absent(&self, _actor_id: &ActorId, _initial: CustomerRecord) -> Result<Creation, HostError> {
            self.entered.notify_one();
            let mut gate = self.gate.clone();
            let _ = gate.wait_for(|open| *open).await;
            Ok(Creation::Created)
        }

        async fn signal(&self, _actor_id: &ActorId, _signal: Signal) -> Result<(), HostError> {
            Ok(())
        }
    }

    /// Notifier that holds every delivery until the gate opens
    struct GatedNotifier {
        gate: watch::Receiver<bool>,
        inner: RecordingNotifier,
    }

    #[async_trait]
    impl Notifier for GatedNotifier {
        async fn send_notification(&self, recipient: &CustomerId, text: &str) -> anyhow::Result<()> {
            let mut gate = self.gate.clone();
            let _ = gate.wait_for(|open| *open).await;
            self.inner.send_notification(recipient, text).await
        }
    }

    fn launch_on(host: Arc<dyn ActorHost>, notifier: Arc<dyn Notifier>, record: CustomerRecord) -> CustomerHandle {
        let config = LoyaltyConfig::local();
        let metrics = Arc::new(Metrics::new().unwrap());
        let dispatcher = NotificationDispatcher::new(notifier, config.notification_retry.clone(), metrics.clone());
        CustomerActor::launch(record, host, dispatcher, metrics, config)
    }

    #[tokio::test]
    async fn test_queries_answer_with_last_applied_state_mid_invitation() {
        let (open, gate) = watch::channel(false);
        let host = Arc::new(GatedHost { entered: Notify::new(), gate });
        let handle = launch_on(
            host.clone(),
            Arc::new(RecordingNotifier::new()),
            CustomerRecord::new("host").with_points(2_400).with_tier(tier("Gold")),
        );
        handle.add_points(100).await.unwrap();
        handle.invite_guest(CustomerRecord::new("g1")).await.unwrap();

        // The invitation is now parked inside guest creation
        timeout(Duration::from_secs(5), host.entered.notified()).await.unwrap();

        let customer = handle.get_customer();
        assert!(handle.get_guests().is_empty());
        assert_eq!(customer.loyalty_points, 2_500);
        assert!(customer.guests.is_empty());
        assert_eq!(handle.get_status_report().points, 2_500);

        open.send_replace(true);
        let snapshot = timeout(Duration::from_secs(5), handle.settle()).await.unwrap().unwrap();
        assert_eq!(snapshot.record.guest_ids().collect::<Vec<_>>(), vec![&CustomerId::new("g1")]);
    }

    #[tokio::test]
    async fn test_slow_notifications_do_not_hold_up_signals() {
        let (open, gate) = watch::channel(false);
        let notifier = Arc::new(GatedNotifier { gate, inner: RecordingNotifier::new() });
        let (host, _) = setup(LoyaltyConfig::local());
        let handle = launch_on(host, notifier.clone(), CustomerRecord::new("c1"));

        // Welcome and promotion are both stuck at the gateway
        let applied = timeout(Duration::from_secs(5), handle.apply(Signal::AddPoints { points: 600 })).await;
        assert_eq!(applied, Ok(Ok(())));
        assert_eq!(handle.get_status(), tier("Bronze"));
        assert!(notifier.inner.sent().is_empty());

        open.send_replace(true);
        handle.settle().await.unwrap();
        assert_eq!(
            notifier.inner.texts_for(&"c1".into()),
            vec![
                Notification::Welcome { tier: TierTable::floor() }.to_string(),
                Notification::Promoted { tier: tier("Bronze") }.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_reinviting_canceled_guest_tells_inviter() {
        let (host, notifier) = setup(LoyaltyConfig::local());
        let guest = host.start(CustomerRecord::new("g1")).await.unwrap();
        guest.cancel_account().await.unwrap();
        guest.wait_for_completion().await.unwrap();

        let inviter = host.start(CustomerRecord::new("host").with_tier(TierTable::top())).await.unwrap();
        inviter.invite_guest(CustomerRecord::new("g1")).await.unwrap();
        inviter.settle().await.unwrap();
        guest.settle().await.unwrap();

        let host_mail = notifier.texts_for(&"host".into());
        assert!(host_mail.contains(&Notification::GuestCanceled.to_string()));
        assert!(!host_mail.contains(&Notification::GuestRaisedToMinimum { floor: tier("Gold") }.to_string()));
        assert!(!host_mail.contains(&Notification::GuestInvited.to_string()));
        assert_eq!(guest.get_status(), TierTable::floor());
        assert_eq!(inviter.get_guests().len(), 1);
    }
}
