use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

use crate::actors::customer_actor::CustomerActor;
use crate::config::LoyaltyConfig;
use crate::domain::loyalty::{ActorId, CustomerId, CustomerRecord};
use crate::metrics::Metrics;
use crate::notification::{NotificationDispatcher, Notifier};
use super::{ActorHost, Creation, CustomerHandle, HostError, Signal};

// ============================================================================
// Local Host - in-process registry of customer actors
// ============================================================================
//
// Responsibilities:
// - At most one live actor per actor id
// - Atomic create-if-absent (checked and registered under one lock)
// - Resolve-then-tell delivery; the lock is never held across a send
// - Unbounded mailboxes, so a send from inside one actor's handler never
//   waits on another actor (two customers inviting each other included)
// - Graceful shutdown of every registered actor
//
// Canceled actors stay registered so their queries keep answering.
//
// ============================================================================

pub struct LocalHost {
    me: Weak<LocalHost>,
    actors: Mutex<HashMap<ActorId, CustomerHandle>>,
    notifications: NotificationDispatcher,
    metrics: Arc<Metrics>,
    config: LoyaltyConfig,
}

impl LocalHost {
    pub fn new(config: LoyaltyConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Arc<Self>> {
        let metrics = Arc::new(Metrics::new()?);
        let notifications = NotificationDispatcher::new(notifier, config.notification_retry.clone(), metrics.clone());

        Ok(Arc::new_cyclic(|me| Self {
            me: me.clone(),
            actors: Mutex::new(HashMap::new()),
            notifications,
            metrics,
            config,
        }))
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Start a customer actor; fails if one is already registered for the id
    pub async fn start(&self, record: CustomerRecord) -> Result<CustomerHandle, HostError> {
        record.validate().map_err(|e| HostError::InvalidState(e.to_string()))?;
        let actor_id = record.actor_id();

        let mut actors = self.actors.lock().await;
        if actors.contains_key(&actor_id) {
            return Err(HostError::AlreadyStarted(actor_id));
        }

        let handle = self.spawn_actor(record)?;
        actors.insert(actor_id, handle.clone());
        Ok(handle)
    }

    /// Handle of the actor registered for a customer
    pub async fn handle(&self, customer_id: &CustomerId) -> Result<CustomerHandle, HostError> {
        self.resolve(&customer_id.actor_id()).await
    }

    pub async fn len(&self) -> usize {
        self.actors.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actors.lock().await.is_empty()
    }

    /// Stop every registered actor after its queued messages
    pub async fn shutdown(&self) {
        let drained: Vec<CustomerHandle> = self.actors.lock().await.drain().map(|(_, h)| h).collect();

        tracing::info!(actors = drained.len(), "Shutting down customer actors");

        for handle in drained {
            if let Err(e) = handle.actor_ref().stop_gracefully().await {
                tracing::warn!(actor_id = %handle.actor_id(), error = %e, "Actor already stopped");
            }
            self.metrics.active_actors.dec();
        }
    }

    async fn resolve(&self, actor_id: &ActorId) -> Result<CustomerHandle, HostError> {
        self.actors
            .lock()
            .await
            .get(actor_id)
            .cloned()
            .ok_or_else(|| HostError::NotFound(actor_id.clone()))
    }

    fn spawn_actor(&self, record: CustomerRecord) -> Result<CustomerHandle, HostError> {
        let host: Arc<dyn ActorHost> = self
            .me
            .upgrade()
            .ok_or_else(|| HostError::Unavailable("host is shutting down".to_string()))?;

        let handle = CustomerActor::launch(
            record,
            host,
            self.notifications.clone(),
            self.metrics.clone(),
            self.config.clone(),
        );
        self.metrics.active_actors.inc();

        tracing::debug!(actor_id = %handle.actor_id(), run_id = %handle.get_run_info().run_id, "Spawned customer actor");

        Ok(handle)
    }
}

#[async_trait]
impl ActorHost for LocalHost {
    async fn create_if_absent(&self, actor_id: &ActorId, initial: CustomerRecord) -> Result<Creation, HostError> {
        initial.validate().map_err(|e| HostError::InvalidState(e.to_string()))?;
        if &initial.actor_id() != actor_id {
            return Err(HostError::InvalidState(format!(
                "record for {} cannot start under {}",
                initial.customer_id, actor_id
            )));
        }

        let mut actors = self.actors.lock().await;
        if let Some(existing) = actors.get(actor_id) {
            // Last published state; a cancel still queued counts as active
            return Ok(if existing.snapshot().is_active() {
                Creation::AlreadyExists
            } else {
                Creation::Canceled
            });
        }

        let handle = self.spawn_actor(initial)?;
        actors.insert(actor_id.clone(), handle);
        Ok(Creation::Created)
    }

    async fn signal(&self, actor_id: &ActorId, signal: Signal) -> Result<(), HostError> {
        let handle = self.resolve(actor_id).await?;
        tracing::debug!(actor_id = %actor_id, signal = signal.name(), "Delivering signal");
        handle.signal(signal).await
    }
}
