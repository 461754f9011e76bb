use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Signals applied per kind, and signals dropped or failed
// - Notification delivery outcomes
// - Guest invitation outcomes
// - Promotions per tier
// - Continuations and live actor count
//
// Every host owns one registry; callers may gather it for exposition.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Signal Metrics
    pub signals_total: IntCounterVec,
    pub signals_dropped: IntCounterVec,

    // Notification Metrics
    pub notifications_total: IntCounterVec,

    // Invitation Metrics
    pub invitations_total: IntCounterVec,

    // Tier Metrics
    pub promotions_total: IntCounterVec,

    // Actor Lifecycle Metrics
    pub continuations_total: IntCounter,
    pub active_actors: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let signals_total = IntCounterVec::new(
            Opts::new("loyalty_signals_total", "Total signals applied by customer actors"),
            &["signal"],
        )?;
        registry.register(Box::new(signals_total.clone()))?;

        let signals_dropped = IntCounterVec::new(
            Opts::new("loyalty_signals_dropped_total", "Signals ignored or failed by customer actors"),
            &["signal", "reason"],
        )?;
        registry.register(Box::new(signals_dropped.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new("loyalty_notifications_total", "Notification deliveries by outcome"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        let invitations_total = IntCounterVec::new(
            Opts::new("loyalty_invitations_total", "Guest invitations by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(invitations_total.clone()))?;

        let promotions_total = IntCounterVec::new(
            Opts::new("loyalty_promotions_total", "Promotions by destination tier"),
            &["tier"],
        )?;
        registry.register(Box::new(promotions_total.clone()))?;

        let continuations_total = IntCounter::new(
            "loyalty_continuations_total",
            "Runs handed off to a fresh run under the same identity",
        )?;
        registry.register(Box::new(continuations_total.clone()))?;

        let active_actors = IntGauge::new(
            "loyalty_active_actors",
            "Customer actors registered with the host",
        )?;
        registry.register(Box::new(active_actors.clone()))?;

        Ok(Self {
            registry,
            signals_total,
            signals_dropped,
            notifications_total,
            invitations_total,
            promotions_total,
            continuations_total,
            active_actors,
        })
    }

    /// Get the Prometheus registry for exposing metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_signal(&self, signal: &str) {
        self.signals_total.with_label_values(&[signal]).inc();
    }

    pub fn record_dropped_signal(&self, signal: &str, reason: &str) {
        self.signals_dropped.with_label_values(&[signal, reason]).inc();
    }

    pub fn record_notification(&self, kind: &str, delivered: bool) {
        let outcome = if delivered { "delivered" } else { "failed" };
        self.notifications_total.with_label_values(&[kind, outcome]).inc();
    }

    pub fn record_invitation(&self, outcome: &str) {
        self.invitations_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_promotion(&self, tier: &str) {
        self.promotions_total.with_label_values(&[tier]).inc();
    }

    pub fn record_continuation(&self) {
        self.continuations_total.inc();
    }
}
