use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope};

// ============================================================================
// Run History - In-memory, append-only event log of one actor run
// ============================================================================
//
// Every applied event is wrapped in an envelope and appended here. The
// length of the history is the load metric an actor watches; starting a
// new run discards the old entries and begins a fresh correlation id.
//
// Type Parameter:
// - `E`: The domain event type (must implement DomainEvent trait)
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct EventHistory<E: DomainEvent> {
    stream_id: String,
    run_id: Uuid,
    events: Vec<EventEnvelope<E>>,
}

impl<E: DomainEvent> EventHistory<E> {
    pub fn new(stream_id: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            stream_id: stream_id.into(),
            run_id,
            events: Vec::new(),
        }
    }

    /// Append events, naming each with `event_type`
    /// Returns the sequence number of the last appended event
    pub fn append<F>(&mut self, events: impl IntoIterator<Item = E>, event_type: F) -> i64
    where
        F: Fn(&E) -> &'static str,
    {
        for event in events {
            let sequence_number = self.events.len() as i64 + 1;
            let name = event_type(&event).to_string();

            tracing::trace!(
                stream_id = %self.stream_id,
                sequence_number,
                event_type = %name,
                "Appending event to run history"
            );

            self.events.push(EventEnvelope::new(
                self.stream_id.clone(),
                sequence_number,
                name,
                event,
                self.run_id,
            ));
        }

        self.events.len() as i64
    }

    /// Drop this run's entries and start recording under `run_id`
    /// Returns how many entries the finished run held
    pub fn start_new_run(&mut self, run_id: Uuid) -> usize {
        let finished = self.events.len();
        self.events.clear();
        self.run_id = run_id;
        finished
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn events(&self) -> &[EventEnvelope<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
