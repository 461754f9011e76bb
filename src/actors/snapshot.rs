use serde::Serialize;
use uuid::Uuid;

use crate::domain::loyalty::{AccountStatus, CustomerRecord, Tier};

// ============================================================================
// Customer Snapshots - what queries observe
// ============================================================================
//
// An actor publishes a snapshot after every fully applied signal. Queries
// read the latest one without entering the actor's mailbox, so they never
// wait behind a signal and never see half of one.
//
// ============================================================================

/// Identity of the current run of an actor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: Uuid,
    pub continued_from: Option<Uuid>,
    pub history_length: usize,
    pub continuations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub record: CustomerRecord,
    pub status: AccountStatus,
    pub run: RunInfo,
}

impl CustomerSnapshot {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            tier: self.record.tier,
            points: self.record.loyalty_points,
            account_active: self.is_active(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub tier: Tier,
    pub points: u64,
    pub account_active: bool,
}

/// Terminal result of an actor's entry operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Done,
}
