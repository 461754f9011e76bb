use serde::{Deserialize, Serialize};
use crate::event_sourcing::DomainEvent;
use super::record::{CustomerId, CustomerRecord};
use super::tier::Tier;

// ============================================================================
// Loyalty Account Events
// ============================================================================

/// Union type for all loyalty account events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LoyaltyEvent {
    PointsAdded(PointsAdded),
    Promoted(TierPromoted),
    GuestAdded(GuestAdded),
    GuestRemoved(GuestRemoved),
    StatusRaised(StatusRaised),
    PointsRaised(PointsRaised),
    AccountCanceled(AccountCanceled),
}

impl LoyaltyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LoyaltyEvent::PointsAdded(_) => "PointsAdded",
            LoyaltyEvent::Promoted(_) => "TierPromoted",
            LoyaltyEvent::GuestAdded(_) => "GuestAdded",
            LoyaltyEvent::GuestRemoved(_) => "GuestRemoved",
            LoyaltyEvent::StatusRaised(_) => "StatusRaised",
            LoyaltyEvent::PointsRaised(_) => "PointsRaised",
            LoyaltyEvent::AccountCanceled(_) => "AccountCanceled",
        }
    }
}

impl DomainEvent for LoyaltyEvent {
    fn event_type() -> &'static str {
        "LoyaltyEvent"
    }
}

// Individual event types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsAdded {
    pub points: u64,
    pub total: u64,
}

/// Promotion earned through points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPromoted {
    pub old_tier: Tier,
    pub new_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestAdded {
    pub guest: CustomerRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRemoved {
    pub customer_id: CustomerId,
}

/// One single-level step taken while raising a customer to a floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRaised {
    pub old_tier: Tier,
    pub new_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsRaised {
    pub old_points: u64,
    pub new_points: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCanceled {
    pub final_points: u64,
}
