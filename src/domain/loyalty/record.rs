use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::LoyaltyError;
use super::tier::Tier;

// ============================================================================
// Customer Record - the persisted state of one loyalty actor
// ============================================================================

/// Customer identifier (immutable, unique key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Actor id for this customer: `customer-<id>`
    pub fn actor_id(&self) -> ActorId {
        ActorId(format!("{}{}", ActorId::PREFIX, self.0))
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Registry key of a customer actor, derived from the customer id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    const PREFIX: &'static str = "customer-";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub loyalty_points: u64,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub guests: Vec<CustomerRecord>,
}

impl CustomerRecord {
    /// Fresh record: floor tier, no points, no guests
    pub fn new(customer_id: impl Into<CustomerId>) -> Self {
        Self {
            customer_id: customer_id.into(),
            name: String::new(),
            loyalty_points: 0,
            tier: Tier::default(),
            guests: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_points(mut self, points: u64) -> Self {
        self.loyalty_points = points;
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn actor_id(&self) -> ActorId {
        self.customer_id.actor_id()
    }

    pub fn can_add_guest(&self) -> bool {
        self.guests.len() < self.tier.guests_allowed()
    }

    pub fn guest_ids(&self) -> impl Iterator<Item = &CustomerId> {
        self.guests.iter().map(|guest| &guest.customer_id)
    }

    pub fn validate(&self) -> Result<(), LoyaltyError> {
        if self.customer_id.as_str().trim().is_empty() {
            return Err(LoyaltyError::EmptyCustomerId);
        }
        Ok(())
    }
}
