use super::record::{CustomerId, CustomerRecord};
use super::tier::Tier;

// ============================================================================
// Loyalty Account Commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum LoyaltyCommand {
    AddPoints {
        points: u64,
    },
    AddGuest {
        guest: CustomerRecord,
    },
    RemoveGuest {
        customer_id: CustomerId,
    },
    EnsureMinimumStatus {
        floor: Tier,
    },
    CancelAccount,
}
