use super::record::CustomerId;

// ============================================================================
// Loyalty Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoyaltyError {
    #[error("Points to add must be greater than zero")]
    InvalidPoints,

    #[error("Unknown status tier '{name}' at level {level}")]
    UnknownTier { name: String, level: usize },

    #[error("Customer id cannot be empty")]
    EmptyCustomerId,

    #[error("A customer cannot invite themselves")]
    SelfInvitation,

    #[error("Account is canceled")]
    AccountCanceled,

    #[error("Guest not found: {0}")]
    GuestNotFound(CustomerId),

    #[error("Guest invitation for {guest} failed: {reason}")]
    InvitationFailed { guest: CustomerId, reason: String },
}
