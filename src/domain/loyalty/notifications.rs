use std::fmt;
use super::tier::Tier;

// ============================================================================
// Customer Notifications
// ============================================================================

/// A message the loyalty program sends to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Welcome { tier: Tier },
    Promoted { tier: Tier },
    GuestInvited,
    GuestRaisedToMinimum { floor: Tier },
    GuestCanceled,
    AccountCanceled,
}

impl Notification {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::Promoted { .. } => "promoted",
            Notification::GuestInvited => "guest_invited",
            Notification::GuestRaisedToMinimum { .. } => "guest_raised",
            Notification::GuestCanceled => "guest_canceled",
            Notification::AccountCanceled => "account_canceled",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Welcome { tier } => {
                write!(f, "Welcome to our loyalty program! You're starting out at '{}' status.", tier)
            }
            Notification::Promoted { tier } => {
                write!(f, "Congratulations! You've been promoted to '{}' status!", tier)
            }
            Notification::GuestInvited => {
                f.write_str("Congratulations! Your guest has been invited!")
            }
            Notification::GuestRaisedToMinimum { floor } => write!(
                f,
                "Your guest already has an account, but we've made sure they're at least '{}' status!",
                floor
            ),
            Notification::GuestCanceled => f.write_str("Sorry, your guest has already canceled their account."),
            Notification::AccountCanceled => f.write_str("Sorry to see you go!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loyalty::tier::TierTable;

    #[test]
    fn test_texts_name_the_tier() {
        let gold = TierTable::by_name("Gold").unwrap();

        assert_eq!(
            Notification::Promoted { tier: gold }.to_string(),
            "Congratulations! You've been promoted to 'Gold' status!"
        );
        assert_eq!(
            Notification::Welcome { tier: TierTable::floor() }.to_string(),
            "Welcome to our loyalty program! You're starting out at 'Member' status."
        );
        assert!(Notification::GuestRaisedToMinimum { floor: gold }.to_string().contains("'Gold'"));
        assert_eq!(Notification::GuestCanceled.kind(), "guest_canceled");
    }
}
