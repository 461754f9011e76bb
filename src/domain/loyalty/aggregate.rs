use serde::{Deserialize, Serialize};

use crate::event_sourcing::Aggregate;
use super::commands::LoyaltyCommand;
use super::errors::LoyaltyError;
use super::events::*;
use super::record::{CustomerId, CustomerRecord};
use super::tier::TierTable;

// ============================================================================
// Loyalty Account Aggregate - Business Logic
// ============================================================================
//
// Owns exactly one CustomerRecord. Promotion only happens through points or
// an explicit floor raise; nothing here ever demotes a customer.
//
// ============================================================================

/// Account lifecycle: `Active` until canceled, `Canceled` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Canceled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyAccount {
    pub record: CustomerRecord,
    pub status: AccountStatus,
    pub version: i64,
}

impl LoyaltyAccount {
    pub fn new(record: CustomerRecord) -> Self {
        Self {
            record,
            status: AccountStatus::Active,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    fn validate_active(&self) -> Result<(), LoyaltyError> {
        match self.status {
            AccountStatus::Active => Ok(()),
            AccountStatus::Canceled => Err(LoyaltyError::AccountCanceled),
        }
    }
}

impl Aggregate for LoyaltyAccount {
    type Id = CustomerId;
    type Event = LoyaltyEvent;
    type Command = LoyaltyCommand;
    type Error = LoyaltyError;

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            LoyaltyEvent::PointsAdded(e) => {
                self.record.loyalty_points = e.total;
            }
            LoyaltyEvent::Promoted(e) => {
                self.record.tier = e.new_tier;
            }
            LoyaltyEvent::GuestAdded(e) => {
                self.record.guests.push(e.guest.clone());
            }
            LoyaltyEvent::GuestRemoved(e) => {
                // Most recent entry first: a rollback undoes the latest append
                let position = self
                    .record
                    .guests
                    .iter()
                    .rposition(|guest| guest.customer_id == e.customer_id)
                    .ok_or_else(|| LoyaltyError::GuestNotFound(e.customer_id.clone()))?;
                self.record.guests.remove(position);
            }
            LoyaltyEvent::StatusRaised(e) => {
                self.record.tier = e.new_tier;
            }
            LoyaltyEvent::PointsRaised(e) => {
                self.record.loyalty_points = e.new_points;
            }
            LoyaltyEvent::AccountCanceled(_) => {
                self.status = AccountStatus::Canceled;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LoyaltyCommand::AddPoints { points } => {
                self.validate_active()?;

                if *points == 0 {
                    return Err(LoyaltyError::InvalidPoints);
                }

                let total = self.record.loyalty_points.saturating_add(*points);
                let mut events = vec![LoyaltyEvent::PointsAdded(PointsAdded {
                    points: *points,
                    total,
                })];

                // Business rule: promote only, never demote
                let candidate = TierTable::max_tier_for(total);
                if candidate.minimum_points() > self.record.tier.minimum_points() {
                    events.push(LoyaltyEvent::Promoted(TierPromoted {
                        old_tier: self.record.tier,
                        new_tier: candidate,
                    }));
                }

                Ok(events)
            }

            LoyaltyCommand::AddGuest { guest } => {
                self.validate_active()?;

                // Full guest list: silently dropped
                if !self.record.can_add_guest() {
                    return Ok(vec![]);
                }

                Ok(vec![LoyaltyEvent::GuestAdded(GuestAdded {
                    guest: guest.clone(),
                })])
            }

            LoyaltyCommand::RemoveGuest { customer_id } => {
                if !self.record.guest_ids().any(|id| id == customer_id) {
                    return Err(LoyaltyError::GuestNotFound(customer_id.clone()));
                }

                Ok(vec![LoyaltyEvent::GuestRemoved(GuestRemoved {
                    customer_id: customer_id.clone(),
                })])
            }

            LoyaltyCommand::EnsureMinimumStatus { floor } => {
                self.validate_active()?;

                let mut events = Vec::new();
                let mut tier = self.record.tier;

                // Step one level at a time so every intermediate tier is visited
                while tier.minimum_points() < floor.minimum_points() {
                    let next = TierTable::next(tier);
                    if next == tier {
                        break;
                    }
                    events.push(LoyaltyEvent::StatusRaised(StatusRaised {
                        old_tier: tier,
                        new_tier: next,
                    }));
                    tier = next;
                }

                if self.record.loyalty_points < floor.minimum_points() {
                    events.push(LoyaltyEvent::PointsRaised(PointsRaised {
                        old_points: self.record.loyalty_points,
                        new_points: floor.minimum_points(),
                    }));
                }

                Ok(events)
            }

            LoyaltyCommand::CancelAccount => {
                self.validate_active()?;

                Ok(vec![LoyaltyEvent::AccountCanceled(AccountCanceled {
                    final_points: self.record.loyalty_points,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> &CustomerId {
        &self.record.customer_id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loyalty::tier::Tier;
    use crate::event_sourcing::{EventEnvelope, EventHistory};
    use uuid::Uuid;

    fn tier(name: &str) -> Tier {
        TierTable::by_name(name).unwrap()
    }

    fn account_at(tier_name: &str, points: u64) -> LoyaltyAccount {
        LoyaltyAccount::new(CustomerRecord::new("host").with_tier(tier(tier_name)).with_points(points))
    }

    #[test]
    fn test_add_points_promotes_to_bronze() {
        let mut account = LoyaltyAccount::new(CustomerRecord::new("123"));

        let events = account.execute(&LoyaltyCommand::AddPoints { points: 500 }).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], LoyaltyEvent::Promoted(e) if e.new_tier.name() == "Bronze"));
        assert_eq!(account.record.loyalty_points, 500);
        assert_eq!(account.record.tier.level(), 1);
        assert_eq!(account.version(), 2);
    }

    #[test]
    fn test_points_accumulate_and_tier_tracks_max() {
        let mut account = LoyaltyAccount::new(CustomerRecord::new("123"));
        let deltas = [120, 380, 1, 999, 1_500, 7, 3_000];
        let mut sum = 0;
        let mut last_level = 0;

        for delta in deltas {
            account.execute(&LoyaltyCommand::AddPoints { points: delta }).unwrap();
            sum += delta;

            assert_eq!(account.record.loyalty_points, sum);
            assert_eq!(account.record.tier, TierTable::max_tier_for(sum));
            assert!(account.record.tier.level() >= last_level);
            last_level = account.record.tier.level();
        }
    }

    #[test]
    fn test_add_points_never_demotes() {
        // A floor raise can leave the tier above what points alone would give
        let mut account = account_at("Gold", 0);

        let events = account.execute(&LoyaltyCommand::AddPoints { points: 600 }).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(account.record.tier, tier("Gold"));
    }

    #[test]
    fn test_zero_points_rejected() {
        let account = LoyaltyAccount::new(CustomerRecord::new("123"));
        let result = account.handle_command(&LoyaltyCommand::AddPoints { points: 0 });
        assert_eq!(result, Err(LoyaltyError::InvalidPoints));
    }

    #[test]
    fn test_add_guest_respects_capacity() {
        let mut account = account_at("Bronze", 500);

        let first = account.execute(&LoyaltyCommand::AddGuest { guest: CustomerRecord::new("g1") }).unwrap();
        let second = account.execute(&LoyaltyCommand::AddGuest { guest: CustomerRecord::new("g2") }).unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(account.record.guests.len(), 1);
    }

    #[test]
    fn test_member_cannot_add_guests() {
        let account = LoyaltyAccount::new(CustomerRecord::new("123"));
        let events = account.handle_command(&LoyaltyCommand::AddGuest { guest: CustomerRecord::new("g1") }).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_remove_guest_undoes_latest_entry() {
        let mut account = account_at("Platinum", 5_000);
        for id in ["g1", "g2", "g1"] {
            account.execute(&LoyaltyCommand::AddGuest { guest: CustomerRecord::new(id) }).unwrap();
        }

        account.execute(&LoyaltyCommand::RemoveGuest { customer_id: "g1".into() }).unwrap();

        let ids: Vec<&str> = account.record.guest_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"]);

        let missing = account.handle_command(&LoyaltyCommand::RemoveGuest { customer_id: "nobody".into() });
        assert_eq!(missing, Err(LoyaltyError::GuestNotFound("nobody".into())));
    }

    #[test]
    fn test_ensure_minimum_status_steps_one_level_at_a_time() {
        let mut account = account_at("Member", 120);

        let events = account.execute(&LoyaltyCommand::EnsureMinimumStatus { floor: tier("Silver") }).unwrap();

        let steps: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|e| match e {
                LoyaltyEvent::StatusRaised(s) => Some((s.old_tier.level(), s.new_tier.level())),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![(0, 1), (1, 2)]);
        assert_eq!(account.record.tier, tier("Silver"));
        assert_eq!(account.record.loyalty_points, 1_000);
    }

    #[test]
    fn test_ensure_minimum_status_keeps_higher_points() {
        let mut account = account_at("Member", 1_800);

        account.execute(&LoyaltyCommand::EnsureMinimumStatus { floor: tier("Silver") }).unwrap();

        assert_eq!(account.record.tier, tier("Silver"));
        assert_eq!(account.record.loyalty_points, 1_800);
    }

    #[test]
    fn test_ensure_minimum_status_is_idempotent() {
        let mut once = account_at("Bronze", 600);
        once.execute(&LoyaltyCommand::EnsureMinimumStatus { floor: tier("Gold") }).unwrap();

        let mut twice = once.clone();
        let repeat = twice.execute(&LoyaltyCommand::EnsureMinimumStatus { floor: tier("Gold") }).unwrap();
        let lower = twice.execute(&LoyaltyCommand::EnsureMinimumStatus { floor: tier("Bronze") }).unwrap();

        assert!(repeat.is_empty());
        assert!(lower.is_empty());
        assert_eq!(once.record, twice.record);
    }

    #[test]
    fn test_canceled_account_rejects_mutations() {
        let mut account = account_at("Gold", 2_500);
        account.execute(&LoyaltyCommand::CancelAccount).unwrap();

        assert!(!account.is_active());
        for command in [
            LoyaltyCommand::AddPoints { points: 10 },
            LoyaltyCommand::AddGuest { guest: CustomerRecord::new("g1") },
            LoyaltyCommand::EnsureMinimumStatus { floor: tier("Platinum") },
            LoyaltyCommand::CancelAccount,
        ] {
            assert_eq!(account.handle_command(&command), Err(LoyaltyError::AccountCanceled));
        }
        assert_eq!(account.record.loyalty_points, 2_500);
    }

    #[test]
    fn test_replay_reconstructs_state() {
        let initial = LoyaltyAccount::new(CustomerRecord::new("123"));
        let mut live = initial.clone();
        let mut history = EventHistory::new("customer-123", Uuid::new_v4());

        for command in [
            LoyaltyCommand::AddPoints { points: 1_200 },
            LoyaltyCommand::AddGuest { guest: CustomerRecord::new("g1") },
            LoyaltyCommand::EnsureMinimumStatus { floor: tier("Gold") },
            LoyaltyCommand::CancelAccount,
        ] {
            let events = live.execute(&command).unwrap();
            history.append(events, LoyaltyEvent::name);
        }

        let replayed = initial.replay(history.events()).unwrap();
        assert_eq!(replayed, live);
    }

    #[test]
    fn test_replay_fails_on_inconsistent_history() {
        let bogus = EventEnvelope::new(
            "customer-123",
            1,
            "GuestRemoved".to_string(),
            LoyaltyEvent::GuestRemoved(GuestRemoved { customer_id: "ghost".into() }),
            Uuid::new_v4(),
        );

        let result = LoyaltyAccount::new(CustomerRecord::new("123")).replay([&bogus]);
        assert!(result.is_err());
    }
}
