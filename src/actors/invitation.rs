use crate::domain::loyalty::{
    CustomerId, CustomerRecord, LoyaltyAccount, LoyaltyCommand, LoyaltyError, LoyaltyEvent, Tier, TierTable,
};
use crate::event_sourcing::{Aggregate, EventHistory};
use super::host::{ActorHost, Creation, Signal};

// ============================================================================
// Guest Invitation Protocol
// ============================================================================
//
// 1. Drop the request if the guest list is full
// 2. Record the guest locally
// 3. Guest floor = one tier below the inviter
// 4. Create the guest's actor at the floor, or, if it already exists,
//    signal the current instance to raise itself to the floor
//
// Repeat invitations land in the already-exists branch, so a guest actor
// is created at most once. A guest whose account is canceled is not raised;
// the inviter is told instead and the local entry stays. A hard host
// failure undoes step 2 before the error is returned.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum InviteOutcome {
    /// Guest list full; nothing happened
    Dropped,
    /// A new actor was started for the guest at `floor`
    Created { guest: CustomerId, floor: Tier },
    /// The guest already had an actor; it was asked to reach `floor`
    AlreadyExisted { guest: CustomerId, floor: Tier },
    /// The guest's actor exists but their account is canceled
    GuestCanceled { guest: CustomerId },
}

impl InviteOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InviteOutcome::Dropped => "dropped",
            InviteOutcome::Created { .. } => "created",
            InviteOutcome::AlreadyExisted { .. } => "already_exists",
            InviteOutcome::GuestCanceled { .. } => "guest_canceled",
        }
    }
}

pub async fn invite_guest(
    account: &mut LoyaltyAccount,
    history: &mut EventHistory<LoyaltyEvent>,
    host: &dyn ActorHost,
    guest: CustomerRecord,
) -> Result<InviteOutcome, LoyaltyError> {
    guest.validate()?;
    if &guest.customer_id == account.aggregate_id() {
        return Err(LoyaltyError::SelfInvitation);
    }

    let added = account.execute(&LoyaltyCommand::AddGuest { guest: guest.clone() })?;
    if added.is_empty() {
        tracing::debug!(
            customer_id = %account.aggregate_id(),
            guest_id = %guest.customer_id,
            tier = %account.record.tier,
            "Guest list full; dropping invitation"
        );
        return Ok(InviteOutcome::Dropped);
    }
    history.append(added, LoyaltyEvent::name);

    let floor = TierTable::previous(account.record.tier);
    let guest_id = guest.customer_id.clone();
    let guest_actor = guest_id.actor_id();

    tracing::info!(
        customer_id = %account.aggregate_id(),
        guest_id = %guest_id,
        floor = %floor,
        "Inviting guest; starting guest actor"
    );

    let delivery = match host.create_if_absent(&guest_actor, guest.with_tier(floor)).await {
        Ok(Creation::Created) => return Ok(InviteOutcome::Created { guest: guest_id, floor }),
        Ok(Creation::Canceled) => {
            tracing::info!(guest_id = %guest_id, "Guest has already canceled their account");
            return Ok(InviteOutcome::GuestCanceled { guest: guest_id });
        }
        Ok(Creation::AlreadyExists) => {
            tracing::info!(
                guest_id = %guest_id,
                floor = %floor,
                "Guest actor already running; signaling it to reach the floor"
            );
            // Addressed by id so the host resolves the instance that is current now
            host.signal(&guest_actor, Signal::EnsureMinimumStatus { floor }).await
        }
        Err(err) => Err(err),
    };

    match delivery {
        Ok(()) => Ok(InviteOutcome::AlreadyExisted { guest: guest_id, floor }),
        Err(err) => {
            tracing::error!(
                customer_id = %account.aggregate_id(),
                guest_id = %guest_id,
                error = %err,
                "Guest invitation failed; removing guest from local list"
            );
            let removed = account.execute(&LoyaltyCommand::RemoveGuest { customer_id: guest_id.clone() })?;
            history.append(removed, LoyaltyEvent::name);

            Err(LoyaltyError::InvitationFailed {
                guest: guest_id,
                reason: err.to_string(),
            })
        }
    }
}
