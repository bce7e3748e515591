//! Decryption access gate.
//!
//! Every stored handle is granted to exactly the vault contract and the
//! bidder that created it. The gate decides which requesters the vault will
//! forward a decryption request for; the compute layer checks its own ACL
//! independently.

use cipherbid_types::{Address, ConfidentialHandle};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AccessError, VaultError};
use crate::state::VaultState;

/// Who besides the bidder may decrypt a bid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosurePolicy {
    /// Only the bidder, at any time
    #[default]
    BidderOnly,
    /// The bidder, plus the auction creator once the auction is finalized
    CreatorAfterFinalize,
}

/// Authorizes decryption requests against stored bids.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessGate {
    policy: DisclosurePolicy,
}

impl AccessGate {
    pub fn new(policy: DisclosurePolicy) -> Self {
        Self { policy }
    }

    /// Whether finalizing an auction must grant its bids to the creator.
    pub fn discloses_to_creator(&self) -> bool {
        self.policy == DisclosurePolicy::CreatorAfterFinalize
    }

    /// Resolve the handle `requester` may decrypt for `bidder`'s bid.
    pub fn authorize(
        &self,
        state: &VaultState,
        auction_id: u64,
        bidder: &Address,
        requester: &Address,
    ) -> Result<ConfidentialHandle, VaultError> {
        let auction = state
            .get_auction(auction_id)
            .ok_or(VaultError::NotFound(auction_id))?;

        let bid = state
            .bids
            .get(auction_id, bidder)
            .ok_or(AccessError::NoBid)?;

        if requester == bidder {
            return Ok(bid.handle);
        }

        let creator_allowed = self.discloses_to_creator()
            && *requester == auction.creator
            && auction.finalized();
        if creator_allowed {
            return Ok(bid.handle);
        }

        warn!(auction_id, "Decryption of another bidder's handle refused");
        Err(AccessError::NotBidOwner.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherbid_types::{Auction, InputProof, LifecycleState};

    const CREATOR: Address = [1u8; 32];
    const BIDDER: Address = [2u8; 32];
    const OTHER: Address = [3u8; 32];

    fn state_with_bid(state_flag: LifecycleState) -> VaultState {
        let mut state = VaultState::new();
        state.registry.create_with(|id| Auction {
            id,
            title: "Item".to_string(),
            description: String::new(),
            creator: CREATOR,
            starting_bid: 100,
            created_at: 0,
            end_time: 3600,
            state: state_flag,
        });
        state
            .bids
            .upsert(1, BIDDER, ConfidentialHandle([5u8; 32]), InputProof::default(), 10);
        state
    }

    #[test]
    fn test_bidder_is_authorized() {
        let state = state_with_bid(LifecycleState::Active);
        let gate = AccessGate::default();

        assert_eq!(
            gate.authorize(&state, 1, &BIDDER, &BIDDER),
            Ok(ConfidentialHandle([5u8; 32]))
        );
    }

    #[test]
    fn test_others_refused_by_default() {
        let state = state_with_bid(LifecycleState::Finalized);
        let gate = AccessGate::default();

        assert_eq!(
            gate.authorize(&state, 1, &BIDDER, &CREATOR),
            Err(VaultError::Access(AccessError::NotBidOwner))
        );
        assert_eq!(
            gate.authorize(&state, 1, &BIDDER, &OTHER),
            Err(VaultError::Access(AccessError::NotBidOwner))
        );
    }

    #[test]
    fn test_creator_after_finalize() {
        let gate = AccessGate::new(DisclosurePolicy::CreatorAfterFinalize);

        let ended = state_with_bid(LifecycleState::Ended);
        assert_eq!(
            gate.authorize(&ended, 1, &BIDDER, &CREATOR),
            Err(VaultError::Access(AccessError::NotBidOwner))
        );

        let finalized = state_with_bid(LifecycleState::Finalized);
        assert!(gate.authorize(&finalized, 1, &BIDDER, &CREATOR).is_ok());
        assert!(gate.authorize(&finalized, 1, &BIDDER, &OTHER).is_err());
    }

    #[test]
    fn test_missing_auction_or_bid() {
        let state = state_with_bid(LifecycleState::Active);
        let gate = AccessGate::default();

        assert_eq!(
            gate.authorize(&state, 2, &BIDDER, &BIDDER),
            Err(VaultError::NotFound(2))
        );
        assert_eq!(
            gate.authorize(&state, 1, &OTHER, &OTHER),
            Err(VaultError::Access(AccessError::NoBid))
        );
    }
}
