//! Core type definitions for the confidential bid vault.
//!
//! This crate provides the shared data structures used across the vault:
//! identities, opaque confidential handles, auction and bid records, and the
//! lifecycle enum. Nothing in here ever holds a cleartext bid amount.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// =========================
// IDENTITIES
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// The all-zero address. Never a valid caller or contract.
pub const ZERO_ADDRESS: Address = [0u8; 32];

// =========================
// CONFIDENTIAL VALUES
// =========================

/// Opaque reference to an encrypted 64-bit unsigned integer.
///
/// Handles are issued by the confidential-compute layer and are immutable.
/// The vault stores and returns them but never interprets them.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ConfidentialHandle(pub [u8; 32]);

impl ConfidentialHandle {
    /// Sentinel returned by bid lookups when no bid exists.
    pub const EMPTY: Self = Self([0u8; 32]);

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Proof bytes accompanying an encrypted input.
///
/// Lets the compute layer check that the handle was formed for a specific
/// (contract, caller) pair.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct InputProof(pub Vec<u8>);

impl InputProof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// =========================
// AUCTION TYPES
// =========================

/// Seconds in one hour of auction duration.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Auction lifecycle state.
///
/// Strictly ordered: `Active -> Ended -> Finalized`. No skipping, no cycles.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum LifecycleState {
    /// Accepting bids until the end time passes
    Active,
    /// Bidding closed by an explicit end transition
    Ended,
    /// Terminal marker
    Finalized,
}

/// Stored auction record.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub creator: Address,

    /// Disclosed floor; only later bids are confidential
    pub starting_bid: u64,

    // Timing
    pub created_at: u64,
    pub end_time: u64,

    pub state: LifecycleState,
}

impl Auction {
    pub fn ended(&self) -> bool {
        self.state >= LifecycleState::Ended
    }

    pub fn finalized(&self) -> bool {
        self.state == LifecycleState::Finalized
    }

    /// Whether bids are accepted at `now`.
    ///
    /// Stored state can stay `Active` past the end time until someone ends
    /// the auction; this read accounts for the clock without mutating.
    pub fn is_active_at(&self, now: u64) -> bool {
        self.state == LifecycleState::Active && now < self.end_time
    }
}

/// Read view of an auction, as returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionView {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub creator: Address,
    pub starting_bid: u64,
    pub created_at: u64,
    pub end_time: u64,
    pub ended: bool,
    pub finalized: bool,
}

impl From<&Auction> for AuctionView {
    fn from(auction: &Auction) -> Self {
        Self {
            id: auction.id,
            title: auction.title.clone(),
            description: auction.description.clone(),
            creator: auction.creator,
            starting_bid: auction.starting_bid,
            created_at: auction.created_at,
            end_time: auction.end_time,
            ended: auction.ended(),
            finalized: auction.finalized(),
        }
    }
}

/// A stored confidential bid (one per auction and bidder).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidRecord {
    pub bidder: Address,
    pub handle: ConfidentialHandle,
    pub proof: InputProof,
    /// Timestamp of the most recent write
    pub placed_at: u64,
    /// 1 on the first bid, incremented on every overwrite
    pub revision: u32,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute the end time of an auction, or `None` on overflow.
pub fn compute_end_time(created_at: u64, duration_hours: u32) -> Option<u64> {
    u64::from(duration_hours)
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|secs| created_at.checked_add(secs))
}

/// Derive a deterministic contract address from a deployer and nonce.
pub fn compute_contract_address(deployer: &Address, nonce: u64) -> Address {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"CIPHERBID_CONTRACT_V1:");
    hasher.update(deployer);
    hasher.update(nonce.to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_auction(state: LifecycleState) -> Auction {
        Auction {
            id: 1,
            title: "Item".to_string(),
            description: "Desc".to_string(),
            creator: [1u8; 32],
            starting_bid: 100,
            created_at: 1_000,
            end_time: 1_000 + SECONDS_PER_HOUR,
            state,
        }
    }

    #[test]
    fn test_compute_end_time() {
        assert_eq!(compute_end_time(1_000, 24), Some(1_000 + 24 * 3600));
        assert_eq!(compute_end_time(u64::MAX - 10, 1), None);
    }

    #[test]
    fn test_compute_contract_address() {
        let a = compute_contract_address(&[1u8; 32], 0);
        let b = compute_contract_address(&[1u8; 32], 1);
        let c = compute_contract_address(&[2u8; 32], 0);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ZERO_ADDRESS);
    }

    #[test]
    fn test_lifecycle_flags() {
        let active = sample_auction(LifecycleState::Active);
        assert!(!active.ended());
        assert!(!active.finalized());

        let ended = sample_auction(LifecycleState::Ended);
        assert!(ended.ended());
        assert!(!ended.finalized());

        let finalized = sample_auction(LifecycleState::Finalized);
        assert!(finalized.ended());
        assert!(finalized.finalized());
    }

    #[test]
    fn test_is_active_at() {
        let auction = sample_auction(LifecycleState::Active);
        assert!(auction.is_active_at(auction.created_at));
        assert!(auction.is_active_at(auction.end_time - 1));
        assert!(!auction.is_active_at(auction.end_time));

        let ended = sample_auction(LifecycleState::Ended);
        assert!(!ended.is_active_at(ended.created_at));
    }

    #[test]
    fn test_view_carries_flags() {
        let view = AuctionView::from(&sample_auction(LifecycleState::Finalized));
        assert!(view.ended);
        assert!(view.finalized);
    }

    #[test]
    fn test_handle_serialization() {
        let handle = ConfidentialHandle([42u8; 32]);
        let encoded = borsh::to_vec(&handle).unwrap();
        let decoded: ConfidentialHandle = borsh::from_slice(&encoded).unwrap();
        assert_eq!(handle, decoded);
        assert!(ConfidentialHandle::EMPTY.is_empty());
        assert!(!decoded.is_empty());
    }
}
