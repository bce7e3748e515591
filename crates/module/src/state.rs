//! On-chain state structures for the vault module.

use borsh::{BorshDeserialize, BorshSerialize};
use cipherbid_types::{Address, Auction, BidRecord, ConfidentialHandle, InputProof};
use std::collections::HashMap;

/// Append-only auction collection with sequential ids starting at 1.
///
/// Auction `id` is stored at position `id - 1`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AuctionRegistry {
    next_auction_id: u64,
    auctions: Vec<Auction>,
}

impl Default for AuctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionRegistry {
    pub fn new() -> Self {
        Self {
            next_auction_id: 1,
            auctions: Vec::new(),
        }
    }

    /// Allocate the next id and store the auction built for it.
    ///
    /// Callers validate their inputs first; ids are never handed out for
    /// auctions that are not stored.
    pub fn create_with<F>(&mut self, build: F) -> u64
    where
        F: FnOnce(u64) -> Auction,
    {
        let auction_id = self.next_auction_id;
        self.next_auction_id += 1;
        self.auctions.push(build(auction_id));
        auction_id
    }

    /// Number of auctions created so far.
    pub fn count(&self) -> u64 {
        self.next_auction_id - 1
    }

    pub fn get(&self, auction_id: u64) -> Option<&Auction> {
        self.index_of(auction_id).and_then(|i| self.auctions.get(i))
    }

    pub fn get_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.index_of(auction_id).and_then(|i| self.auctions.get_mut(i))
    }

    /// Auctions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.iter()
    }

    fn index_of(&self, auction_id: u64) -> Option<usize> {
        if auction_id == 0 || auction_id >= self.next_auction_id {
            return None;
        }
        usize::try_from(auction_id - 1).ok()
    }
}

/// Confidential bid slots keyed by (auction_id, bidder).
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BidStore {
    /// (auction_id, bidder) -> current bid
    bids: HashMap<(u64, Address), BidRecord>,

    /// Bidders per auction, in first-bid order
    auction_bidders: HashMap<u64, Vec<Address>>,
}

impl BidStore {
    pub fn get(&self, auction_id: u64, bidder: &Address) -> Option<&BidRecord> {
        self.bids.get(&(auction_id, *bidder))
    }

    /// Stored handle, or [`ConfidentialHandle::EMPTY`] if there is none.
    pub fn handle_of(&self, auction_id: u64, bidder: &Address) -> ConfidentialHandle {
        self.get(auction_id, bidder)
            .map(|bid| bid.handle)
            .unwrap_or(ConfidentialHandle::EMPTY)
    }

    /// Store or overwrite the bid for `bidder`. Returns `true` on a first bid.
    pub fn upsert(
        &mut self,
        auction_id: u64,
        bidder: Address,
        handle: ConfidentialHandle,
        proof: InputProof,
        placed_at: u64,
    ) -> bool {
        match self.bids.get_mut(&(auction_id, bidder)) {
            Some(existing) => {
                existing.handle = handle;
                existing.proof = proof;
                existing.placed_at = placed_at;
                existing.revision += 1;
                false
            }
            None => {
                self.bids.insert(
                    (auction_id, bidder),
                    BidRecord {
                        bidder,
                        handle,
                        proof,
                        placed_at,
                        revision: 1,
                    },
                );
                self.auction_bidders
                    .entry(auction_id)
                    .or_default()
                    .push(bidder);
                true
            }
        }
    }

    /// Bidders of an auction in first-bid order.
    pub fn bidders(&self, auction_id: u64) -> &[Address] {
        self.auction_bidders
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Current bids of an auction in first-bid order.
    pub fn auction_bids(&self, auction_id: u64) -> Vec<&BidRecord> {
        self.bidders(auction_id)
            .iter()
            .filter_map(|bidder| self.bids.get(&(auction_id, *bidder)))
            .collect()
    }

    pub fn bid_count(&self, auction_id: u64) -> usize {
        self.bidders(auction_id).len()
    }
}

/// Per-identity lists of auction ids, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UserIndex {
    created_auctions: HashMap<Address, Vec<u64>>,
    participated_auctions: HashMap<Address, Vec<u64>>,
}

impl UserIndex {
    pub fn record_created(&mut self, creator: Address, auction_id: u64) {
        self.created_auctions
            .entry(creator)
            .or_default()
            .push(auction_id);
    }

    /// Record a first bid. Must not be called on rebids.
    pub fn record_participation(&mut self, bidder: Address, auction_id: u64) {
        self.participated_auctions
            .entry(bidder)
            .or_default()
            .push(auction_id);
    }

    pub fn created_by(&self, identity: &Address) -> &[u64] {
        self.created_auctions
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn participated_in(&self, identity: &Address) -> &[u64] {
        self.participated_auctions
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Vault module state.
///
/// Owned explicitly and passed through every handler; there is no ambient
/// global. In a real deployment these would be substrate storage maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VaultState {
    pub registry: AuctionRegistry,
    pub bids: BidStore,
    pub users: UserIndex,
}

impl VaultState {
    /// Create a new vault state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.registry.get(auction_id)
    }

    /// Get mutable auction by ID.
    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.registry.get_mut(auction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherbid_types::LifecycleState;

    fn auction(id: u64) -> Auction {
        Auction {
            id,
            title: format!("Item {}", id),
            description: String::new(),
            creator: [1u8; 32],
            starting_bid: 100,
            created_at: 0,
            end_time: 3600,
            state: LifecycleState::Active,
        }
    }

    #[test]
    fn test_registry_allocates_sequential_ids() {
        let mut registry = AuctionRegistry::new();
        assert_eq!(registry.count(), 0);

        assert_eq!(registry.create_with(auction), 1);
        assert_eq!(registry.create_with(auction), 2);
        assert_eq!(registry.create_with(auction), 3);

        assert_eq!(registry.count(), 3);
        assert!(registry.get(4).is_none());
        let ids: Vec<u64> = registry.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_registry_lookup_bounds() {
        let mut registry = AuctionRegistry::new();
        registry.create_with(auction);

        assert!(registry.get(0).is_none());
        assert_eq!(registry.get(1).map(|a| a.id), Some(1));
        assert!(registry.get(2).is_none());
        assert!(registry.get(u64::MAX).is_none());
    }

    #[test]
    fn test_bid_upsert_overwrites() {
        let mut store = BidStore::default();
        let bidder = [2u8; 32];

        assert!(store.upsert(1, bidder, ConfidentialHandle([1u8; 32]), InputProof::default(), 10));
        assert!(!store.upsert(1, bidder, ConfidentialHandle([2u8; 32]), InputProof::default(), 20));

        let bid = store.get(1, &bidder).unwrap();
        assert_eq!(bid.handle, ConfidentialHandle([2u8; 32]));
        assert_eq!(bid.placed_at, 20);
        assert_eq!(bid.revision, 2);
        assert_eq!(store.bidders(1), &[bidder]);
        assert_eq!(store.bid_count(1), 1);
    }

    #[test]
    fn test_missing_bid_is_empty_handle() {
        let store = BidStore::default();
        assert!(store.handle_of(1, &[2u8; 32]).is_empty());
        assert!(store.bidders(1).is_empty());
        assert!(store.auction_bids(1).is_empty());
    }

    #[test]
    fn test_bidders_keep_first_bid_order() {
        let mut store = BidStore::default();
        let (a, b) = ([2u8; 32], [3u8; 32]);

        store.upsert(1, a, ConfidentialHandle([1u8; 32]), InputProof::default(), 1);
        store.upsert(1, b, ConfidentialHandle([2u8; 32]), InputProof::default(), 2);
        store.upsert(1, a, ConfidentialHandle([3u8; 32]), InputProof::default(), 3);

        assert_eq!(store.bidders(1), &[a, b]);
        let handles: Vec<ConfidentialHandle> =
            store.auction_bids(1).into_iter().map(|bid| bid.handle).collect();
        assert_eq!(handles, vec![ConfidentialHandle([3u8; 32]), ConfidentialHandle([2u8; 32])]);
    }

    #[test]
    fn test_user_index() {
        let mut users = UserIndex::default();
        let alice = [1u8; 32];

        users.record_created(alice, 1);
        users.record_created(alice, 2);
        users.record_participation(alice, 5);

        assert_eq!(users.created_by(&alice), &[1, 2]);
        assert_eq!(users.participated_in(&alice), &[5]);
        assert!(users.created_by(&[9u8; 32]).is_empty());
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let mut state = VaultState::new();
        state.registry.create_with(auction);
        state.users.record_created([1u8; 32], 1);
        state
            .bids
            .upsert(1, [2u8; 32], ConfidentialHandle([5u8; 32]), InputProof(vec![1, 2]), 7);

        let encoded = borsh::to_vec(&state).unwrap();
        let decoded: VaultState = borsh::from_slice(&encoded).unwrap();
        assert_eq!(state, decoded);
    }
}
