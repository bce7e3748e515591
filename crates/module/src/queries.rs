//! Query handlers for the vault module.
//!
//! These functions provide read-only access to vault state.

use crate::state::VaultState;
use cipherbid_types::{Address, Auction, AuctionView, ConfidentialHandle, LifecycleState};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultQuery {
    /// Get auction details by ID.
    GetAuction { auction_id: u64 },

    /// Get a bidder's handle (empty handle if none).
    GetBid { auction_id: u64, bidder: Address },

    /// Get the number of auctions created.
    GetAuctionCount,

    /// Get ids of auctions created by an identity.
    GetUserAuctions { identity: Address },

    /// Get ids of auctions an identity has bid on.
    GetUserBids { identity: Address },

    /// Check whether an auction accepts bids right now.
    IsAuctionActive { auction_id: u64 },

    /// Get all auctions (paginated).
    ListAuctions { offset: u64, limit: u64 },

    /// Get bidders of an auction in first-bid order.
    GetAuctionBidders { auction_id: u64 },

    /// Get auctions currently accepting bids.
    GetActiveAuctions,

    /// Get ids of auctions past their end time that nobody has ended yet.
    GetPendingEnd,
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultQueryResponse {
    /// Auction details.
    Auction(Option<AuctionView>),

    /// Bid handle.
    Bid(ConfidentialHandle),

    /// Auction count.
    AuctionCount(u64),

    /// Auction ids.
    AuctionIds(Vec<u64>),

    /// Activity flag.
    Active(bool),

    /// List of auctions.
    AuctionList(Vec<AuctionSummary>),

    /// Bidder identities.
    Bidders(Vec<Address>),
}

/// Handle a query at substrate time `now`.
pub fn handle_query(state: &VaultState, query: VaultQuery, now: u64) -> VaultQueryResponse {
    match query {
        VaultQuery::GetAuction { auction_id } => {
            VaultQueryResponse::Auction(state.get_auction(auction_id).map(AuctionView::from))
        }

        VaultQuery::GetBid { auction_id, bidder } => {
            VaultQueryResponse::Bid(state.bids.handle_of(auction_id, &bidder))
        }

        VaultQuery::GetAuctionCount => VaultQueryResponse::AuctionCount(state.registry.count()),

        VaultQuery::GetUserAuctions { identity } => {
            VaultQueryResponse::AuctionIds(state.users.created_by(&identity).to_vec())
        }

        VaultQuery::GetUserBids { identity } => {
            VaultQueryResponse::AuctionIds(state.users.participated_in(&identity).to_vec())
        }

        VaultQuery::IsAuctionActive { auction_id } => VaultQueryResponse::Active(
            state
                .get_auction(auction_id)
                .map(|auction| auction.is_active_at(now))
                .unwrap_or(false),
        ),

        VaultQuery::ListAuctions { offset, limit } => VaultQueryResponse::AuctionList(
            get_auction_summaries(state, offset as usize, limit as usize, now),
        ),

        VaultQuery::GetAuctionBidders { auction_id } => {
            VaultQueryResponse::Bidders(state.bids.bidders(auction_id).to_vec())
        }

        VaultQuery::GetActiveAuctions => {
            VaultQueryResponse::AuctionList(get_active_auctions(state, now))
        }

        VaultQuery::GetPendingEnd => VaultQueryResponse::AuctionIds(get_pending_end(state, now)),
    }
}

/// Display status of an auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Accepting bids
    Active,
    /// Past the end time, waiting for someone to end it
    Closed,
    Ended,
    Finalized,
}

impl AuctionStatus {
    pub fn of(auction: &Auction, now: u64) -> Self {
        match auction.state {
            LifecycleState::Active if auction.is_active_at(now) => Self::Active,
            LifecycleState::Active => Self::Closed,
            LifecycleState::Ended => Self::Ended,
            LifecycleState::Finalized => Self::Finalized,
        }
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub creator: Address,
    pub title: String,
    pub starting_bid: u64,
    pub status: AuctionStatus,
    pub end_time: u64,
    pub num_bids: usize,
}

impl AuctionSummary {
    /// Create summary from an auction and its bid count.
    pub fn from_auction(auction: &Auction, num_bids: usize, now: u64) -> Self {
        Self {
            auction_id: auction.id,
            creator: auction.creator,
            title: auction.title.clone(),
            starting_bid: auction.starting_bid,
            status: AuctionStatus::of(auction, now),
            end_time: auction.end_time,
            num_bids,
        }
    }
}

/// Get auction summaries for listing.
pub fn get_auction_summaries(
    state: &VaultState,
    offset: usize,
    limit: usize,
    now: u64,
) -> Vec<AuctionSummary> {
    state
        .registry
        .iter()
        .skip(offset)
        .take(limit)
        .map(|auction| AuctionSummary::from_auction(auction, state.bids.bid_count(auction.id), now))
        .collect()
}

/// Get active auctions (currently accepting bids).
pub fn get_active_auctions(state: &VaultState, now: u64) -> Vec<AuctionSummary> {
    state
        .registry
        .iter()
        .filter(|auction| auction.is_active_at(now))
        .map(|auction| AuctionSummary::from_auction(auction, state.bids.bid_count(auction.id), now))
        .collect()
}

/// Get auctions past their end time that nobody has ended yet.
pub fn get_pending_end(state: &VaultState, now: u64) -> Vec<u64> {
    state
        .registry
        .iter()
        .filter(|auction| AuctionStatus::of(auction, now) == AuctionStatus::Closed)
        .map(|auction| auction.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherbid_types::InputProof;

    const CREATOR: Address = [1u8; 32];

    fn state_with_auctions(n: u64) -> VaultState {
        let mut state = VaultState::new();
        for _ in 0..n {
            let id = state.registry.create_with(|id| Auction {
                id,
                title: format!("Item {}", id),
                description: String::new(),
                creator: CREATOR,
                starting_bid: 100,
                created_at: 0,
                end_time: 100 * id,
                state: LifecycleState::Active,
            });
            state.users.record_created(CREATOR, id);
        }
        state
    }

    #[test]
    fn test_get_auction_query() {
        let state = state_with_auctions(1);

        let response = handle_query(&state, VaultQuery::GetAuction { auction_id: 1 }, 0);
        assert!(matches!(
            response,
            VaultQueryResponse::Auction(Some(AuctionView { id: 1, ended: false, .. }))
        ));

        let response = handle_query(&state, VaultQuery::GetAuction { auction_id: 2 }, 0);
        assert_eq!(response, VaultQueryResponse::Auction(None));
    }

    #[test]
    fn test_get_bid_query_empty() {
        let state = state_with_auctions(1);
        let response = handle_query(
            &state,
            VaultQuery::GetBid {
                auction_id: 1,
                bidder: [2u8; 32],
            },
            0,
        );
        assert_eq!(response, VaultQueryResponse::Bid(ConfidentialHandle::EMPTY));
    }

    #[test]
    fn test_count_and_user_auctions() {
        let state = state_with_auctions(3);

        assert_eq!(
            handle_query(&state, VaultQuery::GetAuctionCount, 0),
            VaultQueryResponse::AuctionCount(3)
        );
        assert_eq!(
            handle_query(&state, VaultQuery::GetUserAuctions { identity: CREATOR }, 0),
            VaultQueryResponse::AuctionIds(vec![1, 2, 3])
        );
        assert_eq!(
            handle_query(&state, VaultQuery::GetUserBids { identity: CREATOR }, 0),
            VaultQueryResponse::AuctionIds(vec![])
        );
    }

    #[test]
    fn test_is_active_query() {
        let state = state_with_auctions(1);

        assert_eq!(
            handle_query(&state, VaultQuery::IsAuctionActive { auction_id: 1 }, 99),
            VaultQueryResponse::Active(true)
        );
        assert_eq!(
            handle_query(&state, VaultQuery::IsAuctionActive { auction_id: 1 }, 100),
            VaultQueryResponse::Active(false)
        );
        assert_eq!(
            handle_query(&state, VaultQuery::IsAuctionActive { auction_id: 5 }, 0),
            VaultQueryResponse::Active(false)
        );
    }

    #[test]
    fn test_summaries_and_status() {
        let mut state = state_with_auctions(3);
        state
            .bids
            .upsert(2, [2u8; 32], ConfidentialHandle([1u8; 32]), InputProof::default(), 1);
        state.get_auction_mut(3).unwrap().state = LifecycleState::Ended;

        let summaries = get_auction_summaries(&state, 1, 10, 150);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].auction_id, 2);
        assert_eq!(summaries[0].status, AuctionStatus::Active);
        assert_eq!(summaries[0].num_bids, 1);
        assert_eq!(summaries[1].status, AuctionStatus::Ended);

        let active = get_active_auctions(&state, 150);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].auction_id, 2);

        // Auction 1 ended at t=100 but was never ended explicitly
        assert_eq!(get_pending_end(&state, 150), vec![1]);
    }

    #[test]
    fn test_active_and_pending_queries() {
        let mut state = state_with_auctions(3);
        state.get_auction_mut(3).unwrap().state = LifecycleState::Ended;

        let response = handle_query(&state, VaultQuery::GetActiveAuctions, 150);
        match response {
            VaultQueryResponse::AuctionList(list) => {
                let ids: Vec<u64> = list.iter().map(|s| s.auction_id).collect();
                assert_eq!(ids, vec![2]);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        assert_eq!(
            handle_query(&state, VaultQuery::GetPendingEnd, 150),
            VaultQueryResponse::AuctionIds(vec![1])
        );
        assert_eq!(
            handle_query(&state, VaultQuery::GetPendingEnd, 0),
            VaultQueryResponse::AuctionIds(vec![])
        );
    }

    #[test]
    fn test_query_json_shape() {
        let query = VaultQuery::GetAuction { auction_id: 4 };
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"GetAuction":{"auction_id":4}}"#);
    }
}
