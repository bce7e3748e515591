//! Call message types for the vault module.

use borsh::{BorshDeserialize, BorshSerialize};
use cipherbid_types::{ConfidentialHandle, InputProof};

/// Call messages for the vault module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum VaultCall {
    /// Create a new auction.
    CreateAuction {
        title: String,
        description: String,
        starting_bid: u64,
        duration_hours: u32,
    },

    /// Place or replace the sender's confidential bid.
    PlaceBid {
        auction_id: u64,
        encrypted_amount: ConfidentialHandle,
        proof: InputProof,
    },

    /// Close bidding once the end time has passed (anyone).
    EndAuction { auction_id: u64 },

    /// Mark an ended auction as finalized (anyone).
    FinalizeAuction { auction_id: u64 },
}

/// Result of a committed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    AuctionCreated(u64),
    BidPlaced { auction_id: u64, first_bid: bool },
    AuctionEnded(u64),
    AuctionFinalized(u64),
}
