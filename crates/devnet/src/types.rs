//! RPC-compatible types for the devnet.
//!
//! These types are JSON-serializable versions of the core vault types, with
//! addresses and bytes as hex strings.

use cipherbid_module::{AuctionStatus, AuctionSummary};
use cipherbid_types::AuctionView;
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    pub title: String,
    pub description: String,
    pub starting_bid: u64,
    pub duration_hours: u32,
}

/// Parameters for placing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidParams {
    pub sender: String,
    pub auction_id: u64,
    /// Hex-encoded handle (32 bytes)
    pub handle: String,
    /// Hex-encoded input proof
    pub proof: String,
}

/// Parameters for ending or finalizing an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleParams {
    pub sender: String,
    pub auction_id: u64,
}

/// Parameters for encrypting a bid amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptParams {
    /// Caller the input is bound to
    pub sender: String,
    pub value: u64,
}

/// Encrypted input for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedInputRpc {
    /// Hex-encoded handle (32 bytes)
    pub handle: String,
    /// Hex-encoded input proof
    pub proof: String,
}

/// Parameters for decrypting a stored bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDecryptParams {
    pub requester: String,
    pub auction_id: u64,
    pub bidder: String,
}

/// Auction for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Hex-encoded address
    pub creator: String,
    pub starting_bid: u64,
    pub created_at: u64,
    pub end_time: u64,
    pub ended: bool,
    pub finalized: bool,
}

impl From<AuctionView> for AuctionRpc {
    fn from(view: AuctionView) -> Self {
        Self {
            id: view.id,
            title: view.title,
            description: view.description,
            creator: hex::encode(view.creator),
            starting_bid: view.starting_bid,
            created_at: view.created_at,
            end_time: view.end_time,
            ended: view.ended,
            finalized: view.finalized,
        }
    }
}

/// Auction listing entry for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSummaryRpc {
    pub auction_id: u64,
    pub creator: String,
    pub title: String,
    pub starting_bid: u64,
    /// "active", "closed", "ended" or "finalized"
    pub status: String,
    pub end_time: u64,
    pub num_bids: usize,
}

impl From<AuctionSummary> for AuctionSummaryRpc {
    fn from(summary: AuctionSummary) -> Self {
        let status = match summary.status {
            AuctionStatus::Active => "active",
            AuctionStatus::Closed => "closed",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Finalized => "finalized",
        };
        Self {
            auction_id: summary.auction_id,
            creator: hex::encode(summary.creator),
            title: summary.title,
            starting_bid: summary.starting_bid,
            status: status.to_string(),
            end_time: summary.end_time,
            num_bids: summary.num_bids,
        }
    }
}
