//! Call handlers for the vault module.
//!
//! These functions implement the business logic for each call type. Every
//! handler validates all of its preconditions before the first write, so a
//! rejected call leaves the state exactly as it found it.

use cipherbid_compute::ConfidentialCompute;
use cipherbid_types::{
    compute_end_time, Address, Auction, ConfidentialHandle, InputProof, LifecycleState,
    ZERO_ADDRESS,
};
use tracing::{info, warn};

use crate::access::AccessGate;
use crate::error::{AccessError, ValidationError, VaultError};
use crate::genesis::VaultGenesisConfig;
use crate::lifecycle;
use crate::state::VaultState;

/// Context provided by the runtime for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, VaultError>;

/// Handle CreateAuction call.
pub fn handle_create_auction(
    state: &mut VaultState,
    config: &VaultGenesisConfig,
    ctx: &CallContext,
    title: String,
    description: String,
    starting_bid: u64,
    duration_hours: u32,
) -> HandlerResult<u64> {
    check_sender(ctx)?;
    if starting_bid == 0 {
        return Err(ValidationError::InvalidAmount.into());
    }
    if duration_hours == 0 {
        return Err(ValidationError::InvalidDuration.into());
    }
    let end_time =
        compute_end_time(ctx.timestamp, duration_hours).ok_or(ValidationError::InvalidDuration)?;

    check_text_len("title", &title, config.limits.max_title_len)?;
    check_text_len("description", &description, config.limits.max_description_len)?;

    let creator = ctx.sender;
    let auction_id = state.registry.create_with(|id| Auction {
        id,
        title,
        description,
        creator,
        starting_bid,
        created_at: ctx.timestamp,
        end_time,
        state: LifecycleState::Active,
    });
    state.users.record_created(creator, auction_id);

    info!(
        "Created auction {} by {} at block {} (ends at {})",
        auction_id,
        hex::encode(creator),
        ctx.block_height,
        end_time
    );
    Ok(auction_id)
}

/// Handle PlaceBid call.
///
/// Returns `true` if this was the sender's first bid on the auction.
pub fn handle_place_bid<C: ConfidentialCompute>(
    state: &mut VaultState,
    compute: &mut C,
    config: &VaultGenesisConfig,
    ctx: &CallContext,
    auction_id: u64,
    encrypted_amount: ConfidentialHandle,
    proof: InputProof,
) -> HandlerResult<bool> {
    check_sender(ctx)?;
    let auction = state
        .get_auction(auction_id)
        .ok_or(VaultError::NotFound(auction_id))?;

    lifecycle::check_accepts_bids(auction, ctx.timestamp)?;

    if !config.allow_creator_bids && auction.creator == ctx.sender {
        return Err(ValidationError::CreatorCannotBid.into());
    }

    compute
        .verify_input(&encrypted_amount, &proof, &config.contract_address, &ctx.sender)
        .map_err(|e| {
            warn!("Rejected bid proof for auction {}: {}", auction_id, e);
            ValidationError::BadProof
        })?;

    // Bind the handle to exactly (contract, bidder)
    for grantee in [&config.contract_address, &ctx.sender] {
        compute.allow(&encrypted_amount, grantee).map_err(|e| {
            warn!("Could not grant handle for auction {}: {}", auction_id, e);
            AccessError::Compute(e.to_string())
        })?;
    }

    let first_bid = state.bids.upsert(
        auction_id,
        ctx.sender,
        encrypted_amount,
        proof,
        ctx.timestamp,
    );
    if first_bid {
        state.users.record_participation(ctx.sender, auction_id);
    }

    info!(
        "Bid {} for auction {} by {}",
        if first_bid { "placed" } else { "replaced" },
        auction_id,
        hex::encode(ctx.sender)
    );
    Ok(first_bid)
}

/// Handle EndAuction call.
pub fn handle_end_auction(
    state: &mut VaultState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<()> {
    check_sender(ctx)?;
    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(VaultError::NotFound(auction_id))?;

    lifecycle::end(auction, ctx.timestamp)?;

    info!("Auction {} ended by {}", auction_id, hex::encode(ctx.sender));
    Ok(())
}

/// Handle FinalizeAuction call.
///
/// Under [`crate::DisclosurePolicy::CreatorAfterFinalize`] every bid handle
/// of the auction is also granted to the creator.
pub fn handle_finalize_auction<C: ConfidentialCompute>(
    state: &mut VaultState,
    compute: &mut C,
    config: &VaultGenesisConfig,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<()> {
    check_sender(ctx)?;
    let auction = state
        .get_auction(auction_id)
        .ok_or(VaultError::NotFound(auction_id))?;

    lifecycle::check_finalize(auction)?;

    if AccessGate::new(config.disclosure_policy).discloses_to_creator() {
        let creator = auction.creator;
        for bid in state.bids.auction_bids(auction_id) {
            // Handles were verified when stored; a refusal here is a compute-layer fault
            compute.allow(&bid.handle, &creator).map_err(|e| {
                warn!("Could not disclose bid in auction {}: {}", auction_id, e);
                AccessError::Compute(e.to_string())
            })?;
        }
    }

    let auction = state
        .get_auction_mut(auction_id)
        .ok_or(VaultError::NotFound(auction_id))?;
    lifecycle::finalize(auction)?;

    info!("Auction {} finalized by {}", auction_id, hex::encode(ctx.sender));
    Ok(())
}

fn check_sender(ctx: &CallContext) -> Result<(), ValidationError> {
    if ctx.sender == ZERO_ADDRESS {
        return Err(ValidationError::InvalidSender);
    }
    Ok(())
}

fn check_text_len(field: &'static str, text: &str, max: usize) -> Result<(), ValidationError> {
    if text.len() > max {
        return Err(ValidationError::TextTooLong {
            field,
            max,
            got: text.len(),
        });
    }
    Ok(())
}
