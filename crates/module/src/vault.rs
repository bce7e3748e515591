//! The vault facade.
//!
//! [`AuctionVault`] owns the module state, the genesis settings and the
//! compute layer handle, and serves every call and read. Mutations take
//! `&mut self`; the host is responsible for ordering them.

use cipherbid_compute::ConfidentialCompute;
use cipherbid_types::{Address, AuctionView, ConfidentialHandle, InputProof};
use tracing::debug;

use crate::access::AccessGate;
use crate::call::{CallOutcome, VaultCall};
use crate::error::{AccessError, VaultError};
use crate::genesis::{GenesisValidationError, VaultGenesisConfig};
use crate::handlers::{self, CallContext, HandlerResult};
use crate::queries::{self, VaultQuery, VaultQueryResponse};
use crate::state::VaultState;

/// A deployed vault instance.
pub struct AuctionVault<C> {
    state: VaultState,
    config: VaultGenesisConfig,
    gate: AccessGate,
    compute: C,
}

impl<C: ConfidentialCompute> AuctionVault<C> {
    /// Deploy a vault with empty state.
    pub fn new(config: VaultGenesisConfig, compute: C) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        Ok(Self {
            state: VaultState::new(),
            gate: AccessGate::new(config.disclosure_policy),
            config,
            compute,
        })
    }

    pub fn contract_address(&self) -> &Address {
        &self.config.contract_address
    }

    pub fn config(&self) -> &VaultGenesisConfig {
        &self.config
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn compute(&self) -> &C {
        &self.compute
    }

    /// Mutable access to the compute layer, e.g. to encrypt inputs locally.
    pub fn compute_mut(&mut self) -> &mut C {
        &mut self.compute
    }

    // === Calls ===

    pub fn create_auction(
        &mut self,
        ctx: &CallContext,
        title: impl Into<String>,
        description: impl Into<String>,
        starting_bid: u64,
        duration_hours: u32,
    ) -> HandlerResult<u64> {
        handlers::handle_create_auction(
            &mut self.state,
            &self.config,
            ctx,
            title.into(),
            description.into(),
            starting_bid,
            duration_hours,
        )
    }

    /// Place or replace the sender's bid. Returns `true` on a first bid.
    pub fn place_bid(
        &mut self,
        ctx: &CallContext,
        auction_id: u64,
        encrypted_amount: ConfidentialHandle,
        proof: InputProof,
    ) -> HandlerResult<bool> {
        handlers::handle_place_bid(
            &mut self.state,
            &mut self.compute,
            &self.config,
            ctx,
            auction_id,
            encrypted_amount,
            proof,
        )
    }

    pub fn end_auction(&mut self, ctx: &CallContext, auction_id: u64) -> HandlerResult<()> {
        handlers::handle_end_auction(&mut self.state, ctx, auction_id)
    }

    pub fn finalize_auction(&mut self, ctx: &CallContext, auction_id: u64) -> HandlerResult<()> {
        handlers::handle_finalize_auction(
            &mut self.state,
            &mut self.compute,
            &self.config,
            ctx,
            auction_id,
        )
    }

    /// Execute a call message.
    pub fn dispatch(&mut self, ctx: &CallContext, call: VaultCall) -> HandlerResult<CallOutcome> {
        match call {
            VaultCall::CreateAuction {
                title,
                description,
                starting_bid,
                duration_hours,
            } => self
                .create_auction(ctx, title, description, starting_bid, duration_hours)
                .map(CallOutcome::AuctionCreated),

            VaultCall::PlaceBid {
                auction_id,
                encrypted_amount,
                proof,
            } => self
                .place_bid(ctx, auction_id, encrypted_amount, proof)
                .map(|first_bid| CallOutcome::BidPlaced {
                    auction_id,
                    first_bid,
                }),

            VaultCall::EndAuction { auction_id } => self
                .end_auction(ctx, auction_id)
                .map(|_| CallOutcome::AuctionEnded(auction_id)),

            VaultCall::FinalizeAuction { auction_id } => self
                .finalize_auction(ctx, auction_id)
                .map(|_| CallOutcome::AuctionFinalized(auction_id)),
        }
    }

    // === Reads ===

    pub fn get_auction(&self, auction_id: u64) -> HandlerResult<AuctionView> {
        self.state
            .get_auction(auction_id)
            .map(AuctionView::from)
            .ok_or(VaultError::NotFound(auction_id))
    }

    /// Stored handle, or [`ConfidentialHandle::EMPTY`] if none.
    pub fn get_bid(&self, auction_id: u64, bidder: &Address) -> ConfidentialHandle {
        self.state.bids.handle_of(auction_id, bidder)
    }

    pub fn get_auction_count(&self) -> u64 {
        self.state.registry.count()
    }

    pub fn get_user_auctions(&self, identity: &Address) -> Vec<u64> {
        self.state.users.created_by(identity).to_vec()
    }

    pub fn get_user_bids(&self, identity: &Address) -> Vec<u64> {
        self.state.users.participated_in(identity).to_vec()
    }

    pub fn is_auction_active(&self, auction_id: u64, now: u64) -> HandlerResult<bool> {
        self.state
            .get_auction(auction_id)
            .map(|auction| auction.is_active_at(now))
            .ok_or(VaultError::NotFound(auction_id))
    }

    pub fn query(&self, query: VaultQuery, now: u64) -> VaultQueryResponse {
        queries::handle_query(&self.state, query, now)
    }

    // === Decryption ===

    /// Decrypt `bidder`'s bid on behalf of `requester`.
    ///
    /// The access gate is checked first; the compute layer then applies its
    /// own ACL to the vault contract and the requester.
    pub fn decrypt_bid(
        &self,
        auction_id: u64,
        bidder: &Address,
        requester: &Address,
    ) -> HandlerResult<u64> {
        let handle = self
            .gate
            .authorize(&self.state, auction_id, bidder, requester)?;

        debug!("Forwarding decryption of auction {} bid", auction_id);
        self.compute
            .user_decrypt(&handle, &self.config.contract_address, requester)
            .map_err(|e| AccessError::Compute(e.to_string()).into())
    }
}
