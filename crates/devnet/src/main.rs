//! Devnet host for local use of the confidential bid vault.
//!
//! This provides a JSON-RPC server that plays the execution substrate: it
//! owns one vault instance, orders every call through a single write lock,
//! keeps a simulated clock, and exposes the local coprocessor for encrypting
//! bids and decrypting them afterwards.

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cipherbid_compute::{ConfidentialCompute, LocalCoprocessor};
use cipherbid_module::{queries, AuctionVault, CallContext, VaultGenesisConfig};
use cipherbid_types::{Address, ConfidentialHandle, InputProof, ZERO_ADDRESS};

mod types;
use types::*;

/// Seconds the clock moves per simulated block.
const BLOCK_TIME_SECS: u64 = 12;

#[derive(Parser)]
#[command(name = "cipherbid-devnet")]
#[command(about = "Local JSON-RPC host for the confidential bid vault")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis config (JSON). Defaults are used when omitted.
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Hex-encoded 32-byte coprocessor secret, for reproducible handles
    #[arg(long)]
    coprocessor_secret: Option<String>,
}

/// Shared chain state.
struct ChainState {
    /// Vault instance
    vault: AuctionVault<LocalCoprocessor>,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new(vault: AuctionVault<LocalCoprocessor>) -> Self {
        let timestamp = vault.config().initial_timestamp;
        Self {
            vault,
            block_height: 0,
            timestamp,
        }
    }

    /// Height and timestamp of the next block.
    fn next_block(&self) -> Result<(u64, u64), ErrorObjectOwned> {
        let height = self
            .block_height
            .checked_add(1)
            .ok_or_else(|| DevnetServer::rpc_error("Block height overflow"))?;
        let timestamp = self
            .timestamp
            .checked_add(BLOCK_TIME_SECS)
            .ok_or_else(|| DevnetServer::rpc_error("Timestamp overflow"))?;
        Ok((height, timestamp))
    }

    fn advance_block(&mut self) -> Result<(), ErrorObjectOwned> {
        let next = self.next_block()?;
        self.commit(next);
        Ok(())
    }

    fn context(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
        }
    }

    /// Move to a block obtained from [`Self::next_block`].
    ///
    /// Calls reserve their block before touching the vault so a call never
    /// commits without one.
    fn commit(&mut self, (height, timestamp): (u64, u64)) {
        self.block_height = height;
        self.timestamp = timestamp;
    }

    fn block_info(&self) -> BlockInfo {
        BlockInfo {
            height: self.block_height,
            timestamp: self.timestamp,
        }
    }
}

/// RPC API definition for the devnet.
#[rpc(server)]
pub trait DevnetApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Move the clock forward by `seconds`.
    #[method(name = "admin_increaseTime")]
    async fn admin_increase_time(&self, seconds: u64) -> Result<BlockInfo, ErrorObjectOwned>;

    // ============ Vault Methods ============

    /// Create a new auction.
    #[method(name = "vault_createAuction")]
    async fn vault_create_auction(
        &self,
        params: CreateAuctionParams,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Place or replace a confidential bid.
    #[method(name = "vault_placeBid")]
    async fn vault_place_bid(&self, params: PlaceBidParams) -> Result<bool, ErrorObjectOwned>;

    /// End an auction whose deadline has passed.
    #[method(name = "vault_endAuction")]
    async fn vault_end_auction(&self, params: LifecycleParams) -> Result<bool, ErrorObjectOwned>;

    /// Finalize an ended auction.
    #[method(name = "vault_finalizeAuction")]
    async fn vault_finalize_auction(
        &self,
        params: LifecycleParams,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Compute Methods ============

    /// Encrypt a bid amount for the vault contract and a sender.
    #[method(name = "compute_encrypt")]
    async fn compute_encrypt(
        &self,
        params: EncryptParams,
    ) -> Result<EncryptedInputRpc, ErrorObjectOwned>;

    /// Decrypt a stored bid for an authorized requester.
    #[method(name = "compute_userDecrypt")]
    async fn compute_user_decrypt(
        &self,
        params: UserDecryptParams,
    ) -> Result<u64, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get the vault contract address.
    #[method(name = "chain_contractAddress")]
    async fn chain_contract_address(&self) -> Result<String, ErrorObjectOwned>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(&self, auction_id: u64) -> Result<AuctionRpc, ErrorObjectOwned>;

    /// Get a bidder's handle (all zeros if none).
    #[method(name = "query_getBid")]
    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<String, ErrorObjectOwned>;

    /// Get the number of auctions.
    #[method(name = "query_getAuctionCount")]
    async fn query_get_auction_count(&self) -> Result<u64, ErrorObjectOwned>;

    /// Get ids of auctions created by an identity.
    #[method(name = "query_getUserAuctions")]
    async fn query_get_user_auctions(&self, identity: String) -> Result<Vec<u64>, ErrorObjectOwned>;

    /// Get ids of auctions an identity has bid on.
    #[method(name = "query_getUserBids")]
    async fn query_get_user_bids(&self, identity: String) -> Result<Vec<u64>, ErrorObjectOwned>;

    /// Check whether an auction accepts bids at the current time.
    #[method(name = "query_isAuctionActive")]
    async fn query_is_auction_active(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned>;

    /// List auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// List auctions currently accepting bids.
    #[method(name = "query_getActiveAuctions")]
    async fn query_get_active_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// Ids of auctions past their end time that nobody has ended yet.
    #[method(name = "query_getPendingEnd")]
    async fn query_get_pending_end(&self) -> Result<Vec<u64>, ErrorObjectOwned>;
}

/// Implementation of the devnet RPC server.
struct DevnetServer {
    state: Arc<RwLock<ChainState>>,
}

impl DevnetServer {
    fn new(vault: AuctionVault<LocalCoprocessor>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new(vault))),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }
}

#[async_trait]
impl DevnetApiServer for DevnetServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block()?;
        Ok(state.block_info())
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        if timestamp < state.timestamp {
            return Err(Self::rpc_error("Timestamp cannot move backwards"));
        }
        state.timestamp = timestamp;
        info!("Timestamp set to {}", timestamp);
        Ok(state.block_info())
    }

    async fn admin_increase_time(&self, seconds: u64) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.timestamp = state
            .timestamp
            .checked_add(seconds)
            .ok_or_else(|| Self::rpc_error("Timestamp overflow"))?;
        info!("Time increased by {}s to {}", seconds, state.timestamp);
        Ok(state.block_info())
    }

    async fn vault_create_auction(
        &self,
        params: CreateAuctionParams,
    ) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_caller(&params.sender)?);
        let next = state.next_block()?;

        let auction_id = state
            .vault
            .create_auction(
                &ctx,
                params.title,
                params.description,
                params.starting_bid,
                params.duration_hours,
            )
            .map_err(|e| Self::rpc_error(&format!("Failed to create auction: {}", e)))?;
        state.commit(next);

        Ok(auction_id)
    }

    async fn vault_place_bid(&self, params: PlaceBidParams) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_caller(&params.sender)?);
        let next = state.next_block()?;

        let handle = ConfidentialHandle(
            hex::decode(params.handle.trim_start_matches("0x"))
                .map_err(|e| Self::rpc_error(&format!("Invalid handle: {}", e)))?
                .try_into()
                .map_err(|_| Self::rpc_error("Handle must be 32 bytes"))?,
        );
        let proof = InputProof(
            hex::decode(params.proof.trim_start_matches("0x"))
                .map_err(|e| Self::rpc_error(&format!("Invalid proof: {}", e)))?,
        );

        let first_bid = state
            .vault
            .place_bid(&ctx, params.auction_id, handle, proof)
            .map_err(|e| Self::rpc_error(&format!("Failed to place bid: {}", e)))?;
        state.commit(next);

        Ok(first_bid)
    }

    async fn vault_end_auction(&self, params: LifecycleParams) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_caller(&params.sender)?);
        let next = state.next_block()?;

        state
            .vault
            .end_auction(&ctx, params.auction_id)
            .map_err(|e| Self::rpc_error(&format!("Failed to end auction: {}", e)))?;
        state.commit(next);

        Ok(true)
    }

    async fn vault_finalize_auction(
        &self,
        params: LifecycleParams,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        let ctx = state.context(parse_caller(&params.sender)?);
        let next = state.next_block()?;

        state
            .vault
            .finalize_auction(&ctx, params.auction_id)
            .map_err(|e| Self::rpc_error(&format!("Failed to finalize auction: {}", e)))?;
        state.commit(next);

        Ok(true)
    }

    async fn compute_encrypt(
        &self,
        params: EncryptParams,
    ) -> Result<EncryptedInputRpc, ErrorObjectOwned> {
        let sender = parse_caller(&params.sender)?;
        let mut state = self.state.write();
        let contract = *state.vault.contract_address();

        let input = state
            .vault
            .compute_mut()
            .encrypt_u64(params.value, &contract, &sender)
            .map_err(|e| Self::rpc_error(&format!("Encryption failed: {}", e)))?;

        Ok(EncryptedInputRpc {
            handle: hex::encode(input.handle.0),
            proof: hex::encode(input.proof.as_bytes()),
        })
    }

    async fn compute_user_decrypt(
        &self,
        params: UserDecryptParams,
    ) -> Result<u64, ErrorObjectOwned> {
        let requester = parse_caller(&params.requester)?;
        let bidder = parse_address(&params.bidder)?;
        let state = self.state.read();

        state
            .vault
            .decrypt_bid(params.auction_id, &bidder, &requester)
            .map_err(|e| Self::rpc_error(&format!("Decryption refused: {}", e)))
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.state.read().block_info())
    }

    async fn chain_contract_address(&self) -> Result<String, ErrorObjectOwned> {
        Ok(hex::encode(self.state.read().vault.contract_address()))
    }

    async fn query_get_auction(&self, auction_id: u64) -> Result<AuctionRpc, ErrorObjectOwned> {
        let state = self.state.read();
        state
            .vault
            .get_auction(auction_id)
            .map(AuctionRpc::from)
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<String, ErrorObjectOwned> {
        let bidder = parse_address(&bidder)?;
        let state = self.state.read();
        Ok(hex::encode(state.vault.get_bid(auction_id, &bidder).0))
    }

    async fn query_get_auction_count(&self) -> Result<u64, ErrorObjectOwned> {
        Ok(self.state.read().vault.get_auction_count())
    }

    async fn query_get_user_auctions(
        &self,
        identity: String,
    ) -> Result<Vec<u64>, ErrorObjectOwned> {
        let identity = parse_address(&identity)?;
        Ok(self.state.read().vault.get_user_auctions(&identity))
    }

    async fn query_get_user_bids(&self, identity: String) -> Result<Vec<u64>, ErrorObjectOwned> {
        let identity = parse_address(&identity)?;
        Ok(self.state.read().vault.get_user_bids(&identity))
    }

    async fn query_is_auction_active(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned> {
        let state = self.state.read();
        state
            .vault
            .is_auction_active(auction_id, state.timestamp)
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_auction_summaries(
            state.vault.state(),
            offset as usize,
            limit as usize,
            state.timestamp,
        )
        .into_iter()
        .map(AuctionSummaryRpc::from)
        .collect())
    }

    async fn query_get_active_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_active_auctions(state.vault.state(), state.timestamp)
            .into_iter()
            .map(AuctionSummaryRpc::from)
            .collect())
    }

    async fn query_get_pending_end(&self) -> Result<Vec<u64>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_pending_end(state.vault.state(), state.timestamp))
    }
}

/// Parse a hex address of exactly 32 bytes.
fn parse_address(s: &str) -> Result<Address, ErrorObjectOwned> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| DevnetServer::rpc_error(&format!("Invalid address hex: {}", e)))?
        .try_into()
        .map_err(|_| DevnetServer::rpc_error("Address must be 32 bytes"))
}

/// Parse the address of a caller. The zero address never signs a call.
fn parse_caller(s: &str) -> Result<Address, ErrorObjectOwned> {
    let addr = parse_address(s)?;
    if addr == ZERO_ADDRESS {
        return Err(DevnetServer::rpc_error("Caller cannot be the zero address"));
    }
    Ok(addr)
}

fn load_genesis(path: Option<&PathBuf>) -> Result<VaultGenesisConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read genesis file {}", path.display()))?;
            serde_json::from_str(&raw).context("Invalid genesis config")
        }
        None => Ok(VaultGenesisConfig::default()),
    }
}

fn build_coprocessor(secret: Option<&str>) -> Result<LocalCoprocessor> {
    let coprocessor = match secret {
        Some(secret) => {
            let bytes: [u8; 32] = hex::decode(secret.trim_start_matches("0x"))?
                .try_into()
                .map_err(|_| anyhow::anyhow!("Coprocessor secret must be 32 bytes"))?;
            LocalCoprocessor::from_secret(&bytes)?
        }
        None => LocalCoprocessor::new(&mut OsRng)?,
    };
    Ok(coprocessor)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cipherbid_devnet=info".parse()?)
                .add_directive("cipherbid_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let genesis = load_genesis(cli.genesis.as_ref())?;
    let coprocessor = build_coprocessor(cli.coprocessor_secret.as_deref())?;
    let vault = AuctionVault::new(genesis, coprocessor)?;

    info!(
        "Vault deployed at {}",
        hex::encode(vault.contract_address())
    );
    info!("Starting devnet server on {}", cli.listen);

    let server = Server::builder().build(cli.listen).await?;
    let handle = server.start(DevnetServer::new(vault).into_rpc());

    info!("Devnet server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
