//! Confidential bid vault module.
//!
//! This module implements the ledger-side logic of a sealed-bid auction
//! whose bid amounts are only ever held as opaque confidential handles:
//!
//! - Auction creation with sequential ids and a fixed bidding window
//! - One confidential bid slot per (auction, bidder), overwritten on rebid
//! - Lifecycle transitions `Active -> Ended -> Finalized`
//! - Per-identity indices of created and bid-on auctions
//! - An access gate for decryption requests
//!
//! # Architecture
//!
//! The module follows Sovereign SDK patterns:
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Registry, bid store and user index
//! - `lifecycle`: Transition rules
//! - `access`: Decryption authorization
//! - `genesis`: Deployment configuration
//! - `vault`: Facade composing all of the above
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use cipherbid_module::{AuctionVault, CallContext, VaultGenesisConfig};
//!
//! let mut vault = AuctionVault::new(VaultGenesisConfig::default(), coprocessor)?;
//! let ctx = CallContext { ... };
//!
//! // Create an auction
//! let auction_id = vault.create_auction(&ctx, "Title", "Description", 100, 24)?;
//!
//! // Submit a bid
//! vault.place_bid(&ctx, auction_id, input.handle, input.proof)?;
//! ```

pub mod access;
pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod lifecycle;
pub mod queries;
pub mod state;
pub mod vault;

pub use access::{AccessGate, DisclosurePolicy};
pub use call::{CallOutcome, VaultCall};
pub use error::{AccessError, LifecycleError, ValidationError, VaultError};
pub use genesis::{GenesisValidationError, VaultGenesisConfig, VaultLimits};
pub use handlers::{CallContext, HandlerResult};
pub use queries::{AuctionStatus, AuctionSummary, VaultQuery, VaultQueryResponse};
pub use state::VaultState;
pub use vault::AuctionVault;
