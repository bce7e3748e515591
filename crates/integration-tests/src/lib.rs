//! End-to-end integration tests for the confidential bid vault.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Vault deployment from a genesis config
//! 2. Auction creation
//! 3. Bid encryption and submission
//! 4. Ending and finalization
//! 5. Decryption through the access gate

use borsh::to_vec;
use rand::rngs::OsRng;

use cipherbid_compute::{ConfidentialCompute, EncryptedInput, LocalCoprocessor};
use cipherbid_module::{
    AccessError, AuctionVault, CallContext, DisclosurePolicy, LifecycleError, ValidationError,
    VaultCall, VaultError, VaultGenesisConfig, VaultQuery, VaultQueryResponse,
};
use cipherbid_types::{Address, ConfidentialHandle, InputProof, SECONDS_PER_HOUR, ZERO_ADDRESS};

const CREATOR: Address = [0xA1; 32];
const BIDDER_B: Address = [0xB2; 32];
const BIDDER_C: Address = [0xC3; 32];
const OUTSIDER: Address = [0xD4; 32];

type Vault = AuctionVault<LocalCoprocessor>;

/// Test the complete auction flow with the local coprocessor.
#[test]
fn test_full_auction_flow() {
    // ========================================
    // Phase 1: Deploy the vault
    // ========================================

    let mut vault = deploy(VaultGenesisConfig::default());
    println!("Vault deployed at {}", hex::encode(vault.contract_address()));

    // ========================================
    // Phase 2: Create auction
    // ========================================

    let t0 = 1_700_000_000u64;
    let auction_id = vault
        .create_auction(&ctx(CREATOR, t0), "Vintage camera", "Boxed, working", 100, 24)
        .expect("Failed to create auction");
    assert_eq!(auction_id, 1);

    let auction = vault.get_auction(auction_id).unwrap();
    assert_eq!(auction.end_time, t0 + 24 * SECONDS_PER_HOUR);
    assert_eq!(auction.creator, CREATOR);
    assert!(!auction.ended);
    assert!(!auction.finalized);
    assert_eq!(vault.is_auction_active(auction_id, t0 + 1), Ok(true));

    println!("Auction {} created", auction_id);

    // ========================================
    // Phase 3: Bidders submit encrypted bids
    // ========================================

    let input_b = encrypt(&mut vault, 150, &BIDDER_B);
    let first = vault
        .place_bid(&ctx(BIDDER_B, t0 + 60), auction_id, input_b.handle, input_b.proof.clone())
        .expect("Failed to place bid B");
    assert!(first);

    let input_c = encrypt(&mut vault, 300, &BIDDER_C);
    vault
        .place_bid(&ctx(BIDDER_C, t0 + 120), auction_id, input_c.handle, input_c.proof.clone())
        .expect("Failed to place bid C");

    assert_eq!(vault.get_bid(auction_id, &BIDDER_B), input_b.handle);
    assert_eq!(vault.get_bid(auction_id, &BIDDER_C), input_c.handle);
    assert_eq!(vault.get_user_bids(&BIDDER_C), vec![auction_id]);
    assert!(vault.get_bid(auction_id, &OUTSIDER).is_empty());

    // The coprocessor holds grants for the contract and each bidder
    let contract = *vault.contract_address();
    assert!(vault.compute().is_allowed(&input_b.handle, &contract));
    assert!(vault.compute().is_allowed(&input_b.handle, &BIDDER_B));
    assert!(!vault.compute().is_allowed(&input_b.handle, &BIDDER_C));

    println!("2 bids submitted");

    // ========================================
    // Phase 4: End and finalize
    // ========================================

    let end = t0 + 24 * SECONDS_PER_HOUR;
    assert_eq!(
        vault.end_auction(&ctx(OUTSIDER, end - 1), auction_id),
        Err(VaultError::Lifecycle(LifecycleError::TooEarly))
    );
    assert_eq!(vault.is_auction_active(auction_id, end), Ok(false));

    vault
        .end_auction(&ctx(OUTSIDER, end), auction_id)
        .expect("Failed to end auction");
    vault
        .finalize_auction(&ctx(OUTSIDER, end + 1), auction_id)
        .expect("Failed to finalize auction");

    let auction = vault.get_auction(auction_id).unwrap();
    assert!(auction.ended);
    assert!(auction.finalized);
    assert_eq!(vault.get_user_auctions(&CREATOR), vec![auction_id]);

    println!("Auction {} finalized", auction_id);

    // ========================================
    // Phase 5: Decryption
    // ========================================

    assert_eq!(vault.decrypt_bid(auction_id, &BIDDER_B, &BIDDER_B), Ok(150));
    assert_eq!(vault.decrypt_bid(auction_id, &BIDDER_C, &BIDDER_C), Ok(300));
    assert_eq!(
        vault.decrypt_bid(auction_id, &BIDDER_C, &CREATOR),
        Err(VaultError::Access(AccessError::NotBidOwner))
    );

    println!("Bids decrypted by their owners only");
}

/// Auction count always equals the number of ids handed out, and ids are
/// 1..=count with no gaps.
#[test]
fn test_sequential_ids_and_count() {
    let mut vault = deploy(VaultGenesisConfig::default());

    for expected in 1..=5u64 {
        let id = vault
            .create_auction(&ctx(CREATOR, expected), format!("Lot {}", expected), "", 10, 1)
            .unwrap();
        assert_eq!(id, expected);

        // A rejected create never consumes an id
        let rejected = vault.create_auction(&ctx(CREATOR, expected), "Bad", "", 0, 1);
        assert_eq!(rejected, Err(VaultError::Validation(ValidationError::InvalidAmount)));
    }

    assert_eq!(vault.get_auction_count(), 5);
    for id in 1..=5 {
        assert_eq!(vault.get_auction(id).unwrap().id, id);
    }
    assert_eq!(vault.get_auction(0), Err(VaultError::NotFound(0)));
    assert_eq!(vault.get_auction(6), Err(VaultError::NotFound(6)));
    assert_eq!(vault.get_user_auctions(&CREATOR), vec![1, 2, 3, 4, 5]);
}

/// Rebidding replaces the stored handle without touching the participation list.
#[test]
fn test_rebid_overwrites_slot() {
    let mut vault = deploy(VaultGenesisConfig::default());
    vault.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 2).unwrap();

    let first = encrypt(&mut vault, 50, &BIDDER_B);
    assert_eq!(
        vault.place_bid(&ctx(BIDDER_B, 10), 1, first.handle, first.proof),
        Ok(true)
    );

    let second = encrypt(&mut vault, 75, &BIDDER_B);
    assert_eq!(
        vault.place_bid(&ctx(BIDDER_B, 20), 1, second.handle, second.proof),
        Ok(false)
    );

    assert_eq!(vault.get_bid(1, &BIDDER_B), second.handle);
    assert_eq!(vault.get_user_bids(&BIDDER_B), vec![1]);
    assert_eq!(
        vault.query(VaultQuery::GetAuctionBidders { auction_id: 1 }, 20),
        VaultQueryResponse::Bidders(vec![BIDDER_B])
    );
    assert_eq!(vault.decrypt_bid(1, &BIDDER_B, &BIDDER_B), Ok(75));
}

/// Every rejected call leaves the serialized state byte-for-byte unchanged.
#[test]
fn test_failed_calls_leave_state_unchanged() {
    let mut vault = deploy(VaultGenesisConfig::default());
    vault.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 1).unwrap();
    let input = encrypt(&mut vault, 40, &BIDDER_B);
    vault
        .place_bid(&ctx(BIDDER_B, 5), 1, input.handle, input.proof)
        .unwrap();

    let snapshot = to_vec(vault.state()).unwrap();

    // Proof bound to another caller
    let stolen = encrypt(&mut vault, 99, &BIDDER_C);
    let place = |auction_id, encrypted_amount, proof: &InputProof| VaultCall::PlaceBid {
        auction_id,
        encrypted_amount,
        proof: proof.clone(),
    };
    let create = |title: String, duration_hours| VaultCall::CreateAuction {
        title,
        description: String::new(),
        starting_bid: 10,
        duration_hours,
    };
    let junk = ConfidentialHandle([7u8; 32]);

    let failures = vec![
        (OUTSIDER, 6, place(1, stolen.handle, &stolen.proof)),
        (BIDDER_C, 6, place(2, stolen.handle, &stolen.proof)),
        (BIDDER_C, 6, place(1, junk, &InputProof(vec![1, 2, 3]))),
        (OUTSIDER, 6, VaultCall::EndAuction { auction_id: 1 }),
        (OUTSIDER, 6, VaultCall::FinalizeAuction { auction_id: 1 }),
        (OUTSIDER, 6, VaultCall::EndAuction { auction_id: 9 }),
        (CREATOR, 6, create("x".into(), 0)),
        (CREATOR, 6, create("x".repeat(1_000), 1)),
        (ZERO_ADDRESS, 6, create("x".into(), 1)),
        (BIDDER_C, SECONDS_PER_HOUR, place(1, stolen.handle, &stolen.proof)),
    ];

    for (sender, at, call) in failures {
        let result = vault.dispatch(&ctx(sender, at), call.clone());
        assert!(result.is_err(), "call unexpectedly succeeded: {:?}", call);
        assert_eq!(to_vec(vault.state()).unwrap(), snapshot);
    }

    // A second end after a successful one is rejected the same way
    vault.end_auction(&ctx(OUTSIDER, SECONDS_PER_HOUR), 1).unwrap();
    let ended = to_vec(vault.state()).unwrap();
    assert_eq!(
        vault.end_auction(&ctx(OUTSIDER, SECONDS_PER_HOUR), 1),
        Err(VaultError::Lifecycle(LifecycleError::AlreadyEnded))
    );
    assert_eq!(to_vec(vault.state()).unwrap(), ended);
}

/// Creator self-bidding follows the genesis switch.
#[test]
fn test_creator_bid_policy() {
    let mut open = deploy(VaultGenesisConfig::default());
    open.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 1).unwrap();
    let input = encrypt(&mut open, 20, &CREATOR);
    assert_eq!(
        open.place_bid(&ctx(CREATOR, 1), 1, input.handle, input.proof),
        Ok(true)
    );
    assert_eq!(open.get_user_bids(&CREATOR), vec![1]);

    let mut config = VaultGenesisConfig::default();
    config.allow_creator_bids = false;
    let mut closed = deploy(config);
    closed.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 1).unwrap();
    let input = encrypt(&mut closed, 20, &CREATOR);
    assert_eq!(
        closed.place_bid(&ctx(CREATOR, 1), 1, input.handle, input.proof),
        Err(VaultError::Validation(ValidationError::CreatorCannotBid))
    );
    assert!(closed.get_user_bids(&CREATOR).is_empty());
}

/// Under `CreatorAfterFinalize` the creator learns bids only once finalized.
#[test]
fn test_creator_disclosure_after_finalize() {
    let mut config = VaultGenesisConfig::default();
    config.disclosure_policy = DisclosurePolicy::CreatorAfterFinalize;
    let mut vault = deploy(config);

    vault.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 1).unwrap();
    let input = encrypt(&mut vault, 500, &BIDDER_B);
    vault
        .place_bid(&ctx(BIDDER_B, 1), 1, input.handle, input.proof)
        .unwrap();

    assert!(vault.decrypt_bid(1, &BIDDER_B, &CREATOR).is_err());

    vault.end_auction(&ctx(BIDDER_B, SECONDS_PER_HOUR), 1).unwrap();
    assert!(vault.decrypt_bid(1, &BIDDER_B, &CREATOR).is_err());

    vault.finalize_auction(&ctx(BIDDER_B, SECONDS_PER_HOUR), 1).unwrap();
    assert_eq!(vault.decrypt_bid(1, &BIDDER_B, &CREATOR), Ok(500));
    assert!(vault.decrypt_bid(1, &BIDDER_B, &OUTSIDER).is_err());
}

/// A vault with a random coprocessor secret still round-trips its own inputs.
#[test]
fn test_random_coprocessor() {
    let coprocessor = LocalCoprocessor::new(&mut OsRng).unwrap();
    let mut vault = AuctionVault::new(VaultGenesisConfig::default(), coprocessor).unwrap();

    vault.create_auction(&ctx(CREATOR, 0), "Lot", "", 10, 1).unwrap();
    let input = encrypt(&mut vault, 12_345, &BIDDER_C);
    vault
        .place_bid(&ctx(BIDDER_C, 1), 1, input.handle, input.proof)
        .unwrap();

    assert_eq!(vault.decrypt_bid(1, &BIDDER_C, &BIDDER_C), Ok(12_345));
}

// ============ Helpers ============

fn deploy(config: VaultGenesisConfig) -> Vault {
    let coprocessor = LocalCoprocessor::from_secret(&[42u8; 32]).unwrap();
    AuctionVault::new(config, coprocessor).expect("Failed to deploy vault")
}

fn ctx(sender: Address, timestamp: u64) -> CallContext {
    CallContext {
        sender,
        block_height: timestamp / 12,
        timestamp,
    }
}

fn encrypt(vault: &mut Vault, amount: u64, bidder: &Address) -> EncryptedInput {
    let contract = *vault.contract_address();
    vault
        .compute_mut()
        .encrypt_u64(amount, &contract, bidder)
        .expect("Failed to encrypt bid")
}
