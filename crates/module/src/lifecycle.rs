//! Auction lifecycle state machine.
//!
//! `Active -> Ended -> Finalized`. Each transition is split into a pure
//! check and an apply step so handlers can validate everything before they
//! touch state.

use cipherbid_types::{Auction, LifecycleState};

use crate::error::LifecycleError;

/// Check that `auction` accepts a bid at `now`.
pub fn check_accepts_bids(auction: &Auction, now: u64) -> Result<(), LifecycleError> {
    if auction.is_active_at(now) {
        Ok(())
    } else {
        Err(LifecycleError::NotActive)
    }
}

/// Check that `auction` may be ended at `now`.
pub fn check_end(auction: &Auction, now: u64) -> Result<(), LifecycleError> {
    if auction.ended() {
        return Err(LifecycleError::AlreadyEnded);
    }
    if now < auction.end_time {
        return Err(LifecycleError::TooEarly);
    }
    Ok(())
}

/// Check that `auction` may be finalized.
pub fn check_finalize(auction: &Auction) -> Result<(), LifecycleError> {
    match auction.state {
        LifecycleState::Active => Err(LifecycleError::NotEnded),
        LifecycleState::Ended => Ok(()),
        LifecycleState::Finalized => Err(LifecycleError::AlreadyFinalized),
    }
}

/// Move `auction` to `Ended`.
pub fn end(auction: &mut Auction, now: u64) -> Result<(), LifecycleError> {
    check_end(auction, now)?;
    auction.state = LifecycleState::Ended;
    Ok(())
}

/// Move `auction` to `Finalized`.
pub fn finalize(auction: &mut Auction) -> Result<(), LifecycleError> {
    check_finalize(auction)?;
    auction.state = LifecycleState::Finalized;
    Ok(())
}
