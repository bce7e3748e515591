//! Vault module error types.

use thiserror::Error;

/// Malformed or out-of-range inputs. Rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Sender cannot be the zero address")]
    InvalidSender,

    #[error("Starting bid must be greater than zero")]
    InvalidAmount,

    #[error("Duration must be greater than zero and end before the clock overflows")]
    InvalidDuration,

    #[error("Input proof rejected by the compute layer")]
    BadProof,

    #[error("Creator cannot bid on their own auction")]
    CreatorCannotBid,

    #[error("{field} too long: max {max}, got {got}")]
    TextTooLong {
        field: &'static str,
        max: usize,
        got: usize,
    },
}

/// Operation not legal in the auction's current lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Auction is not accepting bids")]
    NotActive,

    #[error("Auction end time has not passed")]
    TooEarly,

    #[error("Auction already ended")]
    AlreadyEnded,

    #[error("Auction has not ended")]
    NotEnded,

    #[error("Auction already finalized")]
    AlreadyFinalized,
}

/// Decryption request refused by the access gate, or a grant the compute
/// layer would not record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("No bid stored for this bidder")]
    NoBid,

    #[error("Requester does not own this bid")]
    NotBidOwner,

    #[error("Compute layer refused the request: {0}")]
    Compute(String),
}

/// Errors that can occur in the vault module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Auction not found: {0}")]
    NotFound(u64),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Access(#[from] AccessError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families_convert() {
        let err: VaultError = LifecycleError::TooEarly.into();
        assert_eq!(err, VaultError::Lifecycle(LifecycleError::TooEarly));

        let err: VaultError = ValidationError::BadProof.into();
        assert!(matches!(err, VaultError::Validation(ValidationError::BadProof)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(VaultError::NotFound(7).to_string(), "Auction not found: 7");
        assert_eq!(
            VaultError::from(ValidationError::TextTooLong {
                field: "title",
                max: 4,
                got: 5
            })
            .to_string(),
            "title too long: max 4, got 5"
        );
    }
}
