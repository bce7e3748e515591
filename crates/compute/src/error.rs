//! Error types for confidential-compute operations.

use thiserror::Error;

/// Errors that can occur in the compute layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("Unknown handle")]
    UnknownHandle,

    #[error("Input proof does not match handle, contract and caller")]
    InvalidProof,

    #[error("Address is not allowed to decrypt this handle")]
    Unauthorized,

    #[error("Contract is not allowed to use this handle")]
    ContractNotAllowed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Key derivation failed")]
    KeyDerivationFailed,

    #[error("Invalid plaintext length: expected 8, got {0}")]
    InvalidPlaintext(usize),
}
