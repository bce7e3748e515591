//! Confidential-compute interface consumed by the bid vault.
//!
//! The vault never sees cleartext amounts. It relies on a compute layer that
//! can:
//!
//! 1. **Encrypt**: turn a cleartext `u64` into an opaque handle plus an input
//!    proof bound to a (contract, caller) pair.
//! 2. **Verify**: check that a handle/proof pair was formed for the contract
//!    and caller presenting it.
//! 3. **Grant**: record that an address may use a handle.
//! 4. **Decrypt**: return the cleartext to a requester, provided both the
//!    contract and the requester were granted the handle.
//!
//! [`LocalCoprocessor`] is an in-process implementation of this contract used
//! by tests and the devnet host.

pub mod acl;
pub mod coprocessor;
pub mod error;

pub use acl::Acl;
pub use coprocessor::LocalCoprocessor;
pub use error::ComputeError;

use cipherbid_types::{Address, ConfidentialHandle, InputProof};

/// An encrypted input ready to be submitted with a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: ConfidentialHandle,
    pub proof: InputProof,
}

/// Narrow interface to the confidential-compute layer.
pub trait ConfidentialCompute {
    /// Encrypt `value` for use by `caller` against `contract`.
    fn encrypt_u64(
        &mut self,
        value: u64,
        contract: &Address,
        caller: &Address,
    ) -> Result<EncryptedInput, ComputeError>;

    /// Check that `proof` authorizes `handle` for `(contract, caller)`.
    ///
    /// Must not change any state.
    fn verify_input(
        &self,
        handle: &ConfidentialHandle,
        proof: &InputProof,
        contract: &Address,
        caller: &Address,
    ) -> Result<(), ComputeError>;

    /// Grant `address` the right to use `handle`.
    fn allow(&mut self, handle: &ConfidentialHandle, address: &Address) -> Result<(), ComputeError>;

    /// Whether `address` has been granted `handle`.
    fn is_allowed(&self, handle: &ConfidentialHandle, address: &Address) -> bool;

    /// Decrypt `handle` on behalf of `requester` through `contract`.
    fn user_decrypt(
        &self,
        handle: &ConfidentialHandle,
        contract: &Address,
        requester: &Address,
    ) -> Result<u64, ComputeError>;
}
