//! In-process confidential coprocessor.
//!
//! Values are sealed with AES-256-GCM under a key derived from a master
//! secret. Each sealed value is bound to the (contract, caller) pair it was
//! encrypted for, both through the AEAD associated data and through the
//! input proof.
//!
//! # Encryption
//!
//! To encrypt `v` for `(contract, caller)`:
//! 1. Take the next nonce from a monotonic counter
//! 2. Seal `v` (8 bytes, little-endian) with AAD = contract || caller
//! 3. handle = H("HANDLE" || nonce || ciphertext || contract || caller)
//! 4. proof = H(proof_key || "PROOF" || handle || contract || caller)
//!
//! # Decryption
//!
//! Both the contract and the requester must hold a grant on the handle.

use std::collections::HashMap;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use cipherbid_types::{Address, ConfidentialHandle, InputProof};

use crate::acl::Acl;
use crate::error::ComputeError;
use crate::{ConfidentialCompute, EncryptedInput};

const KDF_SALT: &[u8] = b"CIPHERBID_COPROCESSOR_V1";
const HANDLE_DOMAIN: &[u8] = b"CIPHERBID_HANDLE_V1:";
const PROOF_DOMAIN: &[u8] = b"CIPHERBID_PROOF_V1:";

/// A sealed value and the binding it was created under.
#[derive(Debug, Clone)]
struct SealedValue {
    nonce: [u8; 12],
    /// Ciphertext with the GCM tag appended
    ciphertext: Vec<u8>,
    contract: Address,
    caller: Address,
}

/// Local implementation of [`ConfidentialCompute`].
pub struct LocalCoprocessor {
    seal_key: [u8; 32],
    proof_key: [u8; 32],
    next_nonce: u64,
    values: HashMap<ConfidentialHandle, SealedValue>,
    acl: Acl,
}

impl LocalCoprocessor {
    /// Create a coprocessor with a fresh random master secret.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, ComputeError> {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        Self::from_secret(&secret)
    }

    /// Create a coprocessor from a fixed master secret.
    pub fn from_secret(secret: &[u8; 32]) -> Result<Self, ComputeError> {
        Ok(Self {
            seal_key: derive_key(secret, b"seal")?,
            proof_key: derive_key(secret, b"proof")?,
            next_nonce: 0,
            values: HashMap::new(),
            acl: Acl::new(),
        })
    }

    fn allocate_nonce(&mut self) -> [u8; 12] {
        let counter = self.next_nonce;
        self.next_nonce += 1;
        let mut nonce = [0u8; 12];
        nonce[..8].copy_from_slice(&counter.to_le_bytes());
        nonce
    }

    fn cipher(&self) -> Result<Aes256Gcm, ComputeError> {
        Aes256Gcm::new_from_slice(&self.seal_key).map_err(|e| {
            ComputeError::EncryptionFailed(format!("Failed to create cipher: {}", e))
        })
    }

    fn proof_tag(
        &self,
        handle: &ConfidentialHandle,
        contract: &Address,
        caller: &Address,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.proof_key);
        hasher.update(PROOF_DOMAIN);
        hasher.update(handle.as_bytes());
        hasher.update(contract);
        hasher.update(caller);
        hasher.finalize().into()
    }
}

impl ConfidentialCompute for LocalCoprocessor {
    fn encrypt_u64(
        &mut self,
        value: u64,
        contract: &Address,
        caller: &Address,
    ) -> Result<EncryptedInput, ComputeError> {
        let nonce = self.allocate_nonce();
        let aad = binding_aad(contract, caller);

        let ciphertext = self
            .cipher()?
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &value.to_le_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|e| {
                ComputeError::EncryptionFailed(format!("AES-GCM encryption failed: {}", e))
            })?;

        let handle = {
            let mut hasher = Sha256::new();
            hasher.update(HANDLE_DOMAIN);
            hasher.update(nonce);
            hasher.update(&ciphertext);
            hasher.update(contract);
            hasher.update(caller);
            ConfidentialHandle(hasher.finalize().into())
        };
        let proof = InputProof(self.proof_tag(&handle, contract, caller).to_vec());

        self.values.insert(
            handle,
            SealedValue {
                nonce,
                ciphertext,
                contract: *contract,
                caller: *caller,
            },
        );

        debug!("Issued handle {}", hex::encode(&handle.0[..8]));
        Ok(EncryptedInput { handle, proof })
    }

    fn verify_input(
        &self,
        handle: &ConfidentialHandle,
        proof: &InputProof,
        contract: &Address,
        caller: &Address,
    ) -> Result<(), ComputeError> {
        let sealed = self.values.get(handle).ok_or(ComputeError::UnknownHandle)?;

        if sealed.contract != *contract || sealed.caller != *caller {
            return Err(ComputeError::InvalidProof);
        }

        let expected = self.proof_tag(handle, contract, caller);
        if proof.as_bytes() != expected.as_slice() {
            return Err(ComputeError::InvalidProof);
        }

        Ok(())
    }

    fn allow(
        &mut self,
        handle: &ConfidentialHandle,
        address: &Address,
    ) -> Result<(), ComputeError> {
        if !self.values.contains_key(handle) {
            return Err(ComputeError::UnknownHandle);
        }
        self.acl.grant(*handle, *address);
        Ok(())
    }

    fn is_allowed(&self, handle: &ConfidentialHandle, address: &Address) -> bool {
        self.acl.is_allowed(handle, address)
    }

    fn user_decrypt(
        &self,
        handle: &ConfidentialHandle,
        contract: &Address,
        requester: &Address,
    ) -> Result<u64, ComputeError> {
        let sealed = self.values.get(handle).ok_or(ComputeError::UnknownHandle)?;

        if !self.acl.is_allowed(handle, contract) {
            warn!("Decryption refused: contract not allowed");
            return Err(ComputeError::ContractNotAllowed);
        }
        if !self.acl.is_allowed(handle, requester) {
            warn!("Decryption refused: requester not allowed");
            return Err(ComputeError::Unauthorized);
        }

        let aad = binding_aad(&sealed.contract, &sealed.caller);
        let plaintext = self
            .cipher()
            .map_err(|e| ComputeError::DecryptionFailed(e.to_string()))?
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: &sealed.ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| ComputeError::AuthenticationFailed)?;

        let bytes: [u8; 8] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| ComputeError::InvalidPlaintext(plaintext.len()))?;
        Ok(u64::from_le_bytes(bytes))
    }
}

/// Derive a 32-byte subkey from the master secret.
fn derive_key(secret: &[u8; 32], info: &[u8]) -> Result<[u8; 32], ComputeError> {
    let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), secret);
    let mut key = [0u8; 32];
    hk.expand(info, &mut key)
        .map_err(|_| ComputeError::KeyDerivationFailed)?;
    Ok(key)
}

fn binding_aad(contract: &Address, caller: &Address) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(contract);
    aad[32..].copy_from_slice(caller);
    aad
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    const CONTRACT: Address = [9u8; 32];
    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];

    fn coprocessor() -> LocalCoprocessor {
        LocalCoprocessor::new(&mut OsRng).unwrap()
    }

    #[test]
    fn test_encrypt_then_decrypt_for_owner() {
        let mut cop = coprocessor();
        let input = cop.encrypt_u64(200, &CONTRACT, &ALICE).unwrap();

        cop.allow(&input.handle, &CONTRACT).unwrap();
        cop.allow(&input.handle, &ALICE).unwrap();

        assert_eq!(cop.user_decrypt(&input.handle, &CONTRACT, &ALICE).unwrap(), 200);
    }

    #[test]
    fn test_decrypt_requires_grants() {
        let mut cop = coprocessor();
        let input = cop.encrypt_u64(5, &CONTRACT, &ALICE).unwrap();

        assert_eq!(
            cop.user_decrypt(&input.handle, &CONTRACT, &ALICE),
            Err(ComputeError::ContractNotAllowed)
        );

        cop.allow(&input.handle, &CONTRACT).unwrap();
        assert_eq!(
            cop.user_decrypt(&input.handle, &CONTRACT, &ALICE),
            Err(ComputeError::Unauthorized)
        );

        cop.allow(&input.handle, &ALICE).unwrap();
        assert_eq!(
            cop.user_decrypt(&input.handle, &CONTRACT, &BOB),
            Err(ComputeError::Unauthorized)
        );
    }

    #[test]
    fn test_verify_input_binds_caller_and_contract() {
        let mut cop = coprocessor();
        let input = cop.encrypt_u64(42, &CONTRACT, &ALICE).unwrap();

        assert!(cop.verify_input(&input.handle, &input.proof, &CONTRACT, &ALICE).is_ok());
        assert_eq!(
            cop.verify_input(&input.handle, &input.proof, &CONTRACT, &BOB),
            Err(ComputeError::InvalidProof)
        );
        assert_eq!(
            cop.verify_input(&input.handle, &input.proof, &[8u8; 32], &ALICE),
            Err(ComputeError::InvalidProof)
        );
    }

    #[test]
    fn test_verify_input_rejects_tampered_proof() {
        let mut cop = coprocessor();
        let input = cop.encrypt_u64(42, &CONTRACT, &ALICE).unwrap();

        let mut tampered = input.proof.clone();
        tampered.0[0] ^= 0xff;
        assert_eq!(
            cop.verify_input(&input.handle, &tampered, &CONTRACT, &ALICE),
            Err(ComputeError::InvalidProof)
        );
        assert_eq!(
            cop.verify_input(&input.handle, &InputProof::default(), &CONTRACT, &ALICE),
            Err(ComputeError::InvalidProof)
        );
    }

    #[test]
    fn test_unknown_handle() {
        let mut cop = coprocessor();
        let unknown = ConfidentialHandle([3u8; 32]);

        assert_eq!(
            cop.verify_input(&unknown, &InputProof::default(), &CONTRACT, &ALICE),
            Err(ComputeError::UnknownHandle)
        );
        assert_eq!(cop.allow(&unknown, &ALICE), Err(ComputeError::UnknownHandle));
    }

    #[test]
    fn test_same_value_yields_distinct_handles() {
        let mut cop = coprocessor();
        let a = cop.encrypt_u64(100, &CONTRACT, &ALICE).unwrap();
        let b = cop.encrypt_u64(100, &CONTRACT, &ALICE).unwrap();

        assert_ne!(a.handle, b.handle);
        assert!(cop.verify_input(&a.handle, &a.proof, &CONTRACT, &ALICE).is_ok());
        assert!(cop.verify_input(&b.handle, &b.proof, &CONTRACT, &ALICE).is_ok());
    }

    #[test]
    fn test_proofs_do_not_transfer_between_coprocessors() {
        let mut first = LocalCoprocessor::from_secret(&[1u8; 32]).unwrap();
        let mut second = LocalCoprocessor::from_secret(&[2u8; 32]).unwrap();

        let input = first.encrypt_u64(1, &CONTRACT, &ALICE).unwrap();
        let other = second.encrypt_u64(1, &CONTRACT, &ALICE).unwrap();

        // Same nonce and inputs, different keys
        assert_ne!(input.handle, other.handle);
        assert_eq!(
            second.verify_input(&input.handle, &input.proof, &CONTRACT, &ALICE),
            Err(ComputeError::UnknownHandle)
        );
    }
}
