//! Access-control list for confidential handles.

use std::collections::{HashMap, HashSet};

use cipherbid_types::{Address, ConfidentialHandle};

/// Records which addresses may use which handles.
///
/// Grants are additive and never revoked.
#[derive(Debug, Default, Clone)]
pub struct Acl {
    grants: HashMap<ConfidentialHandle, HashSet<Address>>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `address` access to `handle`. Returns `false` if already granted.
    pub fn grant(&mut self, handle: ConfidentialHandle, address: Address) -> bool {
        self.grants.entry(handle).or_default().insert(address)
    }

    pub fn is_allowed(&self, handle: &ConfidentialHandle, address: &Address) -> bool {
        self.grants
            .get(handle)
            .map(|allowed| allowed.contains(address))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_check() {
        let mut acl = Acl::new();
        let handle = ConfidentialHandle([7u8; 32]);
        let alice = [1u8; 32];
        let bob = [2u8; 32];

        assert!(!acl.is_allowed(&handle, &alice));

        assert!(acl.grant(handle, alice));
        assert!(!acl.grant(handle, alice));

        assert!(acl.is_allowed(&handle, &alice));
        assert!(!acl.is_allowed(&handle, &bob));
    }

    #[test]
    fn test_grants_are_per_handle() {
        let mut acl = Acl::new();
        let alice = [1u8; 32];
        acl.grant(ConfidentialHandle([1u8; 32]), alice);

        assert!(!acl.is_allowed(&ConfidentialHandle([2u8; 32]), &alice));
    }
}
