//! Candidate transaction type.

use crate::{Address, Hash};

/// A pending transaction offered to block building or pool admission.
///
/// The hash is derived from sender, nonce and payload, so two transactions
/// with equal contents share an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    hash: Hash,
    sender: Address,
    nonce: u64,
    payload: Vec<u8>,
}

impl Transaction {
    /// Create a transaction and compute its hash.
    pub fn new(sender: Address, nonce: u64, payload: Vec<u8>) -> Self {
        let hash = Hash::from_parts(&[sender.as_bytes(), &nonce.to_le_bytes(), &payload]);
        Self {
            hash,
            sender,
            nonce,
            payload,
        }
    }

    /// Transaction identity.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Sender address.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Sender nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Opaque payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_covers_all_fields() {
        let sender = Address::new([1u8; 20]);
        let tx = Transaction::new(sender, 0, b"call".to_vec());
        assert_eq!(tx.hash(), Transaction::new(sender, 0, b"call".to_vec()).hash());
        assert_ne!(tx.hash(), Transaction::new(sender, 1, b"call".to_vec()).hash());
        assert_ne!(tx.hash(), Transaction::new(sender, 0, b"other".to_vec()).hash());
        assert_ne!(
            tx.hash(),
            Transaction::new(Address::new([2u8; 20]), 0, b"call".to_vec()).hash()
        );
    }
}
