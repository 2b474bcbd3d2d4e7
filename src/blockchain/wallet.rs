//! Wallet key material.
//!
//! # Security
//! - Secrets are supplied by the host for a single signing call
//! - Keys are zeroized on drop, never logged and never serialized

use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::blockchain::transaction::BuildError;

/// Ed25519 seed of a custodial wallet.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WalletSecret {
    seed: [u8; 32],
}

impl WalletSecret {
    /// Create a secret from raw seed bytes.
    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// Create a secret from a hex-encoded seed (with or without 0x prefix).
    ///
    /// The input is never echoed back in the error.
    pub fn from_hex(seed_hex: &str) -> Result<Self, BuildError> {
        let key_hex = seed_hex.trim().strip_prefix("0x").unwrap_or(seed_hex.trim());

        let mut seed = [0u8; 32];
        hex::decode_to_slice(key_hex, &mut seed)
            .map_err(|_| BuildError::InvalidSecret("expected 32 hex-encoded bytes".to_string()))?;
        Ok(Self { seed })
    }

    /// Public key matching this secret.
    pub fn public_key(&self) -> [u8; 32] {
        SigningKey::from_bytes(&self.seed).verifying_key().to_bytes()
    }

    /// Sign `message`. Ed25519 signatures are deterministic.
    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        SigningKey::from_bytes(&self.seed).sign(message)
    }
}

impl std::fmt::Debug for WalletSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WalletSecret(<redacted>)")
    }
}
