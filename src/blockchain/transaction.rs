//! Transaction building and signing.
//!
//! # Responsibilities
//! - Validate withdrawal inputs before anything is signed
//! - Serialize the canonical transfer message
//! - Sign it with the wallet key and derive the transaction id
//!
//! # Wire layout (big endian)
//! ```text
//! signature[64] | tag u32 | subwallet_id u32 | expires_at u32 | seqno u32
//!               | send_mode u8 | bounce u8 | dest workchain i8 | dest hash[32]
//!               | amount u64 | comment_len u8 | comment[comment_len]
//! ```
//!
//! Building is pure: the same inputs always produce the same
//! [`SignedTransaction`], so replaying a request yields the same id.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::blockchain::address::{AddressCodec, AddressError, RawAddress};
use crate::blockchain::types::{SignedTransaction, TransactionId};
use crate::blockchain::wallet::WalletSecret;
use crate::config::WalletConfig;

/// Marks a simple transfer message.
pub const MESSAGE_TAG: u32 = 0x7472_6e31;

/// Pay transfer fees separately, ignore errors during the action phase.
pub const SEND_MODE: u8 = 3;

/// Longest comment carried in a single message.
pub const MAX_COMMENT_LEN: usize = 120;

const SIGNATURE_LEN: usize = 64;
const BODY_FIXED_LEN: usize = 60;

/// Errors raised while building a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("invalid destination: {0}")]
    InvalidDestination(#[from] AddressError),

    #[error("sequence number {0} exceeds the wallet counter range")]
    SequenceOutOfRange(u64),

    #[error("expiry {0} exceeds the supported range")]
    ExpiryOutOfRange(u64),

    #[error("comment is {0} bytes, limit is {max}", max = MAX_COMMENT_LEN)]
    CommentTooLong(usize),

    #[error("invalid wallet secret: {0}")]
    InvalidSecret(String),

    #[error("malformed transaction payload: {0}")]
    MalformedPayload(String),

    #[error("signature does not match the wallet key")]
    BadSignature,
}

/// Decoded unsigned part of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub subwallet_id: u32,
    pub expires_at: u32,
    pub sequence_number: u32,
    pub send_mode: u8,
    pub bounce: bool,
    pub destination: RawAddress,
    pub amount: u64,
    pub comment: Option<String>,
}

impl TransferMessage {
    fn encode(&self) -> Vec<u8> {
        let comment = self.comment.as_deref().unwrap_or_default().as_bytes();
        let mut body = Vec::with_capacity(BODY_FIXED_LEN + comment.len());
        body.extend_from_slice(&MESSAGE_TAG.to_be_bytes());
        body.extend_from_slice(&self.subwallet_id.to_be_bytes());
        body.extend_from_slice(&self.expires_at.to_be_bytes());
        body.extend_from_slice(&self.sequence_number.to_be_bytes());
        body.push(self.send_mode);
        body.push(u8::from(self.bounce));
        body.push(self.destination.workchain as u8);
        body.extend_from_slice(&self.destination.hash);
        body.extend_from_slice(&self.amount.to_be_bytes());
        body.push(comment.len() as u8);
        body.extend_from_slice(comment);
        body
    }

    fn decode(body: &[u8]) -> Result<Self, BuildError> {
        if body.len() < BODY_FIXED_LEN {
            return Err(BuildError::MalformedPayload(format!(
                "body is {} bytes",
                body.len()
            )));
        }

        let u32_at = |at: usize| u32::from_be_bytes([body[at], body[at + 1], body[at + 2], body[at + 3]]);
        if u32_at(0) != MESSAGE_TAG {
            return Err(BuildError::MalformedPayload("unknown message tag".to_string()));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&body[19..51]);
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&body[51..59]);

        let comment_len = usize::from(body[59]);
        let comment_bytes = &body[BODY_FIXED_LEN..];
        if comment_bytes.len() != comment_len {
            return Err(BuildError::MalformedPayload("comment length mismatch".to_string()));
        }
        let comment = if comment_len == 0 {
            None
        } else {
            Some(
                String::from_utf8(comment_bytes.to_vec())
                    .map_err(|_| BuildError::MalformedPayload("comment is not UTF-8".to_string()))?,
            )
        };

        Ok(Self {
            subwallet_id: u32_at(4),
            expires_at: u32_at(8),
            sequence_number: u32_at(12),
            send_mode: body[16],
            bounce: body[17] != 0,
            destination: RawAddress::new(body[18] as i8, hash),
            amount: u64::from_be_bytes(amount),
            comment,
        })
    }

    /// Split a signed payload into signature and message.
    pub fn parse(raw_payload: &[u8]) -> Result<(Signature, Self), BuildError> {
        if raw_payload.len() < SIGNATURE_LEN {
            return Err(BuildError::MalformedPayload("missing signature".to_string()));
        }
        let (sig, body) = raw_payload.split_at(SIGNATURE_LEN);
        let mut sig_bytes = [0u8; SIGNATURE_LEN];
        sig_bytes.copy_from_slice(sig);
        Ok((Signature::from_bytes(&sig_bytes), Self::decode(body)?))
    }

    /// Parse a signed payload and check its signature against `public_key`.
    pub fn verify(raw_payload: &[u8], public_key: &[u8; 32]) -> Result<Self, BuildError> {
        let (signature, message) = Self::parse(raw_payload)?;
        let key = VerifyingKey::from_bytes(public_key).map_err(|_| BuildError::BadSignature)?;
        key.verify(&raw_payload[SIGNATURE_LEN..], &signature)
            .map_err(|_| BuildError::BadSignature)?;
        Ok(message)
    }
}

/// Content hash of a signed payload.
pub fn transaction_id(raw_payload: &[u8]) -> TransactionId {
    TransactionId(hex::encode(Sha256::digest(raw_payload)))
}

/// Builds signed transfers for one wallet contract flavour.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    codec: AddressCodec,
    subwallet_id: u32,
    bounceable: bool,
}

impl TransactionBuilder {
    pub fn new(codec: AddressCodec, config: &WalletConfig) -> Self {
        Self {
            codec,
            subwallet_id: config.subwallet_id,
            bounceable: config.bounceable,
        }
    }

    /// Build and sign a transfer of `amount` minor units to `destination`.
    ///
    /// `secret` is consumed and wiped once the signature is produced.
    pub fn build(
        &self,
        secret: WalletSecret,
        destination: &str,
        amount: u64,
        sequence_number: u64,
        expires_at: u64,
    ) -> Result<SignedTransaction, BuildError> {
        self.build_with_comment(secret, destination, amount, sequence_number, expires_at, None)
    }

    /// Same as [`build`](Self::build) with an optional text comment.
    pub fn build_with_comment(
        &self,
        secret: WalletSecret,
        destination: &str,
        amount: u64,
        sequence_number: u64,
        expires_at: u64,
        comment: Option<&str>,
    ) -> Result<SignedTransaction, BuildError> {
        if amount == 0 {
            return Err(BuildError::ZeroAmount);
        }
        let destination = self.codec.decode(destination)?;
        let seqno = u32::try_from(sequence_number)
            .map_err(|_| BuildError::SequenceOutOfRange(sequence_number))?;
        let expiry =
            u32::try_from(expires_at).map_err(|_| BuildError::ExpiryOutOfRange(expires_at))?;
        let comment = comment.filter(|c| !c.is_empty());
        if let Some(c) = comment {
            if c.len() > MAX_COMMENT_LEN {
                return Err(BuildError::CommentTooLong(c.len()));
            }
        }

        let message = TransferMessage {
            subwallet_id: self.subwallet_id,
            expires_at: expiry,
            sequence_number: seqno,
            send_mode: SEND_MODE,
            bounce: self.bounceable,
            destination,
            amount,
            comment: comment.map(str::to_string),
        };

        let body = message.encode();
        let signature = secret.sign(&body);
        drop(secret);

        let mut raw_payload = Vec::with_capacity(SIGNATURE_LEN + body.len());
        raw_payload.extend_from_slice(&signature.to_bytes());
        raw_payload.extend_from_slice(&body);

        Ok(SignedTransaction {
            transaction_id: transaction_id(&raw_payload),
            raw_payload,
            sequence_number,
            expires_at,
        })
    }
}
