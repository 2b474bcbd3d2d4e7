//! Address codec.
//!
//! Converts between the raw `(workchain, account hash)` pair and the
//! user-friendly form used as the canonical string on the host side:
//!
//! ```text
//! [flag:1][workchain:1][hash:32][crc16-xmodem:2]  → URL-safe base64 (48 chars)
//! ```
//!
//! `decode` also accepts the standard base64 alphabet and the raw
//! `"<workchain>:<64 hex>"` form returned by some node APIs.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use crc::{Crc, CRC_16_XMODEM};
use std::fmt;
use thiserror::Error;

use crate::config::Network;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET: u8 = 0x80;

const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

/// Address decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid address length {0}")]
    InvalidLength(usize),

    #[error("invalid address encoding: {0}")]
    InvalidEncoding(String),

    #[error("address checksum mismatch")]
    InvalidChecksum,

    #[error("unknown address flag 0x{0:02x}")]
    InvalidFlag(u8),

    #[error("unsupported workchain {0}")]
    InvalidWorkchain(i32),
}

/// Raw account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
}

impl RawAddress {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }
}

impl fmt::Display for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

/// Stateless codec configured for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressCodec {
    testnet: bool,
    bounceable: bool,
}

impl AddressCodec {
    pub fn new(network: Network, bounceable: bool) -> Self {
        Self {
            testnet: network == Network::Testnet,
            bounceable,
        }
    }

    /// Encode into the canonical user-friendly string.
    pub fn encode(&self, address: &RawAddress) -> String {
        let mut flag = if self.bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if self.testnet {
            flag |= FLAG_TESTNET;
        }

        let mut bytes = [0u8; FRIENDLY_BYTES];
        bytes[0] = flag;
        bytes[1] = address.workchain as u8;
        bytes[2..34].copy_from_slice(&address.hash);
        let crc = CRC16.checksum(&bytes[..34]);
        bytes[34..].copy_from_slice(&crc.to_be_bytes());

        URL_SAFE.encode(bytes)
    }

    /// Decode a user-friendly or raw address string.
    pub fn decode(&self, input: &str) -> Result<RawAddress, AddressError> {
        let input = input.trim();
        if input.contains(':') {
            return decode_raw(input);
        }
        if input.len() != FRIENDLY_LEN {
            return Err(AddressError::InvalidLength(input.len()));
        }

        let bytes = if input.contains('-') || input.contains('_') {
            URL_SAFE.decode(input)
        } else {
            STANDARD.decode(input)
        }
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        if bytes.len() != FRIENDLY_BYTES {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if CRC16.checksum(&bytes[..34]) != expected {
            return Err(AddressError::InvalidChecksum);
        }

        let flag = bytes[0] & !FLAG_TESTNET;
        if flag != FLAG_BOUNCEABLE && flag != FLAG_NON_BOUNCEABLE {
            return Err(AddressError::InvalidFlag(bytes[0]));
        }

        let workchain = bytes[1] as i8;
        check_workchain(i32::from(workchain))?;

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(RawAddress { workchain, hash })
    }

    /// Re-encode any accepted address form into the canonical string.
    pub fn normalize(&self, input: &str) -> Result<String, AddressError> {
        self.decode(input).map(|raw| self.encode(&raw))
    }
}

fn decode_raw(input: &str) -> Result<RawAddress, AddressError> {
    let (wc, hash_hex) = input
        .split_once(':')
        .ok_or_else(|| AddressError::InvalidEncoding("missing workchain".to_string()))?;

    let workchain: i32 = wc
        .parse()
        .map_err(|_| AddressError::InvalidEncoding(format!("bad workchain '{}'", wc)))?;
    check_workchain(workchain)?;

    if hash_hex.len() != 64 {
        return Err(AddressError::InvalidLength(hash_hex.len()));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(hash_hex, &mut hash)
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

    Ok(RawAddress {
        workchain: workchain as i8,
        hash,
    })
}

fn check_workchain(workchain: i32) -> Result<(), AddressError> {
    match workchain {
        0 | -1 => Ok(()),
        other => Err(AddressError::InvalidWorkchain(other)),
    }
}
