//! Primitive public keys as they appear inside an alias.
//!
//! An alias is the serialized form of a single-key `Key` message: one
//! length-delimited field carrying either a 32-byte Ed25519 key (field 2) or
//! a 33-byte compressed secp256k1 key (field 7). Anything else, including
//! key lists and threshold keys, is not a primitive key.

use crate::domain::ids::Alias;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ED25519_TAG: u8 = (2 << 3) | 2;
const ECDSA_SECP256K1_TAG: u8 = (7 << 3) | 2;
const ED25519_LEN: usize = 32;
const ECDSA_SECP256K1_LEN: usize = 33;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyDecodeError {
    #[error("alias is empty")]
    Empty,
    #[error("unsupported key field tag {0:#04x}")]
    UnsupportedTag(u8),
    #[error("expected {expected} key bytes, found {found}")]
    Length { expected: usize, found: usize },
    #[error("invalid compressed point prefix {0:#04x}")]
    InvalidPrefix(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKey {
    Ed25519([u8; ED25519_LEN]),
    EcdsaSecp256k1(Vec<u8>),
}

impl PrimitiveKey {
    pub fn from_alias(alias: &Alias) -> Result<Self, KeyDecodeError> {
        Self::decode(alias.as_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        let (&tag, rest) = bytes.split_first().ok_or(KeyDecodeError::Empty)?;
        let expected = match tag {
            ED25519_TAG => ED25519_LEN,
            ECDSA_SECP256K1_TAG => ECDSA_SECP256K1_LEN,
            other => return Err(KeyDecodeError::UnsupportedTag(other)),
        };
        let (&len, key) = rest.split_first().ok_or(KeyDecodeError::Length {
            expected,
            found: 0,
        })?;
        if len as usize != expected || key.len() != expected {
            return Err(KeyDecodeError::Length {
                expected,
                found: key.len(),
            });
        }

        if tag == ED25519_TAG {
            let mut raw = [0u8; ED25519_LEN];
            raw.copy_from_slice(key);
            Ok(PrimitiveKey::Ed25519(raw))
        } else {
            match key[0] {
                0x02 | 0x03 => Ok(PrimitiveKey::EcdsaSecp256k1(key.to_vec())),
                prefix => Err(KeyDecodeError::InvalidPrefix(prefix)),
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let (tag, key) = match self {
            PrimitiveKey::Ed25519(raw) => (ED25519_TAG, raw.as_slice()),
            PrimitiveKey::EcdsaSecp256k1(raw) => (ECDSA_SECP256K1_TAG, raw.as_slice()),
        };
        let mut out = Vec::with_capacity(2 + key.len());
        out.push(tag);
        out.push(key.len() as u8);
        out.extend_from_slice(key);
        out
    }

    pub fn to_alias(&self) -> Alias {
        Alias::new(self.encode())
    }
}
