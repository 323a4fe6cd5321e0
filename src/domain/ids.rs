use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `shard.realm.num` account identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

/// A `shard.realm.num` token identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TokenId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TokenId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

/// One serial number of a non-fungible token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NftId {
    pub token: TokenId,
    pub serial: u64,
}

impl NftId {
    pub const fn new(token: TokenId, serial: u64) -> Self {
        Self { token, serial }
    }
}

/// Serialized public key standing in for an account that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Alias(Vec<u8>);

impl Alias {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for Alias {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(digits)
            .map(Alias)
            .map_err(|e| LedgerError::ParseError(format!("alias {s}: {e}")))
    }
}

fn parse_triple(s: &str) -> Result<(u64, u64, u64), LedgerError> {
    let parts: Vec<&str> = s.split('.').collect();
    let [shard, realm, num] = parts.as_slice() else {
        return Err(LedgerError::ParseError(format!(
            "expected shard.realm.num, got {s}"
        )));
    };
    let parse = |part: &str| {
        part.parse::<u64>()
            .map_err(|e| LedgerError::ParseError(format!("{s}: {e}")))
    };
    Ok((parse(*shard)?, parse(*realm)?, parse(*num)?))
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (shard, realm, num) = parse_triple(s)?;
        Ok(Self::new(shard, realm, num))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for TokenId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (shard, realm, num) = parse_triple(s)?;
        Ok(Self::new(shard, realm, num))
    }
}

impl fmt::Display for NftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.token, self.serial)
    }
}
