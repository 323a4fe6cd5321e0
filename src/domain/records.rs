use crate::domain::ids::{AccountId, Alias, TokenId};
use crate::domain::key::PrimitiveKey;
use crate::domain::response::ResponseCode;
use crate::domain::side_effects::OwnershipChange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consensus timestamp assigned to a transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Body of the crypto-create a node synthesizes for an auto-creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticCreation {
    /// Account named in the synthetic transaction id; left at its default.
    pub payer: AccountId,
    pub key: PrimitiveKey,
    pub initial_balance: u64,
    pub auto_renew_period: u64,
    pub memo: String,
}

/// Fee components returned by the fee calculator, in tinybars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeObject {
    pub node_fee: u64,
    pub network_fee: u64,
    pub service_fee: u64,
}

impl FeeObject {
    pub const fn new(node_fee: u64, network_fee: u64, service_fee: u64) -> Self {
        Self {
            node_fee,
            network_fee,
            service_fee,
        }
    }

    /// Sum of all components, or `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        self.service_fee
            .checked_add(self.network_fee)?
            .checked_add(self.node_fee)
    }
}

/// Record of a child transaction the node executed on a user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub status: ResponseCode,
    pub memo: String,
    pub created_account: AccountId,
    pub alias: Alias,
}

/// Outcome of one top-level transaction as surfaced to record consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub consensus_time: Timestamp,
    pub status: ResponseCode,
    pub hbar_transfers: Vec<(AccountId, i64)>,
    pub token_transfers: Vec<(TokenId, AccountId, i64)>,
    pub nft_transfers: Vec<OwnershipChange>,
    pub auto_creation_fee: u64,
    pub child_records: Vec<ChildRecord>,
}

impl TransactionRecord {
    pub fn failed(consensus_time: Timestamp, status: ResponseCode) -> Self {
        Self {
            consensus_time,
            status,
            hbar_transfers: Vec::new(),
            token_transfers: Vec::new(),
            nft_transfers: Vec::new(),
            auto_creation_fee: 0,
            child_records: Vec::new(),
        }
    }
}
