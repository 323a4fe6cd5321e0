//! Record types held by the four staged ledgers, with their property schemas.

use crate::domain::ids::{AccountId, Alias, NftId, TokenId};
use crate::domain::key::PrimitiveKey;
use crate::ledger::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Balance in tinybars.
    pub balance: i64,
    pub deleted: bool,
    /// Expired and past its grace period, awaiting removal.
    pub detached: bool,
    pub key: Option<PrimitiveKey>,
    pub memo: String,
    pub auto_renew_period: u64,
    pub receiver_sig_required: bool,
    pub smart_contract: bool,
    pub alias: Alias,
    pub tokens: BTreeSet<TokenId>,
    pub num_nfts_owned: u64,
    pub max_automatic_associations: u32,
    pub used_automatic_associations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountProperty {
    Balance,
    Deleted,
    Detached,
    Key,
    Memo,
    AutoRenewPeriod,
    ReceiverSigRequired,
    SmartContract,
    Alias,
    Tokens,
    NumNftsOwned,
    MaxAutomaticAssociations,
    UsedAutomaticAssociations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountChange {
    Balance(i64),
    Deleted(bool),
    Detached(bool),
    Key(Option<PrimitiveKey>),
    Memo(String),
    AutoRenewPeriod(u64),
    ReceiverSigRequired(bool),
    SmartContract(bool),
    Alias(Alias),
    Tokens(BTreeSet<TokenId>),
    NumNftsOwned(u64),
    MaxAutomaticAssociations(u32),
    UsedAutomaticAssociations(u32),
}

impl Entity for Account {
    type Property = AccountProperty;
    type Change = AccountChange;

    fn property_of(change: &AccountChange) -> AccountProperty {
        match change {
            AccountChange::Balance(_) => AccountProperty::Balance,
            AccountChange::Deleted(_) => AccountProperty::Deleted,
            AccountChange::Detached(_) => AccountProperty::Detached,
            AccountChange::Key(_) => AccountProperty::Key,
            AccountChange::Memo(_) => AccountProperty::Memo,
            AccountChange::AutoRenewPeriod(_) => AccountProperty::AutoRenewPeriod,
            AccountChange::ReceiverSigRequired(_) => AccountProperty::ReceiverSigRequired,
            AccountChange::SmartContract(_) => AccountProperty::SmartContract,
            AccountChange::Alias(_) => AccountProperty::Alias,
            AccountChange::Tokens(_) => AccountProperty::Tokens,
            AccountChange::NumNftsOwned(_) => AccountProperty::NumNftsOwned,
            AccountChange::MaxAutomaticAssociations(_) => AccountProperty::MaxAutomaticAssociations,
            AccountChange::UsedAutomaticAssociations(_) => {
                AccountProperty::UsedAutomaticAssociations
            }
        }
    }

    fn apply(&mut self, change: AccountChange) {
        match change {
            AccountChange::Balance(v) => self.balance = v,
            AccountChange::Deleted(v) => self.deleted = v,
            AccountChange::Detached(v) => self.detached = v,
            AccountChange::Key(v) => self.key = v,
            AccountChange::Memo(v) => self.memo = v,
            AccountChange::AutoRenewPeriod(v) => self.auto_renew_period = v,
            AccountChange::ReceiverSigRequired(v) => self.receiver_sig_required = v,
            AccountChange::SmartContract(v) => self.smart_contract = v,
            AccountChange::Alias(v) => self.alias = v,
            AccountChange::Tokens(v) => self.tokens = v,
            AccountChange::NumNftsOwned(v) => self.num_nfts_owned = v,
            AccountChange::MaxAutomaticAssociations(v) => self.max_automatic_associations = v,
            AccountChange::UsedAutomaticAssociations(v) => self.used_automatic_associations = v,
        }
    }

    fn restore(&mut self, baseline: &Self, property: AccountProperty) {
        match property {
            AccountProperty::Balance => self.balance = baseline.balance,
            AccountProperty::Deleted => self.deleted = baseline.deleted,
            AccountProperty::Detached => self.detached = baseline.detached,
            AccountProperty::Key => self.key = baseline.key.clone(),
            AccountProperty::Memo => self.memo = baseline.memo.clone(),
            AccountProperty::AutoRenewPeriod => self.auto_renew_period = baseline.auto_renew_period,
            AccountProperty::ReceiverSigRequired => {
                self.receiver_sig_required = baseline.receiver_sig_required
            }
            AccountProperty::SmartContract => self.smart_contract = baseline.smart_contract,
            AccountProperty::Alias => self.alias = baseline.alias.clone(),
            AccountProperty::Tokens => self.tokens = baseline.tokens.clone(),
            AccountProperty::NumNftsOwned => self.num_nfts_owned = baseline.num_nfts_owned,
            AccountProperty::MaxAutomaticAssociations => {
                self.max_automatic_associations = baseline.max_automatic_associations
            }
            AccountProperty::UsedAutomaticAssociations => {
                self.used_automatic_associations = baseline.used_automatic_associations
            }
        }
    }
}

/// Key of the token-relationship ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenRelKey {
    pub account: AccountId,
    pub token: TokenId,
}

impl TokenRelKey {
    pub const fn new(account: AccountId, token: TokenId) -> Self {
        Self { account, token }
    }
}

impl fmt::Display for TokenRelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenRelationship {
    pub balance: i64,
    pub frozen: bool,
    pub kyc_granted: bool,
    pub automatic_association: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenRelProperty {
    Balance,
    Frozen,
    KycGranted,
    AutomaticAssociation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRelChange {
    Balance(i64),
    Frozen(bool),
    KycGranted(bool),
    AutomaticAssociation(bool),
}

impl Entity for TokenRelationship {
    type Property = TokenRelProperty;
    type Change = TokenRelChange;

    fn property_of(change: &TokenRelChange) -> TokenRelProperty {
        match change {
            TokenRelChange::Balance(_) => TokenRelProperty::Balance,
            TokenRelChange::Frozen(_) => TokenRelProperty::Frozen,
            TokenRelChange::KycGranted(_) => TokenRelProperty::KycGranted,
            TokenRelChange::AutomaticAssociation(_) => TokenRelProperty::AutomaticAssociation,
        }
    }

    fn apply(&mut self, change: TokenRelChange) {
        match change {
            TokenRelChange::Balance(v) => self.balance = v,
            TokenRelChange::Frozen(v) => self.frozen = v,
            TokenRelChange::KycGranted(v) => self.kyc_granted = v,
            TokenRelChange::AutomaticAssociation(v) => self.automatic_association = v,
        }
    }

    fn restore(&mut self, baseline: &Self, property: TokenRelProperty) {
        match property {
            TokenRelProperty::Balance => self.balance = baseline.balance,
            TokenRelProperty::Frozen => self.frozen = baseline.frozen,
            TokenRelProperty::KycGranted => self.kyc_granted = baseline.kyc_granted,
            TokenRelProperty::AutomaticAssociation => {
                self.automatic_association = baseline.automatic_association
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UniqueToken {
    pub owner: AccountId,
    pub metadata: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NftProperty {
    Owner,
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NftChange {
    Owner(AccountId),
    Metadata(Vec<u8>),
}

impl Entity for UniqueToken {
    type Property = NftProperty;
    type Change = NftChange;

    fn property_of(change: &NftChange) -> NftProperty {
        match change {
            NftChange::Owner(_) => NftProperty::Owner,
            NftChange::Metadata(_) => NftProperty::Metadata,
        }
    }

    fn apply(&mut self, change: NftChange) {
        match change {
            NftChange::Owner(v) => self.owner = v,
            NftChange::Metadata(v) => self.metadata = v,
        }
    }

    fn restore(&mut self, baseline: &Self, property: NftProperty) {
        match property {
            NftProperty::Owner => self.owner = baseline.owner,
            NftProperty::Metadata => self.metadata = baseline.metadata.clone(),
        }
    }
}

/// Derived index entry: every serial an account currently owns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnedNfts {
    pub nfts: BTreeSet<NftId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnedNftsProperty {
    Nfts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedNftsChange {
    Nfts(BTreeSet<NftId>),
}

impl Entity for OwnedNfts {
    type Property = OwnedNftsProperty;
    type Change = OwnedNftsChange;

    fn property_of(_: &OwnedNftsChange) -> OwnedNftsProperty {
        OwnedNftsProperty::Nfts
    }

    fn apply(&mut self, change: OwnedNftsChange) {
        let OwnedNftsChange::Nfts(nfts) = change;
        self.nfts = nfts;
    }

    fn restore(&mut self, baseline: &Self, _: OwnedNftsProperty) {
        self.nfts = baseline.nfts.clone();
    }
}
