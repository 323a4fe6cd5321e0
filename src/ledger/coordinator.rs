use crate::domain::ids::{AccountId, NftId};
use crate::error::Result;
use crate::ledger::{Entity, StagedLedger};
use crate::ledger::entities::{
    Account, AccountProperty, OwnedNfts, OwnedNftsChange, TokenRelKey, TokenRelationship,
    UniqueToken,
};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub type AccountsLedger = StagedLedger<AccountId, Account>;
pub type TokenRelsLedger = StagedLedger<TokenRelKey, TokenRelationship>;
pub type NftsLedger = StagedLedger<NftId, UniqueToken>;
pub type OwnershipIndex = StagedLedger<AccountId, OwnedNfts>;

/// Account properties a token transfer may stage while it is being validated.
pub const TOKEN_TRANSFER_SIDE_EFFECTS: [AccountProperty; 3] = [
    AccountProperty::Tokens,
    AccountProperty::NumNftsOwned,
    AccountProperty::UsedAutomaticAssociations,
];

/// The four participant ledgers of one consensus round.
///
/// The accounts ledger takes part in every transaction. The others are opened
/// lazily by whoever first touches them, so a transaction that never moves a
/// token leaves them idle and `commit_all`/`rollback_all` skip them.
#[derive(Debug, Clone)]
pub struct Ledgers {
    pub accounts: AccountsLedger,
    pub token_rels: TokenRelsLedger,
    pub nfts: NftsLedger,
    pub owners: OwnershipIndex,
}

impl Default for Ledgers {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledgers {
    pub fn new() -> Self {
        Self {
            accounts: StagedLedger::new("accounts"),
            token_rels: StagedLedger::new("token relationships"),
            nfts: StagedLedger::new("nfts"),
            owners: StagedLedger::new("nft owners"),
        }
    }

    pub fn begin(&mut self) -> Result<()> {
        self.accounts.begin()
    }

    pub fn commit_all(&mut self) -> Result<()> {
        commit_if_open(&mut self.token_rels)?;
        commit_if_open(&mut self.nfts)?;
        commit_if_open(&mut self.owners)?;
        commit_if_open(&mut self.accounts)
    }

    pub fn rollback_all(&mut self) -> Result<()> {
        rollback_if_open(&mut self.token_rels)?;
        rollback_if_open(&mut self.nfts)?;
        rollback_if_open(&mut self.owners)?;
        rollback_if_open(&mut self.accounts)
    }

    /// Unwinds whatever a failed transfer staged, without discarding unrelated
    /// mutations already staged on the accounts ledger this round.
    pub fn drop_pending_token_changes(&mut self) -> Result<()> {
        rollback_if_open(&mut self.token_rels)?;
        rollback_if_open(&mut self.nfts)?;
        rollback_if_open(&mut self.owners)?;
        self.accounts.undo_changes_of_type(&TOKEN_TRANSFER_SIDE_EFFECTS);
        self.accounts.undo_creations();
        Ok(())
    }

    /// Moves `nft` between owners in the derived index.
    pub fn reindex_owner(&mut self, nft: NftId, from: AccountId, to: AccountId) -> Result<()> {
        open_if_idle(&mut self.owners)?;

        let mut sent = self.owned_by(&from);
        sent.remove(&nft);
        self.stage_owned(from, sent)?;

        let mut received = self.owned_by(&to);
        received.insert(nft);
        self.stage_owned(to, received)
    }

    fn owned_by(&self, owner: &AccountId) -> BTreeSet<NftId> {
        self.owners
            .get(owner)
            .map(|entry| entry.nfts.clone())
            .unwrap_or_default()
    }

    fn stage_owned(&mut self, owner: AccountId, nfts: BTreeSet<NftId>) -> Result<()> {
        if !self.owners.exists(&owner) {
            self.owners.create(owner)?;
        }
        self.owners.set(&owner, OwnedNftsChange::Nfts(nfts))
    }
}

/// Opens `ledger` unless a transaction is already running on it.
pub fn open_if_idle<K, V>(ledger: &mut StagedLedger<K, V>) -> Result<()>
where
    K: Ord + Clone + fmt::Display,
    V: Entity,
{
    if !ledger.is_in_transaction() {
        ledger.begin()?;
    }
    Ok(())
}

fn commit_if_open<K, V>(ledger: &mut StagedLedger<K, V>) -> Result<()>
where
    K: Ord + Clone + fmt::Display,
    V: Entity,
{
    if ledger.is_in_transaction() {
        ledger.commit()?;
    }
    Ok(())
}

fn rollback_if_open<K, V>(ledger: &mut StagedLedger<K, V>) -> Result<()>
where
    K: Ord + Clone + fmt::Display,
    V: Entity,
{
    if ledger.is_in_transaction() {
        ledger.rollback()?;
    } else {
        debug!(ledger = ledger.name(), "idle, nothing to roll back");
    }
    Ok(())
}
