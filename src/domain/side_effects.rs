use crate::domain::ids::{AccountId, Alias, NftId, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipChange {
    pub nft: NftId,
    pub from: AccountId,
    pub to: AccountId,
}

/// Accumulates the externally visible effects of one top-level transaction.
///
/// Nothing here is cleared implicitly; the transaction handler calls
/// [`SideEffectsTracker::reset`] at transaction boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffectsTracker {
    hbar_changes: BTreeMap<AccountId, i64>,
    token_changes: BTreeMap<(TokenId, AccountId), i64>,
    ownership_changes: Vec<OwnershipChange>,
    new_aliases: Vec<(Alias, AccountId)>,
}

impl SideEffectsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_hbar_change(&mut self, account: AccountId, units: i64) {
        *self.hbar_changes.entry(account).or_default() += units;
    }

    pub fn track_token_units_change(&mut self, token: TokenId, account: AccountId, units: i64) {
        *self.token_changes.entry((token, account)).or_default() += units;
    }

    pub fn track_nft_ownership_change(&mut self, nft: NftId, from: AccountId, to: AccountId) {
        self.ownership_changes.push(OwnershipChange { nft, from, to });
    }

    pub fn track_auto_creation(&mut self, created: AccountId, alias: Alias) {
        self.new_aliases.push((alias, created));
    }

    /// Non-zero net hbar adjustments, ordered by account.
    pub fn net_hbar_changes(&self) -> Vec<(AccountId, i64)> {
        self.hbar_changes
            .iter()
            .filter(|(_, units)| **units != 0)
            .map(|(account, units)| (*account, *units))
            .collect()
    }

    /// Non-zero net fungible adjustments, ordered by token then account.
    pub fn net_token_changes(&self) -> Vec<(TokenId, AccountId, i64)> {
        self.token_changes
            .iter()
            .filter(|(_, units)| **units != 0)
            .map(|((token, account), units)| (*token, *account, *units))
            .collect()
    }

    pub fn ownership_changes(&self) -> &[OwnershipChange] {
        &self.ownership_changes
    }

    pub fn new_aliases(&self) -> &[(Alias, AccountId)] {
        &self.new_aliases
    }

    pub fn has_tracked_auto_creation(&self) -> bool {
        !self.new_aliases.is_empty()
    }

    /// Forgets token deltas and ownership moves; hbar changes and aliases stay.
    pub fn reset_tracked_token_changes(&mut self) {
        self.token_changes.clear();
        self.ownership_changes.clear();
    }

    pub fn reset(&mut self) {
        self.hbar_changes.clear();
        self.token_changes.clear();
        self.ownership_changes.clear();
        self.new_aliases.clear();
    }
}
