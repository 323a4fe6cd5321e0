use crate::domain::ids::{AccountId, Alias, NftId, TokenId};
use crate::domain::response::ResponseCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The account a balance change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTarget {
    Resolved(AccountId),
    /// Alias with no account behind it yet; only valid for hbar.
    Alias(Alias),
}

/// What the units of a balance change are denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Denomination {
    Hbar,
    Fungible(TokenId),
    /// Ownership of one serial moves from the target to `receiver`.
    Nft { nft: NftId, receiver: AccountId },
}

/// One requested adjustment within a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    target: ChangeTarget,
    denomination: Denomination,
    units: i64,
    new_balance: i64,
    code_for_insufficient_balance: ResponseCode,
}

impl BalanceChange {
    pub fn hbar_adjust(account: AccountId, units: i64) -> Self {
        Self {
            target: ChangeTarget::Resolved(account),
            denomination: Denomination::Hbar,
            units,
            new_balance: 0,
            code_for_insufficient_balance: ResponseCode::InsufficientAccountBalance,
        }
    }

    /// The payer's hbar debit reports a distinct code when it cannot be covered.
    pub fn payer_hbar_adjust(payer: AccountId, units: i64) -> Self {
        Self {
            code_for_insufficient_balance: ResponseCode::InsufficientPayerBalance,
            ..Self::hbar_adjust(payer, units)
        }
    }

    pub fn alias_hbar_credit(alias: Alias, units: i64) -> Self {
        Self {
            target: ChangeTarget::Alias(alias),
            denomination: Denomination::Hbar,
            units,
            new_balance: 0,
            code_for_insufficient_balance: ResponseCode::InsufficientAccountBalance,
        }
    }

    pub fn token_adjust(token: TokenId, account: AccountId, units: i64) -> Self {
        Self {
            target: ChangeTarget::Resolved(account),
            denomination: Denomination::Fungible(token),
            units,
            new_balance: 0,
            code_for_insufficient_balance: ResponseCode::InsufficientTokenBalance,
        }
    }

    pub fn nft_transfer(nft: NftId, sender: AccountId, receiver: AccountId) -> Self {
        Self {
            target: ChangeTarget::Resolved(sender),
            denomination: Denomination::Nft { nft, receiver },
            units: 1,
            new_balance: 0,
            code_for_insufficient_balance: ResponseCode::SenderDoesNotOwnNftSerialNo,
        }
    }

    pub fn denomination(&self) -> Denomination {
        self.denomination
    }

    pub fn is_for_hbar(&self) -> bool {
        self.denomination == Denomination::Hbar
    }

    pub fn is_for_nft(&self) -> bool {
        matches!(self.denomination, Denomination::Nft { .. })
    }

    pub fn token_id(&self) -> Option<TokenId> {
        match self.denomination {
            Denomination::Hbar => None,
            Denomination::Fungible(token) => Some(token),
            Denomination::Nft { nft, .. } => Some(nft.token),
        }
    }

    pub fn counter_party(&self) -> Option<AccountId> {
        match self.denomination {
            Denomination::Nft { receiver, .. } => Some(receiver),
            _ => None,
        }
    }

    /// The resolved account, or `None` while the target is still an alias.
    pub fn account_id(&self) -> Option<AccountId> {
        match &self.target {
            ChangeTarget::Resolved(id) => Some(*id),
            ChangeTarget::Alias(_) => None,
        }
    }

    pub fn alias(&self) -> Option<&Alias> {
        match &self.target {
            ChangeTarget::Alias(alias) => Some(alias),
            ChangeTarget::Resolved(_) => None,
        }
    }

    /// Whether applying this change requires creating the target account first.
    pub fn creates_account(&self) -> bool {
        self.is_for_hbar() && matches!(self.target, ChangeTarget::Alias(_))
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn adjust_units(&mut self, delta: i64) {
        self.units += delta;
    }

    pub fn new_balance(&self) -> i64 {
        self.new_balance
    }

    pub fn set_new_balance(&mut self, new_balance: i64) {
        self.new_balance = new_balance;
    }

    pub fn code_for_insufficient_balance(&self) -> ResponseCode {
        self.code_for_insufficient_balance
    }

    /// Points an alias-pending change at its newly created account.
    ///
    /// A change that is already resolved keeps its target.
    pub fn replace_alias_with(&mut self, created: AccountId) {
        if let ChangeTarget::Alias(_) = self.target {
            self.target = ChangeTarget::Resolved(created);
        }
    }
}

impl fmt::Display for BalanceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            ChangeTarget::Resolved(id) => write!(f, "{id}")?,
            ChangeTarget::Alias(alias) => write!(f, "{alias}")?,
        }
        match self.denomination {
            Denomination::Hbar => write!(f, " {:+} tinybars", self.units),
            Denomination::Fungible(token) => write!(f, " {:+} of {token}", self.units),
            Denomination::Nft { nft, receiver } => write!(f, " sends {nft} to {receiver}"),
        }
    }
}

/// The first account named twice for the same denomination.
///
/// NFT moves and changes still targeting an alias are not considered.
pub fn first_repeated_account(changes: &[BalanceChange]) -> Option<AccountId> {
    let mut seen = BTreeSet::new();
    changes
        .iter()
        .filter(|change| !change.is_for_nft())
        .filter_map(|change| Some((change.account_id()?, change.token_id())))
        .find(|entry| !seen.insert(*entry))
        .map(|(account, _)| account)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_change_creates_account_until_resolved() {
        let mut change = BalanceChange::alias_hbar_credit(Alias::new(vec![1, 2, 3]), 40);
        assert!(change.creates_account());
        assert_eq!(change.account_id(), None);

        change.replace_alias_with(AccountId::from_num(1001));
        assert!(!change.creates_account());
        assert_eq!(change.account_id(), Some(AccountId::from_num(1001)));
        assert!(change.alias().is_none());

        // Later rewrites leave the resolved target alone.
        change.replace_alias_with(AccountId::from_num(2002));
        assert_eq!(change.account_id(), Some(AccountId::from_num(1001)));
    }

    #[test]
    fn test_insufficient_codes_by_kind() {
        let payer = AccountId::from_num(2);
        assert_eq!(
            BalanceChange::payer_hbar_adjust(payer, -5).code_for_insufficient_balance(),
            ResponseCode::InsufficientPayerBalance
        );
        assert_eq!(
            BalanceChange::hbar_adjust(payer, -5).code_for_insufficient_balance(),
            ResponseCode::InsufficientAccountBalance
        );
        assert_eq!(
            BalanceChange::token_adjust(TokenId::from_num(9), payer, -5)
                .code_for_insufficient_balance(),
            ResponseCode::InsufficientTokenBalance
        );
    }

    #[test]
    fn test_nft_change_exposes_token_and_counterparty() {
        let nft = NftId::new(TokenId::from_num(9), 4);
        let change =
            BalanceChange::nft_transfer(nft, AccountId::from_num(3), AccountId::from_num(4));
        assert!(change.is_for_nft());
        assert!(!change.is_for_hbar());
        assert_eq!(change.token_id(), Some(TokenId::from_num(9)));
        assert_eq!(change.counter_party(), Some(AccountId::from_num(4)));
        assert_eq!(change.to_string(), "0.0.3 sends 0.0.9#4 to 0.0.4");
    }

    #[test]
    fn test_first_repeated_account_is_per_denomination() {
        let (alice, bob) = (AccountId::from_num(3), AccountId::from_num(4));
        let token = TokenId::from_num(9);
        let distinct = [
            BalanceChange::hbar_adjust(alice, -5),
            BalanceChange::hbar_adjust(bob, 5),
            BalanceChange::token_adjust(token, alice, -1),
            BalanceChange::token_adjust(token, bob, 1),
            BalanceChange::nft_transfer(NftId::new(token, 1), alice, bob),
            BalanceChange::nft_transfer(NftId::new(token, 2), alice, bob),
        ];
        assert_eq!(first_repeated_account(&distinct), None);

        let repeated = [
            BalanceChange::payer_hbar_adjust(alice, -5),
            BalanceChange::hbar_adjust(bob, 10),
            BalanceChange::hbar_adjust(alice, -5),
        ];
        assert_eq!(first_repeated_account(&repeated), Some(alice));
    }
}
