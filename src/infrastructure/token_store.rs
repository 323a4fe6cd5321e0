use crate::domain::balance_change::{BalanceChange, Denomination};
use crate::domain::ids::{AccountId, NftId, TokenId};
use crate::domain::ports::TokenStore;
use crate::domain::response::ResponseCode;
use crate::domain::side_effects::SideEffectsTracker;
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::{Ledgers, open_if_idle};
use crate::ledger::entities::{AccountChange, NftChange, TokenRelChange, TokenRelKey};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    FungibleCommon,
    NonFungibleUnique,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub kind: TokenKind,
    pub deleted: bool,
}

/// Token store that validates against, and stages into, the round's ledgers.
#[derive(Debug, Default, Clone)]
pub struct LedgerTokenStore {
    tokens: BTreeMap<TokenId, TokenInfo>,
}

impl LedgerTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: TokenId, info: TokenInfo) {
        self.tokens.insert(token, info);
    }

    /// Makes `account` usable with `token`: the relationship must exist, or be
    /// creatable through one of the account's automatic association slots, and
    /// must not be frozen.
    fn ensure_usable(
        &self,
        ledgers: &mut Ledgers,
        account: AccountId,
        token: TokenId,
    ) -> Result<ResponseCode> {
        let Some(holder) = ledgers.accounts.get(&account) else {
            return Ok(ResponseCode::InvalidAccountId);
        };
        if holder.deleted {
            return Ok(ResponseCode::AccountDeleted);
        }

        let rel = TokenRelKey::new(account, token);
        if !ledgers.token_rels.exists(&rel) {
            if holder.max_automatic_associations == 0 {
                return Ok(ResponseCode::TokenNotAssociatedToAccount);
            }
            if holder.used_automatic_associations >= holder.max_automatic_associations {
                return Ok(ResponseCode::NoRemainingAutomaticAssociations);
            }
            let mut tokens = holder.tokens.clone();
            tokens.insert(token);
            let used = holder.used_automatic_associations + 1;

            open_if_idle(&mut ledgers.token_rels)?;
            ledgers.token_rels.create(rel)?;
            ledgers
                .token_rels
                .set(&rel, TokenRelChange::AutomaticAssociation(true))?;
            ledgers.token_rels.set(&rel, TokenRelChange::KycGranted(true))?;
            ledgers.accounts.set(&account, AccountChange::Tokens(tokens))?;
            ledgers
                .accounts
                .set(&account, AccountChange::UsedAutomaticAssociations(used))?;
            debug!(%account, %token, used, "automatically associated");
        }

        match ledgers.token_rels.get(&rel) {
            Some(status) if status.frozen => Ok(ResponseCode::AccountFrozenForToken),
            Some(_) => Ok(ResponseCode::Ok),
            None => Err(LedgerError::IllegalState(format!("relationship {rel} vanished"))),
        }
    }

    fn adjust_rel_balance(
        ledgers: &mut Ledgers,
        rel: &TokenRelKey,
        units: i64,
    ) -> Result<Option<i64>> {
        let current = ledgers.token_rels.get(rel).map(|r| r.balance).unwrap_or_default();
        let Some(updated) = current.checked_add(units).filter(|balance| *balance >= 0) else {
            return Ok(None);
        };
        open_if_idle(&mut ledgers.token_rels)?;
        ledgers.token_rels.set(rel, TokenRelChange::Balance(updated))?;
        Ok(Some(updated))
    }

    fn adjust_fungible(
        &self,
        change: &BalanceChange,
        token: TokenId,
        account: AccountId,
        ledgers: &mut Ledgers,
        tracker: &mut SideEffectsTracker,
    ) -> Result<ResponseCode> {
        let usable = self.ensure_usable(ledgers, account, token)?;
        if !usable.is_ok() {
            return Ok(usable);
        }
        let rel = TokenRelKey::new(account, token);
        if Self::adjust_rel_balance(ledgers, &rel, change.units())?.is_none() {
            return Ok(change.code_for_insufficient_balance());
        }
        tracker.track_token_units_change(token, account, change.units());
        Ok(ResponseCode::Ok)
    }

    fn change_owner(
        &self,
        nft: NftId,
        sender: AccountId,
        receiver: AccountId,
        ledgers: &mut Ledgers,
        tracker: &mut SideEffectsTracker,
    ) -> Result<ResponseCode> {
        match ledgers.nfts.get(&nft) {
            None => return Ok(ResponseCode::InvalidNftId),
            Some(unique) if unique.owner != sender => {
                return Ok(ResponseCode::SenderDoesNotOwnNftSerialNo);
            }
            Some(_) => {}
        }
        for party in [sender, receiver] {
            let usable = self.ensure_usable(ledgers, party, nft.token)?;
            if !usable.is_ok() {
                return Ok(usable);
            }
        }

        let sent = TokenRelKey::new(sender, nft.token);
        let received = TokenRelKey::new(receiver, nft.token);
        if Self::adjust_rel_balance(ledgers, &sent, -1)?.is_none() {
            return Ok(ResponseCode::InsufficientTokenBalance);
        }
        Self::adjust_rel_balance(ledgers, &received, 1)?;

        open_if_idle(&mut ledgers.nfts)?;
        ledgers.nfts.set(&nft, NftChange::Owner(receiver))?;
        self.adjust_nfts_owned(ledgers, sender, -1)?;
        self.adjust_nfts_owned(ledgers, receiver, 1)?;
        ledgers.reindex_owner(nft, sender, receiver)?;

        tracker.track_nft_ownership_change(nft, sender, receiver);
        Ok(ResponseCode::Ok)
    }

    fn adjust_nfts_owned(&self, ledgers: &mut Ledgers, account: AccountId, delta: i64) -> Result<()> {
        let owned = ledgers
            .accounts
            .get(&account)
            .map(|a| a.num_nfts_owned)
            .unwrap_or_default();
        let updated = owned.saturating_add_signed(delta);
        ledgers
            .accounts
            .set(&account, AccountChange::NumNftsOwned(updated))
    }
}

impl TokenStore for LedgerTokenStore {
    fn try_token_change(
        &mut self,
        change: &BalanceChange,
        ledgers: &mut Ledgers,
        tracker: &mut SideEffectsTracker,
    ) -> Result<ResponseCode> {
        let Some(token) = change.token_id() else {
            return Err(LedgerError::IllegalState(format!(
                "hbar change {change} sent to token store"
            )));
        };
        let Some(account) = change.account_id() else {
            return Ok(ResponseCode::InvalidAccountId);
        };
        let Some(info) = self.tokens.get(&token) else {
            return Ok(ResponseCode::InvalidTokenId);
        };
        if info.deleted {
            return Ok(ResponseCode::TokenWasDeleted);
        }

        match (change.denomination(), info.kind) {
            (Denomination::Fungible(_), TokenKind::FungibleCommon) => {
                self.adjust_fungible(change, token, account, ledgers, tracker)
            }
            (Denomination::Fungible(_), TokenKind::NonFungibleUnique) => {
                Ok(ResponseCode::AccountAmountTransfersOnlyAllowedForFungibleCommon)
            }
            (Denomination::Nft { nft, receiver }, TokenKind::NonFungibleUnique) => {
                self.change_owner(nft, account, receiver, ledgers, tracker)
            }
            (Denomination::Nft { .. }, TokenKind::FungibleCommon) => Ok(ResponseCode::InvalidNftId),
            (Denomination::Hbar, _) => Err(LedgerError::IllegalState(format!(
                "hbar change {change} sent to token store"
            ))),
        }
    }
}
