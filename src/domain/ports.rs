//! Collaborators the transfer core consumes but does not implement itself.

use super::balance_change::BalanceChange;
use super::ids::{AccountId, Alias};
use super::key::PrimitiveKey;
use super::records::{ChildRecord, FeeObject, SyntheticCreation, Timestamp};
use super::response::ResponseCode;
use super::side_effects::SideEffectsTracker;
use crate::error::Result;
use crate::ledger::coordinator::{AccountsLedger, Ledgers};
use crate::ledger::entities::Account;

/// Validates and stages token-denominated balance changes.
///
/// Implementations stage relationship and ownership mutations while they
/// validate, so a later failure in the same transfer must unwind them.
pub trait TokenStore {
    fn try_token_change(
        &mut self,
        change: &BalanceChange,
        ledgers: &mut Ledgers,
        tracker: &mut SideEffectsTracker,
    ) -> Result<ResponseCode>;
}

pub trait AliasStore {
    fn lookup(&self, alias: &Alias) -> Option<AccountId>;
    fn register(&mut self, alias: Alias, account: AccountId);
    fn remove(&mut self, alias: &Alias) -> Option<AccountId>;
}

/// Hands out new entity numbers; deterministic when replaying a round.
pub trait IdSource {
    fn new_account_id(&mut self, hint: &AccountId) -> Result<AccountId>;
}

pub trait FeeCalculator {
    fn compute_fee(
        &self,
        body: &SyntheticCreation,
        payer_key: Option<&PrimitiveKey>,
        view: &AccountsLedger,
        consensus_time: Timestamp,
    ) -> Result<FeeObject>;
}

pub trait RecordsHistorian {
    fn track_preceding_child_record(
        &mut self,
        source_id: u32,
        body: &SyntheticCreation,
        record: ChildRecord,
    );
}

/// Per-account check for hbar changes against a resolved target.
///
/// On success the check records the change's resulting balance.
pub trait ScopedCheck {
    fn check(&self, account: Option<&Account>, change: &mut BalanceChange) -> ResponseCode;
}

pub type TokenStoreBox = Box<dyn TokenStore>;
pub type AliasStoreBox = Box<dyn AliasStore>;
pub type IdSourceBox = Box<dyn IdSource>;
pub type FeeCalculatorBox = Box<dyn FeeCalculator>;
