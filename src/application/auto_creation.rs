use crate::domain::balance_change::BalanceChange;
use crate::domain::ids::{AccountId, Alias};
use crate::domain::key::PrimitiveKey;
use crate::domain::ports::{
    AliasStore, AliasStoreBox, FeeCalculatorBox, IdSourceBox, RecordsHistorian,
};
use crate::domain::records::{ChildRecord, SyntheticCreation, Timestamp};
use crate::domain::response::ResponseCode;
use crate::domain::side_effects::SideEffectsTracker;
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::AccountsLedger;
use crate::ledger::entities::AccountChange;
use tracing::{debug, info, warn};

pub const THREE_MONTHS_IN_SECONDS: u64 = 7_776_000;
pub const AUTO_MEMO: &str = "auto-created account";
/// Source id under which auto-creation child records are tracked.
pub const DEFAULT_SOURCE_ID: u32 = 0;

/// A provisional creation whose child record is released only on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreation {
    pub body: SyntheticCreation,
    pub record: ChildRecord,
}

/// Creates accounts for hbar transfers that target a previously unused alias.
pub struct AutoCreation {
    ids: IdSourceBox,
    aliases: AliasStoreBox,
    fee_calculator: FeeCalculatorBox,
    consensus_time: Timestamp,
    pending_creations: Vec<PendingCreation>,
    /// Aliases registered since the last reclaim or reset.
    registered_aliases: Vec<Alias>,
}

impl AutoCreation {
    pub fn new(ids: IdSourceBox, aliases: AliasStoreBox, fee_calculator: FeeCalculatorBox) -> Self {
        Self {
            ids,
            aliases,
            fee_calculator,
            consensus_time: Timestamp::default(),
            pending_creations: Vec::new(),
            registered_aliases: Vec::new(),
        }
    }

    pub fn set_consensus_time(&mut self, consensus_time: Timestamp) {
        self.consensus_time = consensus_time;
    }

    pub fn aliases(&self) -> &dyn AliasStore {
        self.aliases.as_ref()
    }

    pub fn aliases_mut(&mut self) -> &mut dyn AliasStore {
        self.aliases.as_mut()
    }

    pub fn pending_creations(&self) -> &[PendingCreation] {
        &self.pending_creations
    }

    /// Whether `alias` was registered since the last reclaim or reset.
    pub fn registered_since_reset(&self, alias: &Alias) -> bool {
        self.registered_aliases.contains(alias)
    }

    /// Clears provisional creations and their pending child records.
    ///
    /// Must run between top-level transactions, or child records leak into the
    /// next transaction's record stream.
    pub fn reset(&mut self) {
        self.pending_creations.clear();
        self.registered_aliases.clear();
    }

    /// Removes the aliases registered by provisional creations.
    ///
    /// Returns whether anything was removed; a second call after the same
    /// failure finds nothing left to remove.
    pub fn reclaim_pending_aliases(&mut self) -> bool {
        if self.registered_aliases.is_empty() {
            return false;
        }
        for alias in self.registered_aliases.drain(..) {
            if let Some(account) = self.aliases.remove(&alias) {
                warn!(%alias, %account, "reclaimed provisional alias");
            }
        }
        true
    }

    /// Hands every pending child record to `historian`, in creation order.
    pub fn submit_records_to(&self, historian: &mut dyn RecordsHistorian) {
        for pending in &self.pending_creations {
            historian.track_preceding_child_record(
                DEFAULT_SOURCE_ID,
                &pending.body,
                pending.record.clone(),
            );
        }
    }

    /// Provisionally creates the account behind `change`'s alias.
    ///
    /// On success the creation fee is deducted from the change's credit, the
    /// change now targets the new account, and the fee is returned. When this
    /// change is part of a zero-sum list the caller owes the fee to a funding
    /// account once the list has been applied. The new alias is tracked in
    /// `side_effects`.
    pub fn create(
        &mut self,
        change: &mut BalanceChange,
        accounts: &mut AccountsLedger,
        side_effects: &mut SideEffectsTracker,
    ) -> Result<(ResponseCode, u64)> {
        let alias = change.alias().cloned().ok_or_else(|| {
            LedgerError::IllegalState(format!("auto-creation requested for {change}"))
        })?;
        let key = match PrimitiveKey::from_alias(&alias) {
            Ok(key) => key,
            Err(e) => {
                debug!(%alias, error = %e, "alias is not a primitive key");
                return Ok((ResponseCode::InvalidKeyEncoding, 0));
            }
        };

        let body = synthetic_creation(key.clone());
        let fee = self.auto_creation_fee_for(&body, accounts)?;
        if i128::from(fee) > i128::from(change.units()) {
            debug!(%alias, fee, credit = change.units(), "credit cannot cover auto-creation");
            return Ok((change.code_for_insufficient_balance(), 0));
        }
        let charged = i64::try_from(fee)
            .map_err(|_| LedgerError::IllegalState(format!("fee {fee} exceeds i64")))?;
        change.adjust_units(-charged);
        change.set_new_balance(change.units());

        let created = self.ids.new_account_id(&body.payer)?;
        accounts.create(created)?;
        change.replace_alias_with(created);
        customize(accounts, &created, key, &alias)?;

        let record = successful_synthetic_record(created, &alias);
        self.pending_creations.push(PendingCreation { body, record });

        // Registered now; reclaim_pending_aliases() takes it back if the
        // transaction fails.
        self.aliases.register(alias.clone(), created);
        self.registered_aliases.push(alias.clone());
        side_effects.track_auto_creation(created, alias.clone());

        info!(%alias, account = %created, fee, "provisionally auto-created account");
        Ok((ResponseCode::Ok, fee))
    }

    fn auto_creation_fee_for(&self, body: &SyntheticCreation, view: &AccountsLedger) -> Result<u64> {
        let fees = self
            .fee_calculator
            .compute_fee(body, None, view, self.consensus_time)?;
        fees.total()
            .ok_or_else(|| LedgerError::FeeComputation(format!("fee components overflow: {fees:?}")))
    }
}

fn synthetic_creation(key: PrimitiveKey) -> SyntheticCreation {
    SyntheticCreation {
        payer: AccountId::default(),
        key,
        initial_balance: 0,
        auto_renew_period: THREE_MONTHS_IN_SECONDS,
        memo: AUTO_MEMO.to_string(),
    }
}

fn customize(
    accounts: &mut AccountsLedger,
    created: &AccountId,
    key: PrimitiveKey,
    alias: &Alias,
) -> Result<()> {
    accounts.set(created, AccountChange::Key(Some(key)))?;
    accounts.set(created, AccountChange::Memo(AUTO_MEMO.to_string()))?;
    accounts.set(created, AccountChange::AutoRenewPeriod(THREE_MONTHS_IN_SECONDS))?;
    accounts.set(created, AccountChange::ReceiverSigRequired(false))?;
    accounts.set(created, AccountChange::SmartContract(false))?;
    accounts.set(created, AccountChange::Alias(alias.clone()))
}

fn successful_synthetic_record(created: AccountId, alias: &Alias) -> ChildRecord {
    ChildRecord {
        status: ResponseCode::Success,
        memo: AUTO_MEMO.to_string(),
        created_account: created,
        alias: alias.clone(),
    }
}
