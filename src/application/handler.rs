use crate::application::auto_creation::AutoCreation;
use crate::application::scoped_check::AccountScopedCheck;
use crate::application::transfer::{TransferLogic, TransferSummary};
use crate::domain::balance_change::{BalanceChange, first_repeated_account};
use crate::domain::ids::{AccountId, TokenId};
use crate::domain::ports::{AliasStore, TokenStoreBox};
use crate::domain::records::{Timestamp, TransactionRecord};
use crate::domain::response::ResponseCode;
use crate::domain::side_effects::SideEffectsTracker;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::RecordingHistorian;
use crate::ledger::coordinator::Ledgers;
use crate::ledger::entities::AccountChange;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Account credited with the fees charged for auto-creations.
pub const DEFAULT_FUNDING_ACCOUNT: AccountId = AccountId::from_num(98);

/// Runs crypto transfers one at a time against a set of ledgers.
///
/// `TransactionHandler` owns the ledgers and every collaborator a transfer
/// needs. Each call to [`TransactionHandler::handle`] is one top-level
/// transaction: it either commits all of its effects or none of them.
pub struct TransactionHandler {
    ledgers: Ledgers,
    token_store: TokenStoreBox,
    auto_creation: AutoCreation,
    side_effects: SideEffectsTracker,
    historian: RecordingHistorian,
    funding_account: AccountId,
}

impl TransactionHandler {
    /// Creates a new `TransactionHandler`.
    ///
    /// # Arguments
    ///
    /// * `ledgers` - Committed state to run against; no ledger may be open.
    /// * `token_store` - Validates and stages token changes.
    /// * `auto_creation` - Creates accounts for credits to unknown aliases.
    pub fn new(ledgers: Ledgers, token_store: TokenStoreBox, auto_creation: AutoCreation) -> Self {
        Self {
            ledgers,
            token_store,
            auto_creation,
            side_effects: SideEffectsTracker::new(),
            historian: RecordingHistorian::new(),
            funding_account: DEFAULT_FUNDING_ACCOUNT,
        }
    }

    pub fn with_funding_account(mut self, funding_account: AccountId) -> Self {
        self.funding_account = funding_account;
        self
    }

    pub fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    pub fn aliases(&self) -> &dyn AliasStore {
        self.auto_creation.aliases()
    }

    /// Applies `changes` as one transaction signed by `signers`.
    ///
    /// A transaction that fails validation yields a record carrying the failure
    /// code and leaves committed state untouched. Any other error is returned
    /// after every open ledger has been rolled back.
    pub fn handle(
        &mut self,
        mut changes: Vec<BalanceChange>,
        signers: &[AccountId],
        consensus_time: Timestamp,
    ) -> Result<TransactionRecord> {
        self.auto_creation.reset();
        self.side_effects.reset();
        self.auto_creation.set_consensus_time(consensus_time);

        if !nets_to_zero(&changes) {
            warn!(%consensus_time, "transfer list does not net to zero");
            return Ok(TransactionRecord::failed(
                consensus_time,
                ResponseCode::InvalidAccountAmounts,
            ));
        }
        self.resolve_known_aliases(&mut changes);
        if let Some(account) = first_repeated_account(&changes) {
            warn!(%consensus_time, %account, "account repeated in transfer list");
            return Ok(TransactionRecord::failed(
                consensus_time,
                ResponseCode::AccountRepeatedInAccountAmounts,
            ));
        }

        self.ledgers.begin()?;
        let check = AccountScopedCheck::with_signers(signers.iter().copied());
        let outcome = self
            .run_transfer(&mut changes, &check)
            .and_then(|summary| {
                self.credit_funding_account(summary.auto_creation_fee)?;
                Ok(summary)
            });

        match outcome {
            Ok(summary) => self.finish(consensus_time, summary),
            Err(LedgerError::InvalidTransaction(code)) => {
                self.abort()?;
                warn!(%consensus_time, %code, "transaction failed");
                Ok(TransactionRecord::failed(consensus_time, code))
            }
            Err(e) => {
                if let Err(rollback) = self.abort() {
                    warn!(error = %rollback, "rollback after fatal error failed");
                }
                Err(e)
            }
        }
    }

    /// Takes back provisional aliases, then discards everything staged.
    fn abort(&mut self) -> Result<()> {
        self.auto_creation.reclaim_pending_aliases();
        self.ledgers.rollback_all()
    }

    fn run_transfer(
        &mut self,
        changes: &mut [BalanceChange],
        check: &AccountScopedCheck,
    ) -> Result<TransferSummary> {
        TransferLogic::new(
            &mut self.ledgers,
            self.token_store.as_mut(),
            &mut self.auto_creation,
            check,
            &mut self.side_effects,
        )
        .transfer(changes)
    }

    fn resolve_known_aliases(&self, changes: &mut [BalanceChange]) {
        for change in changes.iter_mut() {
            let known = change
                .alias()
                .and_then(|alias| self.auto_creation.aliases().lookup(alias));
            if let Some(account) = known {
                change.replace_alias_with(account);
            }
        }
    }

    fn credit_funding_account(&mut self, fee: u64) -> Result<()> {
        if fee == 0 {
            return Ok(());
        }
        let funding = self.funding_account;
        let amount = i64::try_from(fee)
            .map_err(|_| LedgerError::FeeComputation(format!("fee {fee} exceeds i64")))?;
        if !self.ledgers.accounts.exists(&funding) {
            self.ledgers.accounts.create(funding)?;
        }
        let balance = self
            .ledgers
            .accounts
            .get(&funding)
            .map(|account| account.balance)
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| {
                LedgerError::IllegalState(format!("funding account {funding} overflows"))
            })?;
        self.ledgers
            .accounts
            .set(&funding, AccountChange::Balance(balance))?;
        self.side_effects.track_hbar_change(funding, amount);
        Ok(())
    }

    fn finish(
        &mut self,
        consensus_time: Timestamp,
        summary: TransferSummary,
    ) -> Result<TransactionRecord> {
        self.ledgers.commit_all()?;
        if self.side_effects.has_tracked_auto_creation() {
            self.auto_creation.submit_records_to(&mut self.historian);
        }

        let record = TransactionRecord {
            consensus_time,
            status: ResponseCode::Success,
            hbar_transfers: self.side_effects.net_hbar_changes(),
            token_transfers: self.side_effects.net_token_changes(),
            nft_transfers: self.side_effects.ownership_changes().to_vec(),
            auto_creation_fee: summary.auto_creation_fee,
            child_records: self.historian.drain(),
        };
        info!(
            %consensus_time,
            hbar_transfers = record.hbar_transfers.len(),
            created = record.child_records.len(),
            fee = record.auto_creation_fee,
            "transaction succeeded"
        );
        Ok(record)
    }
}

/// Hbar and each fungible token must sum to zero; NFT moves carry no units.
fn nets_to_zero(changes: &[BalanceChange]) -> bool {
    let mut sums: BTreeMap<Option<TokenId>, i128> = BTreeMap::new();
    for change in changes.iter().filter(|change| !change.is_for_nft()) {
        *sums.entry(change.token_id()).or_default() += i128::from(change.units());
    }
    sums.values().all(|sum| *sum == 0)
}
