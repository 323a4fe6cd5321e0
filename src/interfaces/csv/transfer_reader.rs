use crate::domain::balance_change::BalanceChange;
use crate::domain::ids::{AccountId, Alias};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// One `txn,target,units` line of a transfers file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferRow {
    pub txn: u64,
    pub target: String,
    pub units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransferTarget {
    Account(AccountId),
    Alias(Alias),
}

impl TransferTarget {
    /// `0x`-prefixed hex is an alias; anything else must be `shard.realm.num`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.starts_with("0x") {
            Ok(TransferTarget::Alias(s.parse()?))
        } else {
            Ok(TransferTarget::Account(s.parse()?))
        }
    }
}

/// The hbar transfer list of one transaction, netted per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    pub txn: u64,
    pub changes: Vec<BalanceChange>,
    /// Accounts debited by the batch; they are taken to have signed it.
    pub signers: Vec<AccountId>,
}

/// Reads hbar transfers from a CSV source.
///
/// Rows sharing a `txn` form one transaction. Transactions come out in the
/// order their first row appears.
pub struct TransferReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransferReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes the raw rows.
    pub fn rows(self) -> impl Iterator<Item = Result<TransferRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }

    /// Reads every row and groups them into batches.
    pub fn batches(self) -> Result<Vec<TransferBatch>> {
        let mut grouped: Vec<PendingBatch> = Vec::new();
        let mut by_txn: BTreeMap<u64, usize> = BTreeMap::new();
        for row in self.rows() {
            let row = row?;
            let target = TransferTarget::parse(&row.target)?;
            let slot = *by_txn.entry(row.txn).or_insert_with(|| {
                grouped.push(PendingBatch::new(row.txn));
                grouped.len() - 1
            });
            grouped[slot].net(target, row.units)?;
        }
        Ok(grouped.into_iter().map(PendingBatch::into_batch).collect())
    }
}

/// Rows of one transaction netted per target, in first-seen order.
struct PendingBatch {
    txn: u64,
    entries: Vec<(TransferTarget, i64)>,
    by_target: BTreeMap<TransferTarget, usize>,
}

impl PendingBatch {
    fn new(txn: u64) -> Self {
        Self {
            txn,
            entries: Vec::new(),
            by_target: BTreeMap::new(),
        }
    }

    fn net(&mut self, target: TransferTarget, units: i64) -> Result<()> {
        match self.by_target.get(&target) {
            Some(&slot) => {
                let total = &mut self.entries[slot].1;
                *total = total.checked_add(units).ok_or_else(|| {
                    LedgerError::ParseError(format!("units overflow for {target:?}"))
                })?;
            }
            None => {
                self.by_target.insert(target.clone(), self.entries.len());
                self.entries.push((target, units));
            }
        }
        Ok(())
    }

    fn into_batch(self) -> TransferBatch {
        to_batch(self.txn, self.entries)
    }
}

fn to_batch(txn: u64, entries: Vec<(TransferTarget, i64)>) -> TransferBatch {
    let mut changes = Vec::with_capacity(entries.len());
    let mut signers = Vec::new();
    for (target, units) in entries.into_iter().filter(|(_, units)| *units != 0) {
        match target {
            TransferTarget::Account(account) if units < 0 => {
                // The first debited account pays for the transaction.
                changes.push(if signers.is_empty() {
                    BalanceChange::payer_hbar_adjust(account, units)
                } else {
                    BalanceChange::hbar_adjust(account, units)
                });
                signers.push(account);
            }
            TransferTarget::Account(account) => {
                changes.push(BalanceChange::hbar_adjust(account, units));
            }
            TransferTarget::Alias(alias) => {
                changes.push(BalanceChange::alias_hbar_credit(alias, units));
            }
        }
    }
    TransferBatch {
        txn,
        changes,
        signers,
    }
}
