use crate::domain::ids::{AccountId, Alias};
use crate::domain::key::PrimitiveKey;
use crate::domain::ports::{AliasStore, FeeCalculator, IdSource, RecordsHistorian};
use crate::domain::records::{ChildRecord, FeeObject, SyntheticCreation, Timestamp};
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::AccountsLedger;
use std::collections::BTreeMap;

/// Alias map held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAliasStore {
    aliases: BTreeMap<Alias, AccountId>,
}

impl InMemoryAliasStore {
    /// Creates a new, empty alias store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AliasStore for InMemoryAliasStore {
    fn lookup(&self, alias: &Alias) -> Option<AccountId> {
        self.aliases.get(alias).copied()
    }

    fn register(&mut self, alias: Alias, account: AccountId) {
        self.aliases.insert(alias, account);
    }

    fn remove(&mut self, alias: &Alias) -> Option<AccountId> {
        self.aliases.remove(alias)
    }
}

/// Hands out account numbers in increasing order from a fixed starting point.
///
/// Two sources started at the same number hand out the same sequence, which is
/// what replaying a round relies on.
#[derive(Debug, Clone)]
pub struct SequentialIdSource {
    next: u64,
}

impl SequentialIdSource {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl IdSource for SequentialIdSource {
    fn new_account_id(&mut self, hint: &AccountId) -> Result<AccountId> {
        let num = self.next;
        self.next = num.checked_add(1).ok_or_else(|| {
            LedgerError::IdSourceExhausted(format!("no account numbers after {num}"))
        })?;
        Ok(AccountId::new(hint.shard, hint.realm, num))
    }
}

/// An id source for contexts where creating entities must be impossible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionalIdSource;

impl IdSource for ExceptionalIdSource {
    fn new_account_id(&mut self, _: &AccountId) -> Result<AccountId> {
        Err(LedgerError::IdSourceExhausted(
            "this context cannot create accounts".to_string(),
        ))
    }
}

/// Prices every auto-creation with the same fee components.
#[derive(Debug, Clone, Copy)]
pub struct FixedFeeCalculator {
    fees: FeeObject,
}

impl FixedFeeCalculator {
    pub fn new(fees: FeeObject) -> Self {
        Self { fees }
    }
}

impl FeeCalculator for FixedFeeCalculator {
    fn compute_fee(
        &self,
        _body: &SyntheticCreation,
        _payer_key: Option<&PrimitiveKey>,
        _view: &AccountsLedger,
        _consensus_time: Timestamp,
    ) -> Result<FeeObject> {
        Ok(self.fees)
    }
}

/// Keeps every preceding child record it is handed, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingHistorian {
    records: Vec<(u32, ChildRecord)>,
}

impl RecordingHistorian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[(u32, ChildRecord)] {
        &self.records
    }

    /// Takes the collected records, leaving the historian empty.
    pub fn drain(&mut self) -> Vec<ChildRecord> {
        self.records.drain(..).map(|(_, record)| record).collect()
    }
}

impl RecordsHistorian for RecordingHistorian {
    fn track_preceding_child_record(
        &mut self,
        source_id: u32,
        _body: &SyntheticCreation,
        record: ChildRecord,
    ) {
        self.records.push((source_id, record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_alias_store() {
        let mut store = InMemoryAliasStore::new();
        let alias = Alias::new(vec![1, 2]);
        store.register(alias.clone(), AccountId::from_num(5));

        assert_eq!(store.lookup(&alias), Some(AccountId::from_num(5)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&alias), Some(AccountId::from_num(5)));
        assert_eq!(store.remove(&alias), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sequential_ids_are_reproducible() {
        let hint = AccountId::default();
        let mut first = SequentialIdSource::starting_at(1001);
        let mut second = SequentialIdSource::starting_at(1001);
        for _ in 0..3 {
            assert_eq!(
                first.new_account_id(&hint).unwrap(),
                second.new_account_id(&hint).unwrap()
            );
        }
        assert_eq!(first.peek(), 1004);
    }

    #[test]
    fn test_sequential_ids_exhaust() {
        let mut source = SequentialIdSource::starting_at(u64::MAX);
        assert!(matches!(
            source.new_account_id(&AccountId::default()),
            Err(LedgerError::IdSourceExhausted(_))
        ));
    }

    #[test]
    fn test_exceptional_id_source_always_fails() {
        assert!(
            ExceptionalIdSource
                .new_account_id(&AccountId::default())
                .unwrap_err()
                .is_fatal()
        );
    }

    #[test]
    fn test_recording_historian_drains_in_order() {
        let mut historian = RecordingHistorian::new();
        let body = SyntheticCreation {
            payer: AccountId::default(),
            key: PrimitiveKey::Ed25519([9; 32]),
            initial_balance: 0,
            auto_renew_period: 1,
            memo: String::new(),
        };
        for num in [1001, 1002] {
            let record = ChildRecord {
                status: crate::domain::response::ResponseCode::Success,
                memo: String::new(),
                created_account: AccountId::from_num(num),
                alias: Alias::new(vec![num as u8]),
            };
            historian.track_preceding_child_record(0, &body, record);
        }

        assert_eq!(historian.records().len(), 2);
        let drained: Vec<_> = historian.drain().iter().map(|r| r.created_account.num).collect();
        assert_eq!(drained, vec![1001, 1002]);
        assert!(historian.records().is_empty());
    }
}
