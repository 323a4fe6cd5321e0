//! Transactional keyed stores layered over a committed baseline.
//!
//! A [`StagedLedger`] holds the committed entities of one kind plus an overlay
//! of staged records. Each staged record remembers which properties were
//! touched and whether the key was created inside the open transaction, which
//! is what allows [`StagedLedger::undo_changes_of_type`] to revert a subset of
//! properties without disturbing the rest of the overlay.

pub mod coordinator;
pub mod entities;

use crate::domain::response::ResponseCode;
use crate::error::{LedgerError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// A fixed-shape record with an enumerable property schema.
pub trait Entity: Clone + Default + fmt::Debug {
    type Property: Copy + Ord + fmt::Debug;
    /// A typed write of exactly one property.
    type Change: fmt::Debug;

    fn property_of(change: &Self::Change) -> Self::Property;
    fn apply(&mut self, change: Self::Change);
    /// Copies `property` from `baseline` into `self`.
    fn restore(&mut self, baseline: &Self, property: Self::Property);
}

#[derive(Debug, Clone)]
struct Staged<V: Entity> {
    value: V,
    dirty: BTreeSet<V::Property>,
    created: bool,
}

#[derive(Debug, Clone)]
pub struct StagedLedger<K, V: Entity> {
    name: &'static str,
    committed: BTreeMap<K, V>,
    staged: BTreeMap<K, Staged<V>>,
    in_transaction: bool,
}

impl<K, V> StagedLedger<K, V>
where
    K: Ord + Clone + fmt::Display,
    V: Entity,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            committed: BTreeMap::new(),
            staged: BTreeMap::new(),
            in_transaction: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Writes straight into the baseline, bypassing staging. Used to seed state.
    pub fn put_committed(&mut self, key: K, value: V) {
        self.committed.insert(key, value);
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(LedgerError::AlreadyInTransaction(self.name));
        }
        self.in_transaction = true;
        debug!(ledger = self.name, "began transaction");
        Ok(())
    }

    pub fn is_in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn commit(&mut self) -> Result<()> {
        self.require_transaction()?;
        let staged = std::mem::take(&mut self.staged);
        let touched = staged.len();
        for (key, entry) in staged {
            self.committed.insert(key, entry.value);
        }
        self.in_transaction = false;
        debug!(ledger = self.name, touched, "committed transaction");
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.require_transaction()?;
        let discarded = self.staged.len();
        self.staged.clear();
        self.in_transaction = false;
        debug!(ledger = self.name, discarded, "rolled back transaction");
        Ok(())
    }

    pub fn exists(&self, key: &K) -> bool {
        self.staged.contains_key(key) || self.committed.contains_key(key)
    }

    /// The entity as the open transaction sees it.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.staged
            .get(key)
            .map(|entry| &entry.value)
            .or_else(|| self.committed.get(key))
    }

    pub fn committed(&self, key: &K) -> Option<&V> {
        self.committed.get(key)
    }

    pub fn committed_entities(&self) -> impl Iterator<Item = (&K, &V)> {
        self.committed.iter()
    }

    pub fn is_created(&self, key: &K) -> bool {
        self.staged.get(key).is_some_and(|entry| entry.created)
    }

    /// Keys with staged mutations or staged creation.
    pub fn changed_keys(&self) -> impl Iterator<Item = &K> {
        self.staged.keys()
    }

    pub fn staged_properties(&self, key: &K) -> Vec<V::Property> {
        self.staged
            .get(key)
            .map(|entry| entry.dirty.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn create(&mut self, key: K) -> Result<()> {
        self.require_transaction()?;
        if self.exists(&key) {
            return Err(LedgerError::DuplicateKey {
                ledger: self.name,
                key: key.to_string(),
            });
        }
        debug!(ledger = self.name, %key, "staged creation");
        self.staged.insert(
            key,
            Staged {
                value: V::default(),
                dirty: BTreeSet::new(),
                created: true,
            },
        );
        Ok(())
    }

    pub fn set(&mut self, key: &K, change: V::Change) -> Result<()> {
        self.require_transaction()?;
        if !self.staged.contains_key(key) {
            let baseline = self
                .committed
                .get(key)
                .cloned()
                .ok_or_else(|| LedgerError::MissingKey {
                    ledger: self.name,
                    key: key.to_string(),
                })?;
            self.staged.insert(
                key.clone(),
                Staged {
                    value: baseline,
                    dirty: BTreeSet::new(),
                    created: false,
                },
            );
        }
        if let Some(entry) = self.staged.get_mut(key) {
            entry.dirty.insert(V::property_of(&change));
            entry.value.apply(change);
        }
        Ok(())
    }

    /// Runs `check` against the entity as currently staged.
    pub fn validate<F>(&self, key: &K, check: F) -> ResponseCode
    where
        F: FnOnce(Option<&V>) -> ResponseCode,
    {
        check(self.get(key))
    }

    /// Reverts only `properties` on every staged key.
    ///
    /// Other staged properties on the same keys survive. A pre-existing key left
    /// with no staged properties drops out of the overlay.
    pub fn undo_changes_of_type(&mut self, properties: &[V::Property]) {
        let default = V::default();
        for (key, entry) in self.staged.iter_mut() {
            let baseline = self.committed.get(key).unwrap_or(&default);
            for property in properties {
                if entry.dirty.remove(property) {
                    entry.value.restore(baseline, *property);
                    debug!(ledger = self.name, %key, ?property, "undid staged property");
                }
            }
        }
        self.staged
            .retain(|_, entry| entry.created || !entry.dirty.is_empty());
    }

    /// Discards every key staged as brand-new.
    pub fn undo_creations(&mut self) {
        let name = self.name;
        self.staged.retain(|key, entry| {
            if entry.created {
                debug!(ledger = name, %key, "undid staged creation");
            }
            !entry.created
        });
    }

    fn require_transaction(&self) -> Result<()> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(LedgerError::NotInTransaction(self.name))
        }
    }
}
