use crate::application::auto_creation::AutoCreation;
use crate::domain::balance_change::{BalanceChange, first_repeated_account};
use crate::domain::ids::AccountId;
use crate::domain::ports::{ScopedCheck, TokenStore};
use crate::domain::response::ResponseCode;
use crate::domain::side_effects::SideEffectsTracker;
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::Ledgers;
use crate::ledger::entities::AccountChange;
use std::collections::BTreeSet;
use tracing::debug;

/// What a successful transfer leaves for the caller to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSummary {
    /// Fees deducted from alias credits; the caller owes them to a funding account.
    pub auto_creation_fee: u64,
}

/// Applies one list of balance changes atomically against the round's ledgers.
///
/// The caller must have begun the accounts ledger. On success every hbar
/// change is staged and tracked, and the caller decides whether to commit. On
/// an invalid change the token-side staging is unwound before returning, but
/// aliases registered by provisional creations stay registered until the
/// caller reclaims them.
pub struct TransferLogic<'a> {
    ledgers: &'a mut Ledgers,
    token_store: &'a mut dyn TokenStore,
    auto_creation: &'a mut AutoCreation,
    scoped_check: &'a dyn ScopedCheck,
    side_effects: &'a mut SideEffectsTracker,
}

impl<'a> TransferLogic<'a> {
    pub fn new(
        ledgers: &'a mut Ledgers,
        token_store: &'a mut dyn TokenStore,
        auto_creation: &'a mut AutoCreation,
        scoped_check: &'a dyn ScopedCheck,
        side_effects: &'a mut SideEffectsTracker,
    ) -> Self {
        Self {
            ledgers,
            token_store,
            auto_creation,
            scoped_check,
            side_effects,
        }
    }

    /// Validates `changes` in order, stopping at the first invalid one, then
    /// creates accounts for alias credits and stages the hbar adjustments.
    ///
    /// Each account may appear at most once per denomination, including
    /// accounts reached through an alias; a repeat fails the whole list with
    /// `ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS` before anything is staged.
    pub fn transfer(&mut self, changes: &mut [BalanceChange]) -> Result<TransferSummary> {
        if let Some(account) = first_repeated_account(changes) {
            debug!(%account, "account repeated in transfer list");
            return Err(LedgerError::InvalidTransaction(
                ResponseCode::AccountRepeatedInAccountAmounts,
            ));
        }

        let mut validity = ResponseCode::Ok;
        let mut awaiting_creation = Vec::new();

        for (index, change) in changes.iter_mut().enumerate() {
            validity = if change.creates_account() {
                awaiting_creation.push(index);
                ResponseCode::Ok
            } else if change.is_for_hbar() {
                self.validate_hbar(change)
            } else {
                self.token_store
                    .try_token_change(change, self.ledgers, self.side_effects)?
            };
            if !validity.is_ok() {
                debug!(%change, code = %validity, "balance change rejected");
                break;
            }
        }

        let mut auto_creation_fee = 0u64;
        if validity.is_ok() {
            let mut hbar_accounts: BTreeSet<AccountId> = changes
                .iter()
                .filter(|change| change.is_for_hbar())
                .filter_map(BalanceChange::account_id)
                .collect();
            for index in awaiting_creation {
                let (code, fee) = self.resolve_alias(&mut changes[index], &mut hbar_accounts)?;
                validity = code;
                if !validity.is_ok() {
                    debug!(change = %changes[index], code = %validity, "alias credit rejected");
                    break;
                }
                auto_creation_fee = auto_creation_fee.checked_add(fee).ok_or_else(|| {
                    LedgerError::FeeComputation("auto-creation fees overflow".to_string())
                })?;
            }
        }

        if !validity.is_ok() {
            self.drop_pending_token_changes()?;
            return Err(LedgerError::InvalidTransaction(validity));
        }

        for change in changes.iter().filter(|change| change.is_for_hbar()) {
            self.adjust_hbar_unchecked(change)?;
        }
        Ok(TransferSummary { auto_creation_fee })
    }

    /// Unwinds token-side staging and the tracked token effects.
    ///
    /// Unrelated account mutations staged earlier in the round survive.
    pub fn drop_pending_token_changes(&mut self) -> Result<()> {
        self.ledgers.drop_pending_token_changes()?;
        self.side_effects.reset_tracked_token_changes();
        Ok(())
    }

    fn validate_hbar(&self, change: &mut BalanceChange) -> ResponseCode {
        let Some(account) = change.account_id() else {
            return ResponseCode::InvalidAccountId;
        };
        let check = self.scoped_check;
        self.ledgers
            .accounts
            .validate(&account, |staged| check.check(staged, change))
    }

    /// Points an alias credit at its account, creating one if needed.
    ///
    /// `hbar_accounts` holds every account already credited or debited in
    /// hbar by the list; an alias landing on one of them is a repeat.
    fn resolve_alias(
        &mut self,
        change: &mut BalanceChange,
        hbar_accounts: &mut BTreeSet<AccountId>,
    ) -> Result<(ResponseCode, u64)> {
        let alias = change.alias().cloned().ok_or_else(|| {
            LedgerError::IllegalState(format!("{change} has no alias to resolve"))
        })?;
        if self.auto_creation.registered_since_reset(&alias) {
            return Ok((ResponseCode::AccountRepeatedInAccountAmounts, 0));
        }
        if let Some(existing) = self.auto_creation.aliases().lookup(&alias) {
            if !hbar_accounts.insert(existing) {
                return Ok((ResponseCode::AccountRepeatedInAccountAmounts, 0));
            }
            change.replace_alias_with(existing);
            return Ok((self.validate_hbar(change), 0));
        }

        let (code, fee) =
            self.auto_creation
                .create(change, &mut self.ledgers.accounts, self.side_effects)?;
        if let Some(created) = change.account_id() {
            hbar_accounts.insert(created);
        }
        Ok((code, fee))
    }

    fn adjust_hbar_unchecked(&mut self, change: &BalanceChange) -> Result<()> {
        let account = change.account_id().ok_or_else(|| {
            LedgerError::IllegalState(format!("{change} is still unresolved"))
        })?;
        self.ledgers
            .accounts
            .set(&account, AccountChange::Balance(change.new_balance()))?;
        self.side_effects.track_hbar_change(account, change.units());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scoped_check::AccountScopedCheck;
    use crate::domain::ids::{AccountId, Alias, TokenId};
    use crate::domain::key::PrimitiveKey;
    use crate::domain::records::FeeObject;
    use crate::infrastructure::in_memory::{
        FixedFeeCalculator, InMemoryAliasStore, SequentialIdSource,
    };
    use crate::infrastructure::token_store::{LedgerTokenStore, TokenInfo, TokenKind};
    use crate::ledger::entities::{Account, AccountProperty, TokenRelKey, TokenRelationship};

    const ALICE: AccountId = AccountId::from_num(3);
    const BOB: AccountId = AccountId::from_num(4);
    const CAROL: AccountId = AccountId::from_num(5);
    const FUNGIBLE: TokenId = TokenId::from_num(500);
    const FEE: u64 = 5;

    /// Token store that only counts how often it was consulted.
    #[derive(Default)]
    struct CountingTokenStore {
        calls: usize,
    }

    impl TokenStore for CountingTokenStore {
        fn try_token_change(
            &mut self,
            _: &BalanceChange,
            _: &mut Ledgers,
            _: &mut SideEffectsTracker,
        ) -> Result<ResponseCode> {
            self.calls += 1;
            Ok(ResponseCode::Ok)
        }
    }

    struct Fixture {
        ledgers: Ledgers,
        tokens: LedgerTokenStore,
        auto_creation: AutoCreation,
        check: AccountScopedCheck,
        tracker: SideEffectsTracker,
    }

    impl Fixture {
        fn new() -> Self {
            let mut ledgers = Ledgers::new();
            for (id, balance) in [(ALICE, 100), (BOB, 50)] {
                ledgers.accounts.put_committed(
                    id,
                    Account {
                        balance,
                        tokens: [FUNGIBLE].into(),
                        ..Account::default()
                    },
                );
            }
            ledgers.accounts.put_committed(
                CAROL,
                Account {
                    max_automatic_associations: 1,
                    ..Account::default()
                },
            );
            ledgers.token_rels.put_committed(
                TokenRelKey::new(ALICE, FUNGIBLE),
                TokenRelationship {
                    balance: 10,
                    ..TokenRelationship::default()
                },
            );
            ledgers
                .token_rels
                .put_committed(TokenRelKey::new(BOB, FUNGIBLE), TokenRelationship::default());
            ledgers.begin().unwrap();

            let mut tokens = LedgerTokenStore::new();
            tokens.register(
                FUNGIBLE,
                TokenInfo {
                    kind: TokenKind::FungibleCommon,
                    deleted: false,
                },
            );

            Self {
                ledgers,
                tokens,
                auto_creation: AutoCreation::new(
                    Box::new(SequentialIdSource::starting_at(1001)),
                    Box::new(InMemoryAliasStore::new()),
                    Box::new(FixedFeeCalculator::new(FeeObject::new(1, 1, FEE - 2))),
                ),
                check: AccountScopedCheck::new(),
                tracker: SideEffectsTracker::new(),
            }
        }

        fn transfer(&mut self, changes: &mut [BalanceChange]) -> Result<TransferSummary> {
            TransferLogic::new(
                &mut self.ledgers,
                &mut self.tokens,
                &mut self.auto_creation,
                &self.check,
                &mut self.tracker,
            )
            .transfer(changes)
        }

        fn balance(&self, id: AccountId) -> i64 {
            self.ledgers.accounts.get(&id).unwrap().balance
        }
    }

    fn alias_for(seed: u8) -> Alias {
        PrimitiveKey::Ed25519([seed; 32]).to_alias()
    }

    fn invalid_code(result: Result<TransferSummary>) -> ResponseCode {
        match result {
            Err(LedgerError::InvalidTransaction(code)) => code,
            other => panic!("expected an invalid transaction, got {other:?}"),
        }
    }

    #[test]
    fn test_hbar_transfer_stages_and_tracks() {
        let mut fixture = Fixture::new();
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -30),
            BalanceChange::hbar_adjust(BOB, 30),
        ];

        let summary = fixture.transfer(&mut changes).unwrap();

        assert_eq!(summary, TransferSummary::default());
        assert_eq!(fixture.balance(ALICE), 70);
        assert_eq!(fixture.balance(BOB), 80);
        assert_eq!(fixture.ledgers.accounts.committed(&ALICE).unwrap().balance, 100);
        assert_eq!(fixture.tracker.net_hbar_changes(), vec![(ALICE, -30), (BOB, 30)]);
    }

    #[test]
    fn test_token_transfer_preserves_zero_sum() {
        let mut fixture = Fixture::new();
        let mut changes = [
            BalanceChange::token_adjust(FUNGIBLE, ALICE, -4),
            BalanceChange::token_adjust(FUNGIBLE, BOB, 4),
        ];

        fixture.transfer(&mut changes).unwrap();

        let net: i64 = fixture
            .tracker
            .net_token_changes()
            .iter()
            .map(|(_, _, units)| units)
            .sum();
        assert_eq!(net, 0);
        let balance_of = |id: AccountId| {
            let rel = TokenRelKey::new(id, FUNGIBLE);
            fixture.ledgers.token_rels.get(&rel).unwrap().balance
        };
        assert_eq!((balance_of(ALICE), balance_of(BOB)), (6, 4));
    }

    #[test]
    fn test_stops_at_first_invalid_change() {
        let mut fixture = Fixture::new();
        let mut counting = CountingTokenStore::default();
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -500),
            BalanceChange::token_adjust(FUNGIBLE, BOB, 1),
        ];

        let result = TransferLogic::new(
            &mut fixture.ledgers,
            &mut counting,
            &mut fixture.auto_creation,
            &fixture.check,
            &mut fixture.tracker,
        )
        .transfer(&mut changes);

        assert_eq!(invalid_code(result), ResponseCode::InsufficientAccountBalance);
        assert_eq!(counting.calls, 0);
    }

    #[test]
    fn test_failure_unwinds_token_staging_but_keeps_unrelated_mutations() {
        let mut fixture = Fixture::new();
        fixture
            .ledgers
            .accounts
            .set(&CAROL, AccountChange::Memo("renamed".to_string()))
            .unwrap();
        let mut changes = [
            BalanceChange::token_adjust(FUNGIBLE, ALICE, -2),
            BalanceChange::token_adjust(FUNGIBLE, CAROL, 2),
            BalanceChange::hbar_adjust(BOB, -51),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(invalid_code(result), ResponseCode::InsufficientAccountBalance);
        assert!(!fixture.ledgers.token_rels.is_in_transaction());
        assert!(!fixture.ledgers.token_rels.exists(&TokenRelKey::new(CAROL, FUNGIBLE)));
        let carol = fixture.ledgers.accounts.get(&CAROL).unwrap();
        assert_eq!(carol.memo, "renamed");
        assert!(carol.tokens.is_empty());
        assert_eq!(carol.used_automatic_associations, 0);
        assert_eq!(
            fixture.ledgers.accounts.staged_properties(&CAROL),
            vec![AccountProperty::Memo]
        );
        assert!(fixture.tracker.net_token_changes().is_empty());
    }

    #[test]
    fn test_alias_credit_creates_account_after_validation() {
        let mut fixture = Fixture::new();
        let alias = alias_for(1);
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -40),
            BalanceChange::alias_hbar_credit(alias.clone(), 40),
        ];

        let summary = fixture.transfer(&mut changes).unwrap();

        let created = AccountId::from_num(1001);
        assert_eq!(summary.auto_creation_fee, FEE);
        assert_eq!(changes[1].account_id(), Some(created));
        assert_eq!(fixture.balance(created), 35);
        assert_eq!(fixture.balance(ALICE), 60);
        assert_eq!(fixture.tracker.new_aliases(), &[(alias, created)]);
        assert_eq!(fixture.auto_creation.pending_creations().len(), 1);
    }

    #[test]
    fn test_alias_credit_skipped_when_validation_failed() {
        let mut fixture = Fixture::new();
        let alias = alias_for(2);
        let mut changes = [
            BalanceChange::alias_hbar_credit(alias.clone(), 500),
            BalanceChange::hbar_adjust(ALICE, -500),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(invalid_code(result), ResponseCode::InsufficientAccountBalance);
        assert_eq!(fixture.auto_creation.aliases().lookup(&alias), None);
        assert!(fixture.auto_creation.pending_creations().is_empty());
    }

    #[test]
    fn test_later_creation_failure_unwinds_earlier_creation() {
        let mut fixture = Fixture::new();
        let good = alias_for(3);
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -50),
            BalanceChange::alias_hbar_credit(good.clone(), 40),
            BalanceChange::alias_hbar_credit(Alias::new(vec![0xff; 4]), 10),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(invalid_code(result), ResponseCode::InvalidKeyEncoding);
        assert!(!fixture.ledgers.accounts.exists(&AccountId::from_num(1001)));
        // The alias stays registered until the caller reclaims it.
        assert!(fixture.auto_creation.aliases().lookup(&good).is_some());
        assert!(fixture.auto_creation.reclaim_pending_aliases());
        assert_eq!(fixture.auto_creation.aliases().lookup(&good), None);
    }

    #[test]
    fn test_repeated_alias_in_one_list() {
        let mut fixture = Fixture::new();
        let alias = alias_for(4);
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -40),
            BalanceChange::alias_hbar_credit(alias.clone(), 20),
            BalanceChange::alias_hbar_credit(alias, 20),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(
            invalid_code(result),
            ResponseCode::AccountRepeatedInAccountAmounts
        );
    }

    #[test]
    fn test_known_alias_resolves_without_creating() {
        let mut fixture = Fixture::new();
        let alias = alias_for(5);
        fixture.auto_creation.aliases_mut().register(alias.clone(), BOB);
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -10),
            BalanceChange::alias_hbar_credit(alias, 10),
        ];

        let summary = fixture.transfer(&mut changes).unwrap();

        assert_eq!(summary.auto_creation_fee, 0);
        assert_eq!(changes[1].account_id(), Some(BOB));
        assert_eq!(fixture.balance(BOB), 60);
        assert!(fixture.auto_creation.pending_creations().is_empty());
    }

    #[test]
    fn test_repeated_hbar_account_is_rejected_before_staging() {
        let mut fixture = Fixture::new();
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -30),
            BalanceChange::hbar_adjust(ALICE, -30),
            BalanceChange::hbar_adjust(BOB, 60),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(
            invalid_code(result),
            ResponseCode::AccountRepeatedInAccountAmounts
        );
        assert_eq!(fixture.balance(ALICE), 100);
        assert_eq!(fixture.balance(BOB), 50);
        assert!(fixture.tracker.net_hbar_changes().is_empty());
    }

    #[test]
    fn test_known_alias_of_listed_account_is_repeated() {
        let mut fixture = Fixture::new();
        let alias = alias_for(6);
        fixture.auto_creation.aliases_mut().register(alias.clone(), BOB);
        let mut changes = [
            BalanceChange::hbar_adjust(ALICE, -20),
            BalanceChange::hbar_adjust(BOB, 10),
            BalanceChange::alias_hbar_credit(alias, 10),
        ];

        let result = fixture.transfer(&mut changes);

        assert_eq!(
            invalid_code(result),
            ResponseCode::AccountRepeatedInAccountAmounts
        );
        assert_eq!(fixture.balance(BOB), 50);
    }
}
