use crate::domain::balance_change::BalanceChange;
use crate::domain::ids::AccountId;
use crate::domain::ports::ScopedCheck;
use crate::domain::response::ResponseCode;
use crate::ledger::entities::Account;
use std::collections::BTreeSet;

/// Checks an hbar change against the account it targets.
///
/// `signers` are the accounts whose keys signed the enclosing transaction;
/// a credit to an account that requires receiver signatures needs one of them.
#[derive(Debug, Clone, Default)]
pub struct AccountScopedCheck {
    signers: BTreeSet<AccountId>,
}

impl AccountScopedCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signers(signers: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            signers: signers.into_iter().collect(),
        }
    }
}

impl ScopedCheck for AccountScopedCheck {
    fn check(&self, account: Option<&Account>, change: &mut BalanceChange) -> ResponseCode {
        let (Some(account), Some(id)) = (account, change.account_id()) else {
            return ResponseCode::InvalidAccountId;
        };
        if account.deleted {
            return ResponseCode::AccountDeleted;
        }
        if account.detached {
            return ResponseCode::AccountExpiredAndPendingRemoval;
        }
        if change.units() > 0 && account.receiver_sig_required && !self.signers.contains(&id) {
            return ResponseCode::InvalidSignature;
        }

        let Some(new_balance) = account.balance.checked_add(change.units()) else {
            return ResponseCode::InvalidAccountAmounts;
        };
        if new_balance < 0 {
            return change.code_for_insufficient_balance();
        }
        change.set_new_balance(new_balance);
        ResponseCode::Ok
    }
}
