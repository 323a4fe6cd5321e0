use crate::domain::ids::AccountId;
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::Ledgers;
use crate::ledger::entities::Account;
use serde::Deserialize;
use std::io::Read;

/// One `account,balance[,receiver_sig_required]` line of a genesis file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisRow {
    pub account: String,
    pub balance: i64,
    #[serde(default)]
    pub receiver_sig_required: bool,
}

/// Reads the accounts a round starts from.
pub struct GenesisReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> GenesisReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Writes every row into the committed accounts of `ledgers`.
    ///
    /// Returns the number of accounts seeded.
    pub fn seed(self, ledgers: &mut Ledgers) -> Result<usize> {
        let mut seeded = 0;
        for row in self.reader.into_deserialize::<GenesisRow>() {
            let row = row?;
            if row.balance < 0 {
                return Err(LedgerError::ParseError(format!(
                    "negative genesis balance for {}",
                    row.account
                )));
            }
            let id: AccountId = row.account.parse()?;
            ledgers.accounts.put_committed(
                id,
                Account {
                    balance: row.balance,
                    receiver_sig_required: row.receiver_sig_required,
                    ..Account::default()
                },
            );
            seeded += 1;
        }
        Ok(seeded)
    }
}
