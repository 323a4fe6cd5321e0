use crate::domain::ids::AccountId;
use crate::error::Result;
use crate::ledger::entities::Account;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct AccountRow {
    account: String,
    balance: i64,
    alias: String,
}

/// Writes committed accounts as `account,balance,alias` rows.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one row per account, in the order given; an account without an
    /// alias gets an empty alias column.
    pub fn write_accounts<'a>(
        &mut self,
        accounts: impl IntoIterator<Item = (&'a AccountId, &'a Account)>,
    ) -> Result<()> {
        for (id, account) in accounts {
            let alias = if account.alias.is_empty() {
                String::new()
            } else {
                account.alias.to_string()
            };
            self.writer.serialize(AccountRow {
                account: id.to_string(),
                balance: account.balance,
                alias,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
