use crate::domain::response::ResponseCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The transaction failed validation; the code is the first non-OK outcome.
    #[error("transaction invalid: {0}")]
    InvalidTransaction(ResponseCode),
    #[error("{0} ledger is already in a transaction")]
    AlreadyInTransaction(&'static str),
    #[error("{0} ledger is not in a transaction")]
    NotInTransaction(&'static str),
    #[error("{ledger} ledger already contains {key}")]
    DuplicateKey { ledger: &'static str, key: String },
    #[error("{ledger} ledger has no entity {key}")]
    MissingKey { ledger: &'static str, key: String },
    #[error("account id source exhausted: {0}")]
    IdSourceExhausted(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("fee computation failed: {0}")]
    FeeComputation(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LedgerError {
    /// Everything except a modelled validation failure indicates a bug or
    /// resource exhaustion and must not be swallowed by the transaction handler.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LedgerError::InvalidTransaction(_))
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            LedgerError::InvalidTransaction(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
