//! Application layer orchestrating crypto transfers.
//!
//! [`transfer::TransferLogic`] applies a single balance-change list against the
//! staged ledgers, creating accounts for alias credits through
//! [`auto_creation::AutoCreation`]. [`handler::TransactionHandler`] wraps it in
//! the begin/commit/rollback cycle of one top-level transaction.

pub mod auto_creation;
pub mod handler;
pub mod scoped_check;
pub mod transfer;
