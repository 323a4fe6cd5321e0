//! CSV adapters for the command-line front end.

pub mod account_writer;
pub mod genesis_reader;
pub mod transfer_reader;
