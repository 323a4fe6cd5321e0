use clap::Parser;
use hbar_transfer_core::application::auto_creation::AutoCreation;
use hbar_transfer_core::application::handler::{DEFAULT_FUNDING_ACCOUNT, TransactionHandler};
use hbar_transfer_core::domain::ids::AccountId;
use hbar_transfer_core::domain::ports::{AliasStoreBox, FeeCalculatorBox, IdSourceBox};
use hbar_transfer_core::domain::records::{FeeObject, Timestamp};
use hbar_transfer_core::domain::response::ResponseCode;
use hbar_transfer_core::infrastructure::in_memory::{
    FixedFeeCalculator, InMemoryAliasStore, SequentialIdSource,
};
use hbar_transfer_core::infrastructure::token_store::LedgerTokenStore;
use hbar_transfer_core::interfaces::csv::account_writer::AccountWriter;
use hbar_transfer_core::interfaces::csv::genesis_reader::GenesisReader;
use hbar_transfer_core::interfaces::csv::transfer_reader::TransferReader;
use hbar_transfer_core::ledger::coordinator::Ledgers;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input transfers CSV file (`txn,target,units`)
    transfers: PathBuf,

    /// Accounts to start from (`account,balance[,receiver_sig_required]`)
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Service component of the auto-creation fee, in tinybars
    #[arg(long, default_value_t = 1_000_000)]
    service_fee: u64,

    /// Network component of the auto-creation fee, in tinybars
    #[arg(long, default_value_t = 100_000)]
    network_fee: u64,

    /// Node component of the auto-creation fee, in tinybars
    #[arg(long, default_value_t = 50_000)]
    node_fee: u64,

    /// First account number handed to auto-created accounts
    #[arg(long, default_value_t = 1001)]
    first_account_num: u64,

    /// Account credited with auto-creation fees
    #[arg(long, default_value_t = DEFAULT_FUNDING_ACCOUNT)]
    funding_account: AccountId,

    /// Write one JSON transaction record per line to this file
    #[arg(long)]
    records: Option<PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();

    let mut ledgers = Ledgers::new();
    if let Some(genesis) = &cli.genesis {
        let file = File::open(genesis).into_diagnostic()?;
        let seeded = GenesisReader::new(file)
            .seed(&mut ledgers)
            .into_diagnostic()?;
        info!(seeded, "loaded genesis accounts");
    }

    let ids: IdSourceBox = Box::new(SequentialIdSource::starting_at(cli.first_account_num));
    let aliases: AliasStoreBox = Box::new(InMemoryAliasStore::new());
    let fees: FeeCalculatorBox = Box::new(FixedFeeCalculator::new(FeeObject::new(
        cli.node_fee,
        cli.network_fee,
        cli.service_fee,
    )));
    let mut handler = TransactionHandler::new(
        ledgers,
        Box::new(LedgerTokenStore::new()),
        AutoCreation::new(ids, aliases, fees),
    )
    .with_funding_account(cli.funding_account);

    let mut records = match &cli.records {
        Some(path) => Some(BufWriter::new(File::create(path).into_diagnostic()?)),
        None => None,
    };

    let file = File::open(&cli.transfers).into_diagnostic()?;
    let batches = TransferReader::new(file).batches().into_diagnostic()?;
    for (index, batch) in batches.into_iter().enumerate() {
        let consensus_time = Timestamp::new(i64::try_from(index).into_diagnostic()?, 0);
        let record = handler
            .handle(batch.changes, &batch.signers, consensus_time)
            .into_diagnostic()?;
        if record.status != ResponseCode::Success {
            warn!(txn = batch.txn, status = %record.status, "transfer rejected");
        }
        if let Some(out) = records.as_mut() {
            serde_json::to_writer(&mut *out, &record).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }
    if let Some(mut out) = records {
        out.flush().into_diagnostic()?;
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer
        .write_accounts(handler.ledgers().accounts.committed_entities())
        .into_diagnostic()?;

    Ok(())
}
