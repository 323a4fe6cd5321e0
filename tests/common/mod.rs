#![allow(dead_code)]

use hbar_transfer_core::application::auto_creation::AutoCreation;
use hbar_transfer_core::application::handler::TransactionHandler;
use hbar_transfer_core::domain::ids::{AccountId, Alias, NftId, TokenId};
use hbar_transfer_core::domain::key::PrimitiveKey;
use hbar_transfer_core::domain::records::FeeObject;
use hbar_transfer_core::infrastructure::in_memory::{
    FixedFeeCalculator, InMemoryAliasStore, SequentialIdSource,
};
use hbar_transfer_core::infrastructure::token_store::{LedgerTokenStore, TokenInfo, TokenKind};
use hbar_transfer_core::ledger::coordinator::Ledgers;
use hbar_transfer_core::ledger::entities::{
    Account, OwnedNfts, TokenRelKey, TokenRelationship, UniqueToken,
};
use std::io::Error;
use std::path::Path;

pub const TREASURY: AccountId = AccountId::from_num(2);
pub const ALICE: AccountId = AccountId::from_num(3);
pub const BOB: AccountId = AccountId::from_num(4);
pub const CAROL: AccountId = AccountId::from_num(5);
pub const FUNGIBLE: TokenId = TokenId::from_num(500);
pub const UNIQUE: TokenId = TokenId::from_num(600);
pub const FIRST_CREATED: u64 = 1001;
/// Total auto-creation fee: node 1, network 2, service 7.
pub const FEE: i64 = 10;

/// Committed contents of all four ledgers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub accounts: Vec<(AccountId, Account)>,
    pub token_rels: Vec<(TokenRelKey, TokenRelationship)>,
    pub nfts: Vec<(NftId, UniqueToken)>,
    pub owners: Vec<(AccountId, OwnedNfts)>,
}

pub fn snapshot(ledgers: &Ledgers) -> Snapshot {
    Snapshot {
        accounts: collect(ledgers.accounts.committed_entities()),
        token_rels: collect(ledgers.token_rels.committed_entities()),
        nfts: collect(ledgers.nfts.committed_entities()),
        owners: collect(ledgers.owners.committed_entities()),
    }
}

fn collect<'a, K: Clone + 'a, V: Clone + 'a>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Vec<(K, V)> {
    entries.map(|(k, v)| (k.clone(), v.clone())).collect()
}

pub fn alias_for(seed: u8) -> Alias {
    PrimitiveKey::Ed25519([seed; 32]).to_alias()
}

/// Alice holds hbar, fungible units and both NFT serials. Bob is associated
/// with both tokens. Carol has no relationships but one automatic
/// association slot.
pub fn seeded_ledgers() -> Ledgers {
    let mut ledgers = Ledgers::new();
    ledgers.accounts.put_committed(TREASURY, Account::default());
    ledgers.accounts.put_committed(
        ALICE,
        Account {
            balance: 1_000,
            tokens: [FUNGIBLE, UNIQUE].into(),
            num_nfts_owned: 2,
            ..Account::default()
        },
    );
    ledgers.accounts.put_committed(
        BOB,
        Account {
            balance: 500,
            tokens: [FUNGIBLE, UNIQUE].into(),
            ..Account::default()
        },
    );
    ledgers.accounts.put_committed(
        CAROL,
        Account {
            max_automatic_associations: 1,
            ..Account::default()
        },
    );

    let rel = |balance| TokenRelationship {
        balance,
        ..TokenRelationship::default()
    };
    ledgers
        .token_rels
        .put_committed(TokenRelKey::new(ALICE, FUNGIBLE), rel(100));
    ledgers
        .token_rels
        .put_committed(TokenRelKey::new(BOB, FUNGIBLE), rel(0));
    ledgers
        .token_rels
        .put_committed(TokenRelKey::new(ALICE, UNIQUE), rel(2));
    ledgers
        .token_rels
        .put_committed(TokenRelKey::new(BOB, UNIQUE), rel(0));

    let serials = [NftId::new(UNIQUE, 1), NftId::new(UNIQUE, 2)];
    for nft in serials {
        ledgers.nfts.put_committed(
            nft,
            UniqueToken {
                owner: ALICE,
                metadata: nft.serial.to_be_bytes().to_vec(),
            },
        );
    }
    ledgers.owners.put_committed(
        ALICE,
        OwnedNfts {
            nfts: serials.into(),
        },
    );
    ledgers
}

pub fn token_store() -> LedgerTokenStore {
    let mut store = LedgerTokenStore::new();
    store.register(
        FUNGIBLE,
        TokenInfo {
            kind: TokenKind::FungibleCommon,
            deleted: false,
        },
    );
    store.register(
        UNIQUE,
        TokenInfo {
            kind: TokenKind::NonFungibleUnique,
            deleted: false,
        },
    );
    store
}

pub fn handler() -> TransactionHandler {
    handler_with(seeded_ledgers())
}

pub fn handler_with(ledgers: Ledgers) -> TransactionHandler {
    TransactionHandler::new(
        ledgers,
        Box::new(token_store()),
        AutoCreation::new(
            Box::new(SequentialIdSource::starting_at(FIRST_CREATED)),
            Box::new(InMemoryAliasStore::new()),
            Box::new(FixedFeeCalculator::new(FeeObject::new(1, 2, 7))),
        ),
    )
}

pub fn committed_balance(handler: &TransactionHandler, account: AccountId) -> i64 {
    handler
        .ledgers()
        .accounts
        .committed(&account)
        .map(|a| a.balance)
        .unwrap_or_default()
}

pub fn write_csv(path: &Path, header: &[&str], rows: &[&[&str]]) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(*row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `txns` one-tinybar transfers from 0.0.3 to 0.0.4, with every
/// transaction's credit row placed after all of the debit rows.
pub fn generate_transfers_csv(path: &Path, txns: u64) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["txn", "target", "units"])?;
    for txn in 0..txns {
        wtr.write_record([txn.to_string().as_str(), "0.0.3", "-1"])?;
    }
    for txn in 0..txns {
        wtr.write_record([txn.to_string().as_str(), "0.0.4", "1"])?;
    }
    wtr.flush()?;
    Ok(())
}
