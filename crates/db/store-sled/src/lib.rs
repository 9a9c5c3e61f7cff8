//! Sled store for the balance ledger.

mod db;
mod init;
mod schemas;
mod utils;

pub use crate::{
    db::LedgerDBSled,
    init::{open_sled_database, sled_path},
};

pub const SLED_NAME: &str = "rabbits-ledger";
