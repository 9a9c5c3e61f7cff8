use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::debug;

/// Location of the sled database `dbname` under `datadir`.
pub fn sled_path(datadir: &Path, dbname: &str) -> PathBuf {
    datadir.join("sled").join(dbname)
}

/// Opens (creating if needed) the sled database `dbname` under `datadir`.
pub fn open_sled_database(datadir: &Path, dbname: &'static str) -> anyhow::Result<sled::Db> {
    let path = sled_path(datadir, dbname);
    fs::create_dir_all(&path)
        .with_context(|| format!("creating database dir {}", path.display()))?;

    debug!(path = %path.display(), "opening sled database");
    sled::open(&path).with_context(|| format!("opening sled database at {}", path.display()))
}
