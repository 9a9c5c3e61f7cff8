pub(crate) mod balance;
pub(crate) mod nicehashes;
pub(crate) mod preview;
pub(crate) mod rollback;
pub(crate) mod scan;
pub(crate) mod stats;
