use std::{sync::Arc, time::Duration};

use bitcoin::{hashes::Hash, BlockHash, Txid};
use rabbits_config::{RetryConfig, ScannerConfig};
use rabbits_db_store_sled::{open_sled_database, LedgerDBSled, SLED_NAME};
use rabbits_db_types::LedgerDatabase;
use rabbits_ledger::{Ledger, LedgerError, MemoryLedgerDb};
use rabbits_params::RewardParams;
use rabbits_primitives::{ScanBlock, ScanOutput, ScanTx, UtxoId};
use tokio::sync::watch;

use crate::{apply_block, test_utils::MemoryChainSource, ChainScanner, ScanError, ScannerState};

const BASE: u64 = 1_000_000;

fn params() -> RewardParams {
    RewardParams {
        min_zero_count: 5,
        base_reward: BASE,
        start_height: 0,
    }
}

fn config() -> ScannerConfig {
    ScannerConfig {
        start_height: None,
        poll_interval_secs: 1,
        prefetch_depth: 2,
        max_reorg_depth: 6,
        fetch_retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 1,
        },
    }
}

/// Txid whose displayed hex starts with exactly `zeros` zeros.
fn txid_with_zeros(zeros: u8, salt: u8) -> Txid {
    let mut bytes = [0xffu8; 32];
    bytes[0] = salt;
    let full = (zeros / 2) as usize;
    for b in bytes.iter_mut().rev().take(full) {
        *b = 0;
    }
    if zeros % 2 == 1 {
        bytes[31 - full] = 0x0f;
    }
    Txid::from_byte_array(bytes)
}

fn hash(height: u64, fork: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_le_bytes());
    bytes[8] = fork;
    BlockHash::from_byte_array(bytes)
}

fn coinbase(height: u64, fork: u8) -> ScanTx {
    let mut bytes = [0xffu8; 32];
    bytes[..8].copy_from_slice(&height.to_le_bytes());
    bytes[8] = fork;
    ScanTx::coinbase(
        Txid::from_byte_array(bytes),
        vec![ScanOutput::spendable(0, 50)],
    )
}

fn spend(txid: Txid, inputs: Vec<UtxoId>, outputs: Vec<ScanOutput>) -> ScanTx {
    ScanTx::new(txid, inputs, outputs)
}

fn funding() -> Vec<UtxoId> {
    vec![UtxoId::new(Txid::all_zeros(), 0)]
}

fn block(height: u64, fork: u8, parent_fork: u8, txs: Vec<ScanTx>) -> ScanBlock {
    let mut transactions = vec![coinbase(height, fork)];
    transactions.extend(txs);
    ScanBlock {
        height,
        block_hash: hash(height, fork),
        prev_block_hash: hash(height.wrapping_sub(1), parent_fork),
        transactions,
    }
}

/// Coinbase-only blocks `from..=to` on `fork`, the first one built on
/// `parent_fork`.
fn empty_chain(from: u64, to: u64, fork: u8, parent_fork: u8) -> Vec<ScanBlock> {
    (from..=to)
        .map(|h| block(h, fork, if h == from { parent_fork } else { fork }, vec![]))
        .collect()
}

fn memory_ledger(max_reorg_depth: u64) -> Arc<Ledger<MemoryLedgerDb>> {
    Arc::new(Ledger::open(Arc::new(MemoryLedgerDb::new()), max_reorg_depth).unwrap())
}

fn scanner<D: LedgerDatabase>(
    source: &Arc<MemoryChainSource>,
    ledger: &Arc<Ledger<D>>,
    config: ScannerConfig,
) -> ChainScanner<MemoryChainSource, D> {
    ChainScanner::new(source.clone(), ledger.clone(), params(), config)
}

fn no_stop() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Block 1 carries three eligible transactions with 7, 6 and 5 leading zeros.
fn rewarding_chain() -> Vec<ScanBlock> {
    let a = spend(
        txid_with_zeros(7, 1),
        funding(),
        vec![ScanOutput::spendable(0, 1000)],
    );
    let b = spend(
        txid_with_zeros(6, 2),
        funding(),
        vec![ScanOutput::spendable(0, 500), ScanOutput::spendable(1, 500)],
    );
    let c = spend(
        txid_with_zeros(5, 3),
        funding(),
        vec![ScanOutput::op_return(0), ScanOutput::spendable(1, 300)],
    );
    vec![block(0, 0, 0, vec![]), block(1, 0, 0, vec![a, b, c])]
}

#[tokio::test]
async fn test_scan_credits_rewards() {
    let source = Arc::new(MemoryChainSource::with_blocks(rewarding_chain()));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.blocks, 2);
    assert_eq!(report.reverted, 0);
    assert_eq!(report.tip, Some(1));
    assert!(!report.stopped);
    assert_eq!(report.issued, 1_000_000 + 62_500 + 3_906);
    assert_eq!(scanner.state(), ScannerState::Idle);

    let a = UtxoId::new(txid_with_zeros(7, 1), 0);
    let b0 = UtxoId::new(txid_with_zeros(6, 2), 0);
    let b1 = UtxoId::new(txid_with_zeros(6, 2), 1);
    let c1 = UtxoId::new(txid_with_zeros(5, 3), 1);
    assert_eq!(ledger.balance_of(&a).unwrap(), 1_000_000);
    assert_eq!(ledger.balance_of(&b0).unwrap(), 62_500);
    assert_eq!(ledger.balance_of(&b1).unwrap(), 0);
    assert_eq!(ledger.balance_of(&c1).unwrap(), 3_906);

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.supply, report.issued);
    assert_eq!(stats.utxo_count, 3);
    assert_eq!(stats.nice_hash_count, 3);
    assert_eq!(stats.max_zero_count, 7);
    assert_eq!(stats.last_height, Some(1));

    let summary = ledger.block_summary(1).unwrap().unwrap();
    assert_eq!(summary.max_zero_count, Some(7));
    assert_eq!(summary.nicest_txid(), Some(txid_with_zeros(7, 1)));
    assert_eq!(summary.rewarded_tx_count, 3);
    assert_eq!(summary.unknown_spends, 3);

    let latest = ledger.latest_nice_hashes(2).unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].txid(), txid_with_zeros(5, 3));
    assert_eq!(latest[1].txid(), txid_with_zeros(6, 2));
}

#[tokio::test]
async fn test_coinbase_is_never_rewarded() {
    let mut blk = block(
        0,
        0,
        0,
        vec![spend(
            txid_with_zeros(5, 1),
            funding(),
            vec![ScanOutput::spendable(0, 10)],
        )],
    );
    blk.transactions[0] =
        ScanTx::coinbase(txid_with_zeros(12, 9), vec![ScanOutput::spendable(0, 50)]);
    let source = Arc::new(MemoryChainSource::with_blocks([blk]));
    let ledger = memory_ledger(6);
    let (_stop_tx, stop) = no_stop();

    scanner(&source, &ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();

    // The coinbase does not raise the block maximum, so the only candidate
    // earns the full base reward.
    let tx = UtxoId::new(txid_with_zeros(5, 1), 0);
    let cb = UtxoId::new(txid_with_zeros(12, 9), 0);
    assert_eq!(ledger.balance_of(&tx).unwrap(), BASE);
    assert_eq!(ledger.balance_of(&cb).unwrap(), 0);
}

#[tokio::test]
async fn test_transfer_follows_spend() {
    let mut chain = rewarding_chain();
    let a = UtxoId::new(txid_with_zeros(7, 1), 0);
    let d = txid_with_zeros(0, 4);
    chain.push(block(
        2,
        0,
        0,
        vec![spend(
            d,
            vec![a],
            vec![
                ScanOutput::spendable(0, 100),
                ScanOutput::spendable(1, 300),
                ScanOutput::spendable(2, 50),
            ],
        )],
    ));
    let source = Arc::new(MemoryChainSource::with_blocks(chain));
    let ledger = memory_ledger(6);
    let (_stop_tx, stop) = no_stop();

    let report = scanner(&source, &ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();
    assert_eq!(report.blocks, 3);

    // The last spendable output is treated as change and excluded.
    assert_eq!(ledger.balance_of(&a).unwrap(), 0);
    assert_eq!(ledger.balance_of(&UtxoId::new(d, 0)).unwrap(), 250_000);
    assert_eq!(ledger.balance_of(&UtxoId::new(d, 1)).unwrap(), 750_000);
    assert_eq!(ledger.balance_of(&UtxoId::new(d, 2)).unwrap(), 0);
    assert_eq!(ledger.stats().unwrap().supply, report.issued);
}

#[tokio::test]
async fn test_spend_within_same_block_carries_reward() {
    let a = txid_with_zeros(6, 1);
    let e = txid_with_zeros(0, 2);
    let blk = block(
        0,
        0,
        0,
        vec![
            spend(a, funding(), vec![ScanOutput::spendable(0, 10)]),
            spend(
                e,
                vec![UtxoId::new(a, 0)],
                vec![ScanOutput::spendable(0, 9)],
            ),
        ],
    );
    let source = Arc::new(MemoryChainSource::with_blocks([blk]));
    let ledger = memory_ledger(6);
    let (_stop_tx, stop) = no_stop();

    scanner(&source, &ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();

    assert_eq!(ledger.balance_of(&UtxoId::new(a, 0)).unwrap(), 0);
    assert_eq!(ledger.balance_of(&UtxoId::new(e, 0)).unwrap(), BASE);
    assert_eq!(ledger.stats().unwrap().utxo_count, 1);
}

#[tokio::test]
async fn test_rescan_is_idempotent() {
    let source = Arc::new(MemoryChainSource::with_blocks(rewarding_chain()));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    scanner.scan_to_tip(&stop).await.unwrap();
    let stats = ledger.stats().unwrap();
    let balances = ledger.db().balances();

    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.blocks, 0);
    assert_eq!(report.tip, Some(1));

    let again = source.block(1).unwrap();
    assert_eq!(
        apply_block(&ledger, &again, &params()),
        Err(ScanError::Ledger(LedgerError::AlreadyCommitted(1)))
    );

    assert_eq!(ledger.stats().unwrap(), stats);
    assert_eq!(ledger.db().balances(), balances);
}

#[tokio::test]
async fn test_malformed_block_halts_scan() {
    let mut chain = empty_chain(0, 3, 0, 0);
    let good = chain[2].clone();
    chain[2]
        .transactions
        .push(ScanTx::coinbase(txid_with_zeros(0, 7), vec![ScanOutput::spendable(0, 1)]));
    let source = Arc::new(MemoryChainSource::with_blocks(chain));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert!(matches!(err, ScanError::MalformedBlock { height: 2, .. }));
    assert_eq!(ledger.tip().unwrap().unwrap().height, 1);
    assert!(ledger.block_summary(2).unwrap().is_none());
    assert_eq!(scanner.state(), ScannerState::Idle);

    // Once the source serves a valid block the scan resumes where it stopped.
    source.extend([good]);
    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.blocks, 2);
    assert_eq!(report.tip, Some(3));
}

#[test]
fn test_block_failing_midway_commits_nothing() {
    let params = RewardParams {
        base_reward: u64::MAX,
        ..params()
    };
    let ledger = memory_ledger(6);
    apply_block(&ledger, &block(0, 0, 0, vec![]), &params).unwrap();
    let stats = ledger.stats().unwrap();
    let balances = ledger.db().balances();

    // Each transaction alone is fine, together their issuance overflows.
    let a = spend(
        txid_with_zeros(6, 1),
        funding(),
        vec![ScanOutput::spendable(0, 10)],
    );
    let b = spend(
        txid_with_zeros(6, 2),
        funding(),
        vec![ScanOutput::spendable(0, 10)],
    );
    let err = apply_block(&ledger, &block(1, 0, 0, vec![a, b]), &params).unwrap_err();
    assert_eq!(
        err,
        ScanError::InvalidAmount("block issuance overflows".into())
    );

    assert_eq!(ledger.tip().unwrap().unwrap().height, 0);
    assert_eq!(ledger.stats().unwrap(), stats);
    assert_eq!(ledger.db().balances(), balances);
    assert!(ledger.block_summary(1).unwrap().is_none());
    assert!(ledger.reward_entries(1).unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_source_block_is_not_retried() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 3, 0, 0)));
    source.corrupt_block(2, "truncated transaction");
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert_eq!(
        err,
        ScanError::MalformedBlock {
            height: 2,
            reason: "truncated transaction".into(),
        }
    );
    assert_eq!(source.fetch_count(2), 1);
    assert_eq!(ledger.tip().unwrap().unwrap().height, 1);

    source.extend(empty_chain(2, 3, 0, 0));
    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.tip, Some(3));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 2, 0, 0)));
    source.fail_tip(2);
    source.fail_block(1, 3);
    let ledger = memory_ledger(6);
    let (_stop_tx, stop) = no_stop();

    let report = scanner(&source, &ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();
    assert_eq!(report.blocks, 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_error() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 3, 0, 0)));
    source.fail_block(2, 10);
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert!(matches!(
        err,
        ScanError::ChainSourceUnavailable {
            height: 2,
            attempts: 4,
            ..
        }
    ));
    assert_eq!(ledger.tip().unwrap().unwrap().height, 1);

    source.fail_tip(10);
    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert!(matches!(
        err,
        ScanError::ChainSourceUnavailable {
            height: 2,
            attempts: 4,
            ..
        }
    ));
}

#[tokio::test]
async fn test_reorg_reverts_and_follows_new_branch() {
    let a = txid_with_zeros(6, 1);
    let mut chain = empty_chain(0, 3, 0, 0);
    chain[2] = block(
        2,
        0,
        0,
        vec![spend(a, funding(), vec![ScanOutput::spendable(0, 10)])],
    );
    let source = Arc::new(MemoryChainSource::with_blocks(chain));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(ledger.balance_of(&UtxoId::new(a, 0)).unwrap(), BASE);

    // Fork off after block 1 and grow the new branch past the old tip.
    source.truncate(1);
    source.extend(empty_chain(2, 4, 1, 0));
    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.reverted, 2);
    assert_eq!(report.blocks, 3);
    assert_eq!(report.tip, Some(4));

    assert_eq!(ledger.balance_of(&UtxoId::new(a, 0)).unwrap(), 0);
    let stats = ledger.stats().unwrap();
    assert_eq!(stats.supply, 0);
    assert_eq!(stats.nice_hash_count, 0);
    assert_eq!(
        ledger.block_summary(2).unwrap().unwrap().blkid.to_block_hash(),
        hash(2, 1)
    );
    assert!(ledger.latest_nice_hashes(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_reorg_replacing_tip_at_same_height() {
    let a = txid_with_zeros(6, 1);
    let chain = vec![
        block(0, 0, 0, vec![]),
        block(
            1,
            0,
            0,
            vec![spend(a, funding(), vec![ScanOutput::spendable(0, 10)])],
        ),
    ];
    let source = Arc::new(MemoryChainSource::with_blocks(chain));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(ledger.balance_of(&UtxoId::new(a, 0)).unwrap(), BASE);

    // The chain does not grow, only the block at the ledger tip changes.
    source.extend([block(1, 1, 0, vec![])]);
    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.reverted, 1);
    assert_eq!(report.blocks, 1);
    assert_eq!(report.tip, Some(1));

    assert_eq!(ledger.balance_of(&UtxoId::new(a, 0)).unwrap(), 0);
    assert_eq!(ledger.tip().unwrap().unwrap().block_hash(), hash(1, 1));
    assert_eq!(ledger.stats().unwrap().supply, 0);
    assert!(ledger.latest_nice_hashes(10).unwrap().is_empty());

    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.reverted, 0);
    assert_eq!(report.blocks, 0);
}

#[tokio::test]
async fn test_tip_replacement_respects_reorg_window() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 1, 0, 0)));
    let ledger = memory_ledger(0);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    scanner.scan_to_tip(&stop).await.unwrap();
    source.extend([block(1, 1, 0, vec![])]);
    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert_eq!(
        err,
        ScanError::ReorgTooDeep {
            height: 1,
            max_depth: 0,
        }
    );
    assert_eq!(ledger.tip().unwrap().unwrap().block_hash(), hash(1, 0));
}

#[tokio::test]
async fn test_reorg_deeper_than_window_fails() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 5, 0, 0)));
    let ledger = memory_ledger(2);
    let scanner = scanner(&source, &ledger, config());
    let (_stop_tx, stop) = no_stop();

    scanner.scan_to_tip(&stop).await.unwrap();

    source.extend(empty_chain(2, 6, 1, 0));
    let err = scanner.scan_to_tip(&stop).await.unwrap_err();
    assert!(matches!(err, ScanError::ReorgTooDeep { max_depth: 2, .. }));
    assert_eq!(ledger.tip().unwrap().unwrap().height, 3);
}

#[tokio::test]
async fn test_stop_signal_ends_pass_between_blocks() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 5, 0, 0)));
    let ledger = memory_ledger(6);
    let scanner = scanner(&source, &ledger, config());
    let (stop_tx, stop) = no_stop();
    stop_tx.send(true).unwrap();

    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert!(report.stopped);
    assert_eq!(report.blocks, 0);
    assert!(ledger.tip().unwrap().is_none());
}

#[tokio::test]
async fn test_start_height_override() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 6, 0, 0)));
    let ledger = memory_ledger(6);
    let config = ScannerConfig {
        start_height: Some(5),
        ..config()
    };
    let scanner = scanner(&source, &ledger, config);
    assert_eq!(scanner.start_height(), 5);
    let (_stop_tx, stop) = no_stop();

    let report = scanner.scan_to_tip(&stop).await.unwrap();
    assert_eq!(report.blocks, 2);
    assert!(ledger.block_summary(4).unwrap().is_none());
    assert!(ledger.block_summary(5).unwrap().is_some());
}

#[tokio::test]
async fn test_long_chain_with_shallow_prefetch() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 49, 0, 0)));
    let ledger = memory_ledger(6);
    let config = ScannerConfig {
        prefetch_depth: 1,
        ..config()
    };
    let (_stop_tx, stop) = no_stop();

    let report = scanner(&source, &ledger, config)
        .scan_to_tip(&stop)
        .await
        .unwrap();
    assert_eq!(report.blocks, 50);
    assert_eq!(report.tip, Some(49));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_follows_new_blocks_until_stopped() {
    let source = Arc::new(MemoryChainSource::with_blocks(empty_chain(0, 2, 0, 0)));
    let ledger = memory_ledger(6);
    let scanner = Arc::new(scanner(&source, &ledger, config()));
    let (stop_tx, stop) = no_stop();

    let handle = tokio::spawn({
        let scanner = scanner.clone();
        async move { scanner.run(stop).await }
    });

    let wait_for_tip = |height: u64| {
        let ledger = ledger.clone();
        async move {
            for _ in 0..500 {
                if ledger.tip().unwrap().map(|t| t.height) == Some(height) {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            false
        }
    };

    assert!(wait_for_tip(2).await);
    source.extend(empty_chain(3, 3, 0, 0));
    assert!(wait_for_tip(3).await);

    stop_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
    assert_eq!(scanner.state(), ScannerState::Idle);
}

#[tokio::test]
async fn test_sled_ledger_matches_memory_ledger() {
    let source = Arc::new(MemoryChainSource::with_blocks(rewarding_chain()));
    let (_stop_tx, stop) = no_stop();

    let memory = memory_ledger(6);
    scanner(&source, &memory, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();

    let db = sled::Config::new().temporary(true).open().unwrap();
    let sled_ledger = Arc::new(Ledger::open(Arc::new(LedgerDBSled::new(db).unwrap()), 6).unwrap());
    scanner(&source, &sled_ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();

    assert_eq!(sled_ledger.stats().unwrap(), memory.stats().unwrap());
    for (utxo, amount) in memory.db().balances() {
        assert_eq!(sled_ledger.balance_of(&utxo).unwrap(), amount);
    }
    assert_eq!(
        sled_ledger.latest_nice_hashes(10).unwrap(),
        memory.latest_nice_hashes(10).unwrap()
    );
}

#[tokio::test]
async fn test_resume_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MemoryChainSource::with_blocks(rewarding_chain()));
    let (_stop_tx, stop) = no_stop();
    let a = UtxoId::new(txid_with_zeros(7, 1), 0);

    {
        let db = LedgerDBSled::new(open_sled_database(dir.path(), SLED_NAME).unwrap()).unwrap();
        let ledger = Arc::new(Ledger::open(Arc::new(db), 6).unwrap());
        let scanner = scanner(&source, &ledger, config());
        scanner.scan_to_tip(&stop).await.unwrap();
        drop(scanner);
        Arc::try_unwrap(ledger).unwrap().close().unwrap();
    }

    source.extend(empty_chain(2, 3, 0, 0));
    let db = LedgerDBSled::new(open_sled_database(dir.path(), SLED_NAME).unwrap()).unwrap();
    let ledger = Arc::new(Ledger::open(Arc::new(db), 6).unwrap());
    let report = scanner(&source, &ledger, config())
        .scan_to_tip(&stop)
        .await
        .unwrap();

    assert_eq!(report.blocks, 2);
    assert_eq!(report.tip, Some(3));
    assert_eq!(ledger.balance_of(&a).unwrap(), 1_000_000);
}
