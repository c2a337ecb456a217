use powbench_chain::{Chain, MiningSession, RandomTransactions, SessionConfig};
use powbench_core::{Address, BlockTemplate, Hash, Transaction};
use powbench_miner::{Miner, ParallelConfig, ParallelMiner, SequentialMiner};
use powbench_storage::{config_suffix, ChainDocument, Storage, StorageError};

fn config(blocks: usize) -> SessionConfig {
    SessionConfig {
        difficulty: 2,
        blocks,
        txs_per_block: 3,
        max_retries: 0,
    }
}

#[test]
fn test_scenario_block_validates_on_genesis_chain() {
    let mut chain = Chain::with_genesis_timestamp(1700000000.0);
    let sender = Address::from_hex(&"a".repeat(64)).unwrap();
    let recipient = Address::from_hex(&"b".repeat(64)).unwrap();
    let tx = Transaction::new(sender, recipient, 10.0, 1700000000.0).unwrap();
    let template = BlockTemplate::new(chain.tip_hash(), vec![tx], 1700000001.0);

    let outcome = SequentialMiner::default().mine(&template, 1).unwrap();
    assert!(outcome.block.hash.to_hex().starts_with('0'));
    chain.append(outcome.block, 1).unwrap();
    assert_eq!(chain.len(), 2);
}

#[test]
fn test_parallel_session_shares_sum_to_hundred() {
    let miner = ParallelMiner::new(ParallelConfig::with_workers(3)).unwrap();
    let session = MiningSession::new(config(3), &miner).unwrap();
    let mut chain = Chain::new();

    let report = session
        .run(&mut chain, &mut RandomTransactions::seeded(11))
        .unwrap();

    assert_eq!(chain.len(), 4);
    chain.verify(2).unwrap();
    for record in &report.blocks {
        let shares: Vec<_> = report.shares_for(record.block_number).collect();
        assert!(!shares.is_empty());
        let total: f64 = shares.iter().map(|s| s.percentage).sum();
        // Shares only cover workers that reported before the drain ended.
        assert!(total <= 100.0 + 1e-6);
        if shares.len() == 3 {
            assert!((total - 100.0).abs() < 1e-6);
        }
    }

    assert_eq!(report.worker_summary.len(), 3);
    let found: usize = report.worker_summary.iter().map(|w| w.blocks_found).sum();
    assert_eq!(found, 3);
    let attempts: u64 = report.worker_summary.iter().map(|w| w.total_attempts).sum();
    assert_eq!(attempts, report.total_nonces_tested);
}

#[test]
fn test_session_output_roundtrip_through_storage() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = Storage::open(tmp.path()).unwrap();
    let miner = SequentialMiner::default();
    let session = MiningSession::new(config(2), &miner).unwrap();
    let mut chain = Chain::new();

    let report = session
        .run(&mut chain, &mut RandomTransactions::seeded(5))
        .unwrap();
    let suffix = config_suffix(2, 2, 3, None);
    session
        .output(report)
        .save(&storage, &suffix, &chain.to_document())
        .unwrap();

    let path = storage.path("pow_blockchain_sequential_d2_b2_t3.json");
    let restored = Chain::load(&path).unwrap();
    assert_eq!(restored.blocks(), chain.blocks());
    restored.verify(2).unwrap();
    for block in restored.blocks() {
        assert_eq!(block.compute_hash(), block.hash);
    }
}

#[test]
fn test_tampered_chain_file_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("chain.json");
    let miner = SequentialMiner::default();
    let session = MiningSession::new(config(1), &miner).unwrap();
    let mut chain = Chain::new();
    session
        .run(&mut chain, &mut RandomTransactions::seeded(9))
        .unwrap();

    let mut doc = chain.to_document();
    doc.blocks[1].previous_hash = Hash::from_bytes([1; 32]);
    doc.save(&path).unwrap();

    assert!(matches!(
        ChainDocument::load(&path),
        Err(StorageError::HashMismatch { index: 1, .. })
    ));
    assert!(Chain::load(&path).is_err());
}
