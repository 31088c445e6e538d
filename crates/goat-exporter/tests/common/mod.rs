#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use goat_exporter::{ExporterError, NodeClient, SyncProgress, SyncStatus};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Scripted answer for one stub RPC method.
#[derive(Clone, Copy)]
pub enum Reply<T> {
    Value(T),
    Fail,
    /// Never resolves; only a deadline ends it.
    Hang,
}

pub struct StubClient {
    pub height: Reply<u64>,
    pub chain: Reply<u64>,
    pub sync: Reply<SyncStatus>,
    pub calls: AtomicUsize,
    pub closes: AtomicUsize,
}

impl StubClient {
    pub fn new(height: Reply<u64>, chain: Reply<u64>, sync: Reply<SyncStatus>) -> Self {
        Self {
            height,
            chain,
            sync,
            calls: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    /// Height 100, chain 2345, not syncing.
    pub fn healthy() -> Self {
        Self::new(
            Reply::Value(100),
            Reply::Value(2345),
            Reply::Value(SyncStatus::NotSyncing),
        )
    }

    async fn answer<T: Copy>(&self, reply: &Reply<T>, method: &str) -> Result<T, ExporterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match reply {
            Reply::Value(v) => Ok(*v),
            Reply::Fail => Err(ExporterError::Rpc(format!("{method}: stub failure"))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

impl NodeClient for StubClient {
    async fn block_height(&self) -> Result<u64, ExporterError> {
        self.answer(&self.height, "eth_blockNumber").await
    }

    async fn chain_id(&self) -> Result<u64, ExporterError> {
        self.answer(&self.chain, "eth_chainId").await
    }

    async fn sync_progress(&self) -> Result<SyncStatus, ExporterError> {
        self.answer(&self.sync, "eth_syncing").await
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A mid-sync snapshot with distinct, non-trivial counter values.
pub fn syncing_progress() -> SyncProgress {
    SyncProgress {
        starting_block: 1_000,
        current_block: 5_000,
        highest_block: 9_000,
        pulled_states: 11,
        known_states: 12,
        synced_accounts: 13,
        synced_account_bytes: 14,
        synced_bytecodes: 15,
        synced_bytecode_bytes: 16,
        synced_storage: 17,
        synced_storage_bytes: 18,
        healed_trienodes: 19,
        healed_trienode_bytes: 20,
        healed_bytecodes: 21,
        healed_bytecode_bytes: 22,
        healing_trienodes: 23,
        healing_bytecode: 24,
        tx_index_finished_blocks: 25,
        tx_index_remaining_blocks: 26,
        state_index_remaining: 27,
    }
}

/// Counts ERROR-level events emitted while installed.
pub struct ErrorCounter(pub Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
