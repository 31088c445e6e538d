//! Fixed metric catalog published by the exporter.
//!
//! Every metric the collector can emit is declared here once. Names are part
//! of the dashboard/alerting contract and must stay bit-exact.

/// Namespace prefix for every metric.
pub const NAMESPACE: &str = "goat";

/// Subsystem for the `eth_syncing` counters.
pub const SYNC_SUBSYSTEM: &str = "sync_progress";

/// Value type of a metric. The schema only publishes gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

/// Identity of a metric in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    BlockHeight,
    ChainId,
    SyncDone,
    SyncStartingBlock,
    SyncCurrentBlock,
    SyncHighestBlock,
    SyncPulledStates,
    SyncKnownStates,
    SyncSyncedAccounts,
    SyncSyncedAccountBytes,
    SyncSyncedBytecodes,
    SyncSyncedBytecodeBytes,
    SyncSyncedStorage,
    SyncSyncedStorageBytes,
    SyncHealedTrienodes,
    SyncHealedTrienodeBytes,
    SyncHealedBytecodes,
    SyncHealedBytecodeBytes,
    SyncHealingTrienodes,
    SyncHealingBytecode,
    SyncTxIndexFinishedBlocks,
    SyncTxIndexRemainingBlocks,
    SyncStateIndexRemaining,
}

impl Metric {
    /// Catalog order. Describe and render both follow it.
    pub const ALL: [Metric; 23] = [
        Metric::BlockHeight,
        Metric::ChainId,
        Metric::SyncDone,
        Metric::SyncStartingBlock,
        Metric::SyncCurrentBlock,
        Metric::SyncHighestBlock,
        Metric::SyncPulledStates,
        Metric::SyncKnownStates,
        Metric::SyncSyncedAccounts,
        Metric::SyncSyncedAccountBytes,
        Metric::SyncSyncedBytecodes,
        Metric::SyncSyncedBytecodeBytes,
        Metric::SyncSyncedStorage,
        Metric::SyncSyncedStorageBytes,
        Metric::SyncHealedTrienodes,
        Metric::SyncHealedTrienodeBytes,
        Metric::SyncHealedBytecodes,
        Metric::SyncHealedBytecodeBytes,
        Metric::SyncHealingTrienodes,
        Metric::SyncHealingBytecode,
        Metric::SyncTxIndexFinishedBlocks,
        Metric::SyncTxIndexRemainingBlocks,
        Metric::SyncStateIndexRemaining,
    ];

    fn subsystem(self) -> &'static str {
        match self {
            Metric::BlockHeight | Metric::ChainId => "",
            _ => SYNC_SUBSYSTEM,
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Metric::BlockHeight => "block_height",
            Metric::ChainId => "chain_id",
            Metric::SyncDone => "done",
            Metric::SyncStartingBlock => "starting_block",
            Metric::SyncCurrentBlock => "current_block",
            Metric::SyncHighestBlock => "highest_block",
            Metric::SyncPulledStates => "pulled_states",
            Metric::SyncKnownStates => "known_states",
            Metric::SyncSyncedAccounts => "synced_accounts",
            Metric::SyncSyncedAccountBytes => "synced_account_bytes",
            Metric::SyncSyncedBytecodes => "synced_bytecodes",
            Metric::SyncSyncedBytecodeBytes => "synced_bytecode_bytes",
            Metric::SyncSyncedStorage => "synced_storage",
            Metric::SyncSyncedStorageBytes => "synced_storage_bytes",
            Metric::SyncHealedTrienodes => "healed_trienodes",
            Metric::SyncHealedTrienodeBytes => "healed_trienode_bytes",
            Metric::SyncHealedBytecodes => "healed_bytecodes",
            Metric::SyncHealedBytecodeBytes => "healed_bytecode_bytes",
            Metric::SyncHealingTrienodes => "healing_trienodes",
            Metric::SyncHealingBytecode => "healing_bytecode",
            Metric::SyncTxIndexFinishedBlocks => "txindex_finished_blocks",
            Metric::SyncTxIndexRemainingBlocks => "txindex_remaining_blocks",
            Metric::SyncStateIndexRemaining => "state_index_remaining",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Metric::BlockHeight => "Current block height reported by the Goat network RPC node.",
            Metric::ChainId => "Chain ID reported by the Goat network RPC node.",
            Metric::SyncDone => "Whether the node has completed initial sync (1 when the node reports no active sync or the sync progress is complete).",
            Metric::SyncStartingBlock => "Block number where sync began.",
            Metric::SyncCurrentBlock => "Current block number where sync is at.",
            Metric::SyncHighestBlock => "Highest alleged block number in the chain.",
            Metric::SyncPulledStates => "Number of state trie entries already downloaded.",
            Metric::SyncKnownStates => "Total number of state trie entries known about.",
            Metric::SyncSyncedAccounts => "Number of accounts downloaded.",
            Metric::SyncSyncedAccountBytes => "Number of account trie bytes persisted to disk.",
            Metric::SyncSyncedBytecodes => "Number of bytecodes downloaded.",
            Metric::SyncSyncedBytecodeBytes => "Number of bytecode bytes downloaded.",
            Metric::SyncSyncedStorage => "Number of storage slots downloaded.",
            Metric::SyncSyncedStorageBytes => "Number of storage trie bytes persisted to disk.",
            Metric::SyncHealedTrienodes => "Number of state trie nodes downloaded.",
            Metric::SyncHealedTrienodeBytes => "Number of state trie bytes persisted to disk.",
            Metric::SyncHealedBytecodes => "Number of bytecodes downloaded during healing.",
            Metric::SyncHealedBytecodeBytes => "Number of bytecodes persisted to disk during healing.",
            Metric::SyncHealingTrienodes => "Number of state trie nodes pending.",
            Metric::SyncHealingBytecode => "Number of bytecodes pending.",
            Metric::SyncTxIndexFinishedBlocks => "Number of blocks whose transactions are already indexed.",
            Metric::SyncTxIndexRemainingBlocks => "Number of blocks whose transactions are not indexed yet.",
            Metric::SyncStateIndexRemaining => "Number of states remain unindexed.",
        }
    }
}

/// Name, help text and type of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub metric: Metric,
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
}

/// Join namespace, subsystem and name with `_`, skipping empty parts.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// The full descriptor catalog, built once and never mutated.
#[derive(Debug, Clone)]
pub struct MetricSchema {
    descriptors: Vec<Descriptor>,
}

impl MetricSchema {
    pub fn new() -> Self {
        let descriptors = Metric::ALL
            .iter()
            .map(|&metric| Descriptor {
                metric,
                name: fq_name(NAMESPACE, metric.subsystem(), metric.short_name()),
                help: metric.help(),
                kind: MetricKind::Gauge,
            })
            .collect();
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, metric: Metric) -> &Descriptor {
        // `descriptors` is built from `Metric::ALL`, whose order matches the
        // enum declaration order.
        &self.descriptors[metric as usize]
    }
}

impl Default for MetricSchema {
    fn default() -> Self {
        Self::new()
    }
}
