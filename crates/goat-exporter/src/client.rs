//! Node RPC client.
//!
//! [`NodeClient`] is the seam between the collector and the node: three
//! read calls and a release. [`RpcNodeClient`] implements it on top of an
//! `alloy` provider, which multiplexes concurrent requests over one
//! connection, so a single client can be shared by overlapping scrapes.
//!
//! Calls carry no deadline of their own. Every returned future is
//! cancel-safe: dropping it (e.g. from `tokio::time::timeout_at`) abandons
//! the in-flight request.

use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use alloy::primitives::U64;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use serde::Deserialize;

use crate::config::{redact_endpoint, validate_endpoint};
use crate::error::ExporterError;
use crate::schema::Metric;

/// Upper bound on establishing the initial connection.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Snap-sync progress counters as reported by `eth_syncing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncProgress {
    pub starting_block: u64,
    pub current_block: u64,
    pub highest_block: u64,
    pub pulled_states: u64,
    pub known_states: u64,
    pub synced_accounts: u64,
    pub synced_account_bytes: u64,
    pub synced_bytecodes: u64,
    pub synced_bytecode_bytes: u64,
    pub synced_storage: u64,
    pub synced_storage_bytes: u64,
    pub healed_trienodes: u64,
    pub healed_trienode_bytes: u64,
    pub healed_bytecodes: u64,
    pub healed_bytecode_bytes: u64,
    pub healing_trienodes: u64,
    pub healing_bytecode: u64,
    pub tx_index_finished_blocks: u64,
    pub tx_index_remaining_blocks: u64,
    pub state_index_remaining: u64,
}

impl SyncProgress {
    /// Chain caught up and both transaction and state indexing finished.
    pub fn is_done(&self) -> bool {
        if self.current_block < self.highest_block {
            return false;
        }
        self.tx_index_remaining_blocks == 0 && self.state_index_remaining == 0
    }

    /// Every counter paired with the metric it is published as, in catalog order.
    pub fn counters(&self) -> [(Metric, u64); 20] {
        [
            (Metric::SyncStartingBlock, self.starting_block),
            (Metric::SyncCurrentBlock, self.current_block),
            (Metric::SyncHighestBlock, self.highest_block),
            (Metric::SyncPulledStates, self.pulled_states),
            (Metric::SyncKnownStates, self.known_states),
            (Metric::SyncSyncedAccounts, self.synced_accounts),
            (Metric::SyncSyncedAccountBytes, self.synced_account_bytes),
            (Metric::SyncSyncedBytecodes, self.synced_bytecodes),
            (Metric::SyncSyncedBytecodeBytes, self.synced_bytecode_bytes),
            (Metric::SyncSyncedStorage, self.synced_storage),
            (Metric::SyncSyncedStorageBytes, self.synced_storage_bytes),
            (Metric::SyncHealedTrienodes, self.healed_trienodes),
            (Metric::SyncHealedTrienodeBytes, self.healed_trienode_bytes),
            (Metric::SyncHealedBytecodes, self.healed_bytecodes),
            (Metric::SyncHealedBytecodeBytes, self.healed_bytecode_bytes),
            (Metric::SyncHealingTrienodes, self.healing_trienodes),
            (Metric::SyncHealingBytecode, self.healing_bytecode),
            (Metric::SyncTxIndexFinishedBlocks, self.tx_index_finished_blocks),
            (Metric::SyncTxIndexRemainingBlocks, self.tx_index_remaining_blocks),
            (Metric::SyncStateIndexRemaining, self.state_index_remaining),
        ]
    }
}

/// Result of a successful `eth_syncing` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The node reports no active sync. This is the steady state.
    NotSyncing,
    Syncing(SyncProgress),
}

/// Read-only view of a node's RPC surface.
///
/// Implementations must be safe to call from concurrent scrapes.
pub trait NodeClient: Send + Sync {
    /// Current block number (`eth_blockNumber`).
    fn block_height(&self) -> impl Future<Output = Result<u64, ExporterError>> + Send;

    /// Chain identifier (`eth_chainId`).
    ///
    /// Exact up to `u64::MAX`; a larger wire value is reported as an RPC
    /// error, never truncated.
    fn chain_id(&self) -> impl Future<Output = Result<u64, ExporterError>> + Send;

    /// Sync progress snapshot (`eth_syncing`).
    fn sync_progress(&self) -> impl Future<Output = Result<SyncStatus, ExporterError>> + Send;

    /// Release the connection. Idempotent.
    fn close(&self);
}

/// [`NodeClient`] backed by an `alloy` provider over HTTP or WebSocket.
pub struct RpcNodeClient {
    endpoint: String,
    provider: RwLock<Option<DynProvider>>,
}

impl std::fmt::Debug for RpcNodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcNodeClient")
            .field("endpoint", &redact_endpoint(&self.endpoint))
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RpcNodeClient {
    /// Connect to `endpoint`, giving up after [`DIAL_TIMEOUT`].
    pub async fn connect(endpoint: &str) -> Result<Self, ExporterError> {
        Self::connect_with_timeout(endpoint, DIAL_TIMEOUT).await
    }

    /// Connect with a custom dial timeout.
    ///
    /// The endpoint is validated before any network I/O; a malformed one
    /// fails with [`ExporterError::Config`].
    pub async fn connect_with_timeout(
        endpoint: &str,
        dial_timeout: Duration,
    ) -> Result<Self, ExporterError> {
        let url = validate_endpoint(endpoint)?;

        let dial = ProviderBuilder::new().connect(url.as_str());
        let provider = tokio::time::timeout(dial_timeout, dial)
            .await
            .map_err(|_| {
                ExporterError::Connection(format!(
                    "dial {} timed out after {:?}",
                    redact_endpoint(endpoint),
                    dial_timeout
                ))
            })?
            .map_err(|e| ExporterError::Connection(format!("connect to rpc endpoint: {e}")))?;

        tracing::debug!(endpoint = %redact_endpoint(endpoint), "connected to rpc endpoint");

        Ok(Self {
            endpoint: endpoint.trim().to_string(),
            provider: RwLock::new(Some(provider.erased())),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Clone the provider handle out of the lock so no guard is held across `.await`.
    fn provider(&self) -> Result<DynProvider, ExporterError> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ExporterError::Connection("client closed".to_string()))
    }
}

impl NodeClient for RpcNodeClient {
    async fn block_height(&self) -> Result<u64, ExporterError> {
        let provider = self.provider()?;
        provider
            .get_block_number()
            .await
            .map_err(|e| ExporterError::Rpc(format!("eth_blockNumber: {e}")))
    }

    async fn chain_id(&self) -> Result<u64, ExporterError> {
        let provider = self.provider()?;
        provider
            .get_chain_id()
            .await
            .map_err(|e| ExporterError::Rpc(format!("eth_chainId: {e}")))
    }

    async fn sync_progress(&self) -> Result<SyncStatus, ExporterError> {
        let provider = self.provider()?;
        // Requested raw: alloy's typed `syncing()` drops the snap-sync counters.
        let status: Option<WireSyncStatus> = provider
            .client()
            .request_noparams("eth_syncing")
            .await
            .map_err(|e| ExporterError::Rpc(format!("eth_syncing: {e}")))?;
        Ok(WireSyncStatus::into_status(status))
    }

    fn close(&self) {
        let released = self
            .provider
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::info!(endpoint = %redact_endpoint(&self.endpoint), "released rpc connection");
        }
    }
}

/// `eth_syncing` response: a boolean, `null`, or an object of hex quantities.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSyncStatus {
    Flag(bool),
    Progress(WireSyncProgress),
}

impl WireSyncStatus {
    /// Only an object carries progress. Any boolean or `null` means not syncing,
    /// matching geth's `ethclient.SyncProgress`.
    fn into_status(wire: Option<Self>) -> SyncStatus {
        match wire {
            Some(WireSyncStatus::Progress(progress)) => SyncStatus::Syncing(progress.into()),
            Some(WireSyncStatus::Flag(_)) | None => SyncStatus::NotSyncing,
        }
    }
}

/// Field names follow geth. Missing fields (older nodes) decode as zero.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSyncProgress {
    starting_block: U64,
    current_block: U64,
    highest_block: U64,
    pulled_states: U64,
    known_states: U64,
    synced_accounts: U64,
    synced_account_bytes: U64,
    synced_bytecodes: U64,
    synced_bytecode_bytes: U64,
    synced_storage: U64,
    synced_storage_bytes: U64,
    healed_trienodes: U64,
    healed_trienode_bytes: U64,
    healed_bytecodes: U64,
    healed_bytecode_bytes: U64,
    healing_trienodes: U64,
    healing_bytecode: U64,
    tx_index_finished_blocks: U64,
    tx_index_remaining_blocks: U64,
    state_index_remaining: U64,
}

impl From<WireSyncProgress> for SyncProgress {
    fn from(w: WireSyncProgress) -> Self {
        Self {
            starting_block: w.starting_block.to(),
            current_block: w.current_block.to(),
            highest_block: w.highest_block.to(),
            pulled_states: w.pulled_states.to(),
            known_states: w.known_states.to(),
            synced_accounts: w.synced_accounts.to(),
            synced_account_bytes: w.synced_account_bytes.to(),
            synced_bytecodes: w.synced_bytecodes.to(),
            synced_bytecode_bytes: w.synced_bytecode_bytes.to(),
            synced_storage: w.synced_storage.to(),
            synced_storage_bytes: w.synced_storage_bytes.to(),
            healed_trienodes: w.healed_trienodes.to(),
            healed_trienode_bytes: w.healed_trienode_bytes.to(),
            healed_bytecodes: w.healed_bytecodes.to(),
            healed_bytecode_bytes: w.healed_bytecode_bytes.to(),
            healing_trienodes: w.healing_trienodes.to(),
            healing_bytecode: w.healing_bytecode.to(),
            tx_index_finished_blocks: w.tx_index_finished_blocks.to(),
            tx_index_remaining_blocks: w.tx_index_remaining_blocks.to(),
            state_index_remaining: w.state_index_remaining.to(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<SyncStatus, serde_json::Error> {
        let wire: Option<WireSyncStatus> = serde_json::from_str(json)?;
        Ok(WireSyncStatus::into_status(wire))
    }

    #[test]
    fn test_eth_syncing_false_is_not_syncing() {
        assert_eq!(decode("false").unwrap(), SyncStatus::NotSyncing);
    }

    #[test]
    fn test_eth_syncing_true_without_progress_is_not_syncing() {
        assert_eq!(decode("true").unwrap(), SyncStatus::NotSyncing);
    }

    #[test]
    fn test_eth_syncing_null_is_not_syncing() {
        assert_eq!(decode("null").unwrap(), SyncStatus::NotSyncing);
    }

    #[test]
    fn test_eth_syncing_garbage_is_an_error() {
        assert!(decode(r#""0x1""#).is_err());
        assert!(decode("42").is_err());
    }

    #[test]
    fn test_eth_syncing_progress_decodes_every_counter() {
        let json = r#"
        {
          "startingBlock": "0x1",
          "currentBlock": "0x2",
          "highestBlock": "0x3",
          "pulledStates": "0x4",
          "knownStates": "0x5",
          "syncedAccounts": "0x6",
          "syncedAccountBytes": "0x7",
          "syncedBytecodes": "0x8",
          "syncedBytecodeBytes": "0x9",
          "syncedStorage": "0xa",
          "syncedStorageBytes": "0xb",
          "healedTrienodes": "0xc",
          "healedTrienodeBytes": "0xd",
          "healedBytecodes": "0xe",
          "healedBytecodeBytes": "0xf",
          "healingTrienodes": "0x10",
          "healingBytecode": "0x11",
          "txIndexFinishedBlocks": "0x12",
          "txIndexRemainingBlocks": "0x13",
          "stateIndexRemaining": "0x14"
        }
        "#;

        let SyncStatus::Syncing(progress) = decode(json).unwrap() else {
            panic!("expected Syncing");
        };
        let values: Vec<u64> = progress.counters().iter().map(|(_, v)| *v).collect();
        assert_eq!(values, (1..=20).collect::<Vec<u64>>());
        assert!(!progress.is_done());
    }

    #[test]
    fn test_eth_syncing_missing_fields_default_to_zero() {
        let json = r#"{"startingBlock":"0x0","currentBlock":"0x64","highestBlock":"0xc8"}"#;
        let SyncStatus::Syncing(progress) = decode(json).unwrap() else {
            panic!("expected Syncing");
        };
        assert_eq!(progress.current_block, 100);
        assert_eq!(progress.highest_block, 200);
        assert_eq!(progress.pulled_states, 0);
        assert_eq!(progress.state_index_remaining, 0);
    }

    #[test]
    fn test_eth_syncing_large_quantity_is_exact() {
        let json = r#"{"highestBlock":"0xffffffffffffffff"}"#;
        let SyncStatus::Syncing(progress) = decode(json).unwrap() else {
            panic!("expected Syncing");
        };
        assert_eq!(progress.highest_block, u64::MAX);
    }

    #[test]
    fn test_is_done() {
        let caught_up = SyncProgress {
            current_block: 10,
            highest_block: 10,
            ..Default::default()
        };
        assert!(caught_up.is_done());

        let behind = SyncProgress {
            current_block: 9,
            highest_block: 10,
            ..Default::default()
        };
        assert!(!behind.is_done());

        let indexing = SyncProgress {
            current_block: 10,
            highest_block: 10,
            tx_index_remaining_blocks: 5,
            ..Default::default()
        };
        assert!(!indexing.is_done());

        let state_indexing = SyncProgress {
            current_block: 10,
            highest_block: 10,
            state_index_remaining: 1,
            ..Default::default()
        };
        assert!(!state_indexing.is_done());
    }

    #[test]
    fn test_counters_follow_catalog_order() {
        let metrics: Vec<Metric> = SyncProgress::default()
            .counters()
            .iter()
            .map(|(m, _)| *m)
            .collect();
        // Catalog order: block height, chain id, sync done, then the counters.
        assert_eq!(metrics.as_slice(), &Metric::ALL[3..]);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_endpoint_before_io() {
        for endpoint in ["", "   ", "not a url", "localhost:8545", "ftp://example.com"] {
            let err = RpcNodeClient::connect(endpoint).await.unwrap_err();
            assert!(matches!(err, ExporterError::Config(_)), "endpoint {endpoint:?}: {err}");
        }
    }

    #[tokio::test]
    async fn test_dial_timeout_yields_connection_error() {
        // Accepts TCP connections but never answers the websocket handshake.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = std::time::Instant::now();
        let endpoint = format!("ws://{addr}");
        let err = RpcNodeClient::connect_with_timeout(&endpoint, Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, ExporterError::Connection(_)), "{err}");
        assert!(err.to_string().contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
        silent.abort();
    }

    #[tokio::test]
    async fn test_unreachable_node_yields_rpc_error_and_close_is_idempotent() {
        let client = RpcNodeClient::connect("http://127.0.0.1:1").await.unwrap();
        assert!(!client.is_closed());

        let err = client.block_height().await.unwrap_err();
        assert!(matches!(err, ExporterError::Rpc(_)), "{err}");

        client.close();
        client.close();
        assert!(client.is_closed());

        let err = client.chain_id().await.unwrap_err();
        assert!(matches!(err, ExporterError::Connection(_)), "{err}");
    }
}
