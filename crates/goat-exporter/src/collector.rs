//! Per-scrape collection of node metrics.
//!
//! A scrape runs three independent sub-operations (block height, chain id,
//! sync progress) concurrently under one shared deadline. A failed or timed
//! out sub-operation is logged and contributes no samples; the others are
//! unaffected. Nothing is cached between scrapes and no placeholder values
//! are ever emitted, so a missing sample always means "unknown this round".

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::client::{NodeClient, SyncStatus};
use crate::error::ExporterError;
use crate::schema::{Descriptor, Metric, MetricSchema};

/// Deadline for one scrape unless configured otherwise.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stand-in deadline when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One gauge value produced by a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub descriptor: &'a Descriptor,
    pub value: f64,
}

impl Sample<'_> {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

pub struct Collector<C> {
    client: C,
    endpoint: String,
    schema: MetricSchema,
    timeout: Duration,
}

impl<C: NodeClient> Collector<C> {
    /// `endpoint` is only used to label log lines; pass a redacted form.
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            schema: MetricSchema::new(),
            timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// The complete descriptor catalog. Identical on every call and
    /// independent of any scrape.
    pub fn describe(&self) -> &[Descriptor] {
        self.schema.descriptors()
    }

    /// Run one scrape and return the samples that succeeded, in catalog order.
    pub async fn collect(&self) -> Vec<Sample<'_>> {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.timeout)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);

        let (block_height, chain_id, sync_status) = tokio::join!(
            self.bounded(deadline, self.client.block_height()),
            self.bounded(deadline, self.client.chain_id()),
            self.bounded(deadline, self.client.sync_progress()),
        );

        let mut samples = Vec::with_capacity(self.schema.descriptors().len());

        match block_height {
            Ok(height) => samples.push(self.sample(Metric::BlockHeight, height as f64)),
            Err(e) => self.log_failure("fetch block number", &e),
        }

        match chain_id {
            Ok(id) => samples.push(self.sample(Metric::ChainId, id as f64)),
            Err(e) => self.log_failure("fetch chain id", &e),
        }

        match sync_status {
            // Other sync metrics are withheld, not zeroed: "no value" and
            // "value 0" mean different things to alerting rules.
            Ok(SyncStatus::NotSyncing) => samples.push(self.sample(Metric::SyncDone, 1.0)),
            Ok(SyncStatus::Syncing(progress)) => {
                let done = if progress.is_done() { 1.0 } else { 0.0 };
                samples.push(self.sample(Metric::SyncDone, done));
                // u64 -> f64 is exact up to 2^53.
                samples.extend(
                    progress
                        .counters()
                        .into_iter()
                        .map(|(metric, value)| self.sample(metric, value as f64)),
                );
            }
            Err(e) => self.log_failure("fetch sync progress", &e),
        }

        samples
    }

    /// Release the node connection. Safe to call more than once.
    pub fn close(&self) {
        self.client.close();
    }

    async fn bounded<T>(
        &self,
        deadline: Instant,
        call: impl Future<Output = Result<T, ExporterError>>,
    ) -> Result<T, ExporterError> {
        tokio::time::timeout_at(deadline, call)
            .await
            .unwrap_or_else(|_elapsed| Err(ExporterError::Timeout(self.timeout)))
    }

    fn sample(&self, metric: Metric, value: f64) -> Sample<'_> {
        Sample {
            descriptor: self.schema.descriptor(metric),
            value,
        }
    }

    fn log_failure(&self, operation: &str, error: &ExporterError) {
        tracing::error!(
            error = %error,
            endpoint = %self.endpoint,
            "{operation}"
        );
    }
}
