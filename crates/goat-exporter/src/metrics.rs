use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::collector::Sample;
use crate::error::ExporterError;
use crate::schema::Descriptor;

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Encode one scrape's samples in the Prometheus text format.
///
/// Gauges are built in a throwaway registry per scrape so nothing survives
/// into the next one. Only samples whose descriptor is in `descriptors` are
/// rendered.
pub fn render(descriptors: &[Descriptor], samples: &[Sample<'_>]) -> Result<String, ExporterError> {
    let registry = Registry::new();

    for descriptor in descriptors {
        let Some(sample) = samples.iter().find(|s| s.descriptor.metric == descriptor.metric) else {
            continue;
        };
        let gauge = Gauge::with_opts(Opts::new(descriptor.name.clone(), descriptor.help))?;
        gauge.set(sample.value);
        registry.register(Box::new(gauge))?;
    }

    for sample in samples {
        if !descriptors.iter().any(|d| d.name == sample.descriptor.name) {
            tracing::warn!(metric = %sample.descriptor.name, "dropping sample without a registered descriptor");
        }
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;

    String::from_utf8(buffer)
        .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(format!("non-utf8 output: {e}"))))
}
