use std::collections::HashSet;

use metrics::{Label, counter, describe_counter};
use thiserror::Error;

/// Counter incremented once for every attempted deployment operation.
pub const DEPLOYMENT_ACCESS_TOTAL: &str = "deployment_access_total";
/// Counter incremented when a deployment operation fails against the cluster.
pub const DEPLOYMENT_ACCESS_FAILED_TOTAL: &str = "deployment_access_failed_total";

/// Label carrying the deployment identifier.
pub const LABEL_ID: &str = "id";
/// Label carrying the operation kind.
pub const LABEL_OPERATION: &str = "operation";

pub const OPERATION_CREATE: &str = "create";
pub const OPERATION_UPDATE: &str = "update";
pub const OPERATION_DELETE: &str = "delete";
pub const OPERATION_READ: &str = "read";

/// Errors emitted by a [`MetricsSink`].
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("counter metric not found: {0}")]
    CounterNotFound(String),
}

/// Sink receiving operation counters from the provisioning service.
///
/// Implementations must be cheap to call from request handling paths; the
/// provisioning service fires counters on every operation and does not block
/// on the outcome.
pub trait MetricsSink: Send + Sync {
    /// Increments the counter `name` by `amount` with the given labels.
    ///
    /// Fails when `name` does not refer to a registered counter.
    fn increase_counter(
        &self,
        name: &str,
        amount: u64,
        labels: &[(&'static str, String)],
    ) -> Result<(), MetricsError>;
}

/// [`MetricsSink`] forwarding counters to the global prometheus recorder.
pub struct PrometheusSink {
    counters: HashSet<&'static str>,
}

impl PrometheusSink {
    /// Registers the deployment counters and returns the sink.
    pub fn new() -> Self {
        describe_counter!(
            DEPLOYMENT_ACCESS_TOTAL,
            "External deployment operation requested"
        );
        describe_counter!(
            DEPLOYMENT_ACCESS_FAILED_TOTAL,
            "External deployment operation failed"
        );

        Self {
            counters: HashSet::from([DEPLOYMENT_ACCESS_TOTAL, DEPLOYMENT_ACCESS_FAILED_TOTAL]),
        }
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for PrometheusSink {
    fn increase_counter(
        &self,
        name: &str,
        amount: u64,
        labels: &[(&'static str, String)],
    ) -> Result<(), MetricsError> {
        if !self.counters.contains(name) {
            return Err(MetricsError::CounterNotFound(name.to_owned()));
        }

        let labels: Vec<Label> = labels
            .iter()
            .map(|(key, value)| Label::new(*key, value.clone()))
            .collect();
        counter!(name.to_owned(), labels).increment(amount);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::metrics::{DEPLOYMENT_ACCESS_TOTAL, MetricsError, MetricsSink, PrometheusSink};

    #[test]
    fn known_counter_is_accepted() {
        let sink = PrometheusSink::new();

        let result = sink.increase_counter(
            DEPLOYMENT_ACCESS_TOTAL,
            1,
            &[("id", "abc".to_owned()), ("operation", "create".to_owned())],
        );

        assert!(result.is_ok());
    }

    #[test]
    fn unknown_counter_is_rejected() {
        let sink = PrometheusSink::new();

        let result = sink.increase_counter("deployment_access_unknown", 1, &[]);

        assert!(matches!(result, Err(MetricsError::CounterNotFound(_))));
    }
}
