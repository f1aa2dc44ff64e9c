use std::sync::Mutex;

use pgdeploy_api::metrics::{LABEL_OPERATION, MetricsError, MetricsSink};

/// One counter increment as seen by the sink.
#[derive(Debug, Clone)]
pub struct RecordedCounter {
    pub name: String,
    pub amount: u64,
    pub labels: Vec<(&'static str, String)>,
}

/// [`MetricsSink`] keeping every increment in memory for assertions.
#[derive(Default)]
pub struct RecordingMetricsSink {
    counters: Mutex<Vec<RecordedCounter>>,
}

impl RecordingMetricsSink {
    /// Sum of increments for `name` whose `operation` label matches.
    pub fn count(&self, name: &str, operation: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .filter(|counter| {
                counter.name == name
                    && counter
                        .labels
                        .iter()
                        .any(|(key, value)| *key == LABEL_OPERATION && value == operation)
            })
            .map(|counter| counter.amount)
            .sum()
    }

    pub fn recorded(&self) -> Vec<RecordedCounter> {
        self.counters.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn increase_counter(
        &self,
        name: &str,
        amount: u64,
        labels: &[(&'static str, String)],
    ) -> Result<(), MetricsError> {
        self.counters.lock().unwrap().push(RecordedCounter {
            name: name.to_owned(),
            amount,
            labels: labels.to_vec(),
        });

        Ok(())
    }
}
