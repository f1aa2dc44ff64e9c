use std::{sync::Mutex, time::Duration};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

// Guarded by a mutex rather than a OnceLock because installation is fallible
// and OnceLock::get_or_try_init is still unstable. Installing the recorder a
// second time fails, and while production code initializes exactly once, the
// test suite goes through here once per spawned application.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Installs the global prometheus metrics recorder and returns a handle to it.
///
/// The handle can be used by the caller to render metrics in a /metrics
/// endpoint. Multiple threads can safely call this method to get a handle;
/// installation happens only once and cloned handles are returned to all
/// callers. A background task periodically runs upkeep on the collected
/// metrics to avoid unbounded memory growth.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE.lock().unwrap();

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let builder = PrometheusBuilder::new();

    let handle = builder.install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    let handle_clone = handle.clone();

    // Without periodic upkeep the recorder's histogram buffers grow without
    // bound.
    tokio::spawn(async move {
        let upkeep_interval = Duration::from_secs(5);
        loop {
            tokio::time::sleep(upkeep_interval).await;
            trace!("running metrics upkeep");
            handle_clone.run_upkeep();
        }
    });

    Ok(handle)
}
