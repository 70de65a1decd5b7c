use std::env;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn resolve_port(port_env: &str, default_port: u16) -> u16 {
    env::var(port_env)
        .ok()
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .unwrap_or(default_port)
}

/// Install the global Prometheus recorder and serve it on `0.0.0.0:<port>`.
///
/// The port comes from `port_env` or `default_port`. Must run inside a Tokio
/// runtime; the exporter is spawned onto it. Later calls return the handle
/// from the first successful one.
pub fn init_metrics(port_env: &str, default_port: u16) -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    let port = resolve_port(port_env, default_port);
    let (recorder, exporter) = match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .build()
    {
        Ok(parts) => parts,
        Err(err) => {
            warn!(error = %err, metrics_port = port, "failed to build prometheus exporter");
            return None;
        }
    };

    let handle = recorder.handle();
    if let Err(err) = metrics::set_global_recorder(recorder) {
        warn!(error = %err, "a metrics recorder is already installed");
        return None;
    }

    tokio::spawn(async move {
        if let Err(_err) = exporter.await {
            warn!("prometheus exporter stopped");
        }
    });

    let _ = PROMETHEUS_HANDLE.set(handle);
    info!(metrics_port = port, "started prometheus exporter");
    PROMETHEUS_HANDLE.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_on_garbage() {
        assert_eq!(resolve_port("GB_METRICS_PORT_UNSET_IN_TESTS", 9464), 9464);
    }

    #[tokio::test]
    async fn recorder_is_installed_once_and_renders_counters() {
        let first = init_metrics("GB_METRICS_PORT_UNSET_IN_TESTS", 0).expect("recorder");
        let second = init_metrics("GB_METRICS_PORT_UNSET_IN_TESTS", 0).expect("recorder");
        assert!(std::ptr::eq(first, second));

        metrics::counter!("gb_acceptance_total", "outcome" => "committed").increment(1);
        assert!(first.render().contains("gb_acceptance_total"));
    }
}
