//! Prometheus metrics for RPC server observability.

mod server;

pub use server::spawn_metrics_server;

use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec,
};

use once_cell::sync::Lazy;

/// Total RPC requests counter, labeled by method and status.
pub static RPC_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rpc_requests_total",
        "Total number of RPC requests",
        &["method", "status"]
    )
    .expect("Failed to register rpc_requests_total metric")
});

/// RPC request duration histogram, labeled by method.
pub static RPC_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rpc_request_duration_seconds",
        "RPC request duration in seconds",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register rpc_request_duration_seconds metric")
});

/// eth_blockNumber calls answered with the fallback because the header lookup failed.
pub static RPC_BLOCK_NUMBER_FALLBACKS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "rpc_block_number_fallbacks_total",
        "Number of eth_blockNumber calls whose virtual header lookup failed"
    )
    .expect("Failed to register rpc_block_number_fallbacks_total metric")
});

/// Requests rejected by the IP allowlist.
pub static RPC_IP_REJECTIONS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "rpc_ip_rejections_total",
        "Total number of requests rejected by the IP allowlist"
    )
    .expect("Failed to register rpc_ip_rejections_total metric")
});

/// Record a successful RPC request.
pub fn record_request_success(method: &str, duration_secs: f64) {
    RPC_REQUESTS_TOTAL
        .with_label_values(&[method, "success"])
        .inc();
    RPC_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Record a failed RPC request.
pub fn record_request_error(method: &str, duration_secs: f64) {
    RPC_REQUESTS_TOTAL
        .with_label_values(&[method, "error"])
        .inc();
    RPC_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Record an eth_blockNumber lookup failure.
pub fn record_block_number_fallback() {
    RPC_BLOCK_NUMBER_FALLBACKS.inc();
}

/// Record an allowlist rejection.
pub fn record_ip_rejection() {
    RPC_IP_REJECTIONS.inc();
}
