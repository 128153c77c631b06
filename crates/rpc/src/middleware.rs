//! Request admission, timing and metrics middleware.

use std::collections::HashSet;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonrpsee::server::middleware::rpc::RpcServiceT;
use jsonrpsee::types::Request;
use jsonrpsee::MethodResponse;
use tracing::{debug, warn};

use crate::metrics;

/// IP allowlist filter.
#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    /// Allowed IP addresses. None means all IPs are allowed.
    allowed_ips: Option<Vec<IpAddr>>,
}

impl IpAllowlist {
    /// Create a new IP allowlist.
    pub fn new(allowed_ips: Option<Vec<IpAddr>>) -> Self {
        Self { allowed_ips }
    }

    /// Check if an IP is allowed.
    pub fn is_allowed(&self, ip: &IpAddr) -> bool {
        match &self.allowed_ips {
            Some(allowed) => allowed.contains(ip),
            None => true,
        }
    }

    /// Check if the allowlist is active (has entries).
    pub fn is_active(&self) -> bool {
        self.allowed_ips.is_some()
    }

    /// Admit or reject a caller, recording rejections.
    pub fn check(&self, ip: IpAddr) -> Result<(), &'static str> {
        if !self.is_allowed(&ip) {
            warn!("Request from non-allowed IP rejected: {}", ip);
            metrics::record_ip_rejection();
            return Err("IP not in allowlist");
        }
        Ok(())
    }
}

/// Request timing information for logging.
pub struct RequestTiming {
    /// Request start time.
    start: Instant,
    /// RPC method name.
    method: String,
}

impl RequestTiming {
    /// Create a new request timing.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            method: method.into(),
        }
    }

    /// Complete the request and log the result.
    pub fn complete(self, success: bool) {
        let duration = self.start.elapsed();
        let duration_secs = duration.as_secs_f64();

        debug!(
            method = %self.method,
            success,
            duration_ms = duration.as_millis(),
            "RPC request completed"
        );

        if success {
            metrics::record_request_success(&self.method, duration_secs);
        } else {
            metrics::record_request_error(&self.method, duration_secs);
        }
    }

    /// Get elapsed time without completing.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Label used for calls to methods that are not registered.
pub const UNKNOWN_METHOD: &str = "unknown";

/// RPC middleware recording a [`RequestTiming`] for every call served by the
/// HTTP transport.
///
/// Unregistered method names are folded into [`UNKNOWN_METHOD`] so callers
/// cannot grow the metric label set.
#[derive(Debug, Clone)]
pub struct RequestMetrics<S> {
    inner: S,
    registered_methods: Arc<HashSet<&'static str>>,
}

impl<S> RequestMetrics<S> {
    /// Wrap `inner`, labeling calls by the given registered method names.
    pub fn new(inner: S, registered_methods: Arc<HashSet<&'static str>>) -> Self {
        Self {
            inner,
            registered_methods,
        }
    }

    fn label(&self, method: &str) -> &'static str {
        self.registered_methods
            .get(method)
            .copied()
            .unwrap_or(UNKNOWN_METHOD)
    }
}

impl<'a, S> RpcServiceT<'a> for RequestMetrics<S>
where
    S: RpcServiceT<'a> + Send + Sync,
    S::Future: 'a,
{
    type Future = Pin<Box<dyn Future<Output = MethodResponse> + Send + 'a>>;

    fn call(&self, request: Request<'a>) -> Self::Future {
        let timing = RequestTiming::new(self.label(request.method_name()));
        let response = self.inner.call(request);

        Box::pin(async move {
            let response = response.await;
            timing.complete(response.is_success());
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_allowlist() {
        let allowed_ip: IpAddr = "192.168.1.1".parse().unwrap();
        let blocked_ip: IpAddr = "10.0.0.1".parse().unwrap();

        // No allowlist = all allowed
        let allowlist = IpAllowlist::new(None);
        assert!(allowlist.is_allowed(&allowed_ip));
        assert!(allowlist.is_allowed(&blocked_ip));
        assert!(allowlist.check(blocked_ip).is_ok());

        let allowlist = IpAllowlist::new(Some(vec![allowed_ip]));
        assert!(allowlist.is_active());
        assert!(allowlist.check(allowed_ip).is_ok());
        assert_eq!(allowlist.check(blocked_ip), Err("IP not in allowlist"));
    }

    #[test]
    fn test_request_timing() {
        let timing = RequestTiming::new("eth_blockNumber");
        assert!(timing.elapsed() < Duration::from_secs(5));
        timing.complete(true);

        let count = metrics::RPC_REQUESTS_TOTAL
            .with_label_values(&["eth_blockNumber", "success"])
            .get();
        assert!(count >= 1.0);
    }

    #[test]
    fn test_request_metrics_label() {
        let names: HashSet<&'static str> = ["eth_blockNumber"].into_iter().collect();
        let middleware = RequestMetrics::new((), Arc::new(names));

        assert_eq!(middleware.label("eth_blockNumber"), "eth_blockNumber");
        assert_eq!(middleware.label("eth_mining"), UNKNOWN_METHOD);
    }
}
