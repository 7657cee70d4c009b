//! Cheap online check before sending an event.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

/// Upper bound for the DNS lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

pub trait Reachability: Send + Sync {
    /// `true` when the tracking backend looks reachable.
    fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Resolves a host name; a successful lookup counts as online.
pub struct DnsReachability {
    host: String,
    timeout: Duration,
}

impl DnsReachability {
    /// `host` must include a port, e.g. `api.segment.io:443`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: LOOKUP_TIMEOUT,
        }
    }
}

impl Reachability for DnsReachability {
    fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, tokio::net::lookup_host(self.host.as_str()))
                .await
            {
                Ok(Ok(mut addrs)) => addrs.next().is_some(),
                Ok(Err(e)) => {
                    debug!(host = %self.host, "lookup failed: {e}");
                    false
                }
                Err(_) => {
                    debug!(host = %self.host, "lookup timed out");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn localhost_is_online() {
        assert!(DnsReachability::new("localhost:80").is_online().await);
    }

    #[tokio::test]
    async fn malformed_host_is_offline() {
        assert!(!DnsReachability::new("no port here").is_online().await);
    }
}
