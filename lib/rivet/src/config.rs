//! Dispatcher and transport configuration types.

use std::time::Duration;

/// Configuration for the invocation dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Timeout for a single transport attempt.
    pub dispatch_timeout: Duration,
    /// Retries after the first attempt for idempotent operations.
    pub max_transport_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay.
    pub max_backoff: Duration,
    /// Re-authentications allowed per invocation.
    pub max_auth_retries: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(30),
            max_transport_retries: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            max_auth_retries: 2,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::default()
    }

    /// Delay before retry number `retry` (0-based): doubles from
    /// `initial_backoff`, capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Builder for [`DispatcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfigBuilder {
    dispatch_timeout: Option<Duration>,
    max_transport_retries: Option<u32>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    max_auth_retries: Option<u32>,
}

impl DispatcherConfigBuilder {
    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of transport retries.
    #[must_use]
    pub const fn max_transport_retries(mut self, retries: u32) -> Self {
        self.max_transport_retries = Some(retries);
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = Some(delay);
        self
    }

    /// Set the retry delay cap.
    #[must_use]
    pub const fn max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = Some(delay);
        self
    }

    /// Set the maximum number of re-authentications per invocation.
    #[must_use]
    pub const fn max_auth_retries(mut self, retries: u32) -> Self {
        self.max_auth_retries = Some(retries);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DispatcherConfig {
        let defaults = DispatcherConfig::default();
        DispatcherConfig {
            dispatch_timeout: self.dispatch_timeout.unwrap_or(defaults.dispatch_timeout),
            max_transport_retries: self
                .max_transport_retries
                .unwrap_or(defaults.max_transport_retries),
            initial_backoff: self.initial_backoff.unwrap_or(defaults.initial_backoff),
            max_backoff: self.max_backoff.unwrap_or(defaults.max_backoff),
            max_auth_retries: self.max_auth_retries.unwrap_or(defaults.max_auth_retries),
        }
    }
}

/// Configuration for [`HyperTransport`](crate::HyperTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dispatcher_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.dispatch_timeout, Duration::from_secs(30));
        assert_eq!(config.max_transport_retries, 5);
        assert_eq!(config.max_auth_retries, 2);
    }

    #[test]
    fn dispatcher_builder_overrides() {
        let config = DispatcherConfig::builder()
            .dispatch_timeout(Duration::from_secs(5))
            .max_transport_retries(1)
            .max_auth_retries(0)
            .build();

        assert_eq!(config.dispatch_timeout, Duration::from_secs(5));
        assert_eq!(config.max_transport_retries, 1);
        assert_eq!(config.max_auth_retries, 0);
        assert_eq!(config.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let config = DispatcherConfig::default();
        let delays: Vec<_> = (0..8).map(|retry| config.backoff(retry)).collect();
        assert_eq!(
            delays,
            [50, 100, 200, 400, 800, 1600, 2000, 2000].map(Duration::from_millis)
        );
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(2));
    }

    #[test]
    fn transport_builder_overrides() {
        let config = TransportConfig::builder()
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .build();

        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_per_host, 16);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
    }
}
