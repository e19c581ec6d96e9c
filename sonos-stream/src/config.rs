//! Configuration types for the sonos-stream crate
//!
//! [`ListenerConfig`] controls the callback endpoint, the subscription
//! lease and its renewal, the deadlines of every device round trip and the
//! idle timer of the [`Listener`](crate::Listener).

use std::time::Duration;

use callback_server::DEFAULT_CALLBACK_PATH;
use sonos_api::DEFAULT_SUBSCRIPTION_TIMEOUT;

use crate::error::StreamError;
use crate::tracker::MIN_RENEWAL_INTERVAL;

/// Configuration for the [`Listener`](crate::Listener)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Path the callback server accepts NOTIFY requests on
    /// Default: "/sonos/events"
    pub callback_path: String,

    /// Lease requested when subscribing
    /// Default: 1800 seconds (30 minutes)
    pub subscription_timeout: Duration,

    /// Lower bound on the renewal interval, never below one minute
    /// Default: 60 seconds
    pub min_renewal_interval: Duration,

    /// Deadline for the initial SUBSCRIBE and for each renewal
    /// Default: 5 seconds
    pub subscribe_timeout: Duration,

    /// Deadline for the UNSUBSCRIBE sent on shutdown
    /// Default: 5 seconds
    pub unsubscribe_timeout: Duration,

    /// Time allowed for in-flight callback requests on shutdown
    /// Default: 5 seconds
    pub shutdown_timeout: Duration,

    /// Capacity of the event queue between the callback server and the
    /// listener loop; events arriving while it is full are dropped
    /// Default: 16
    pub event_buffer_size: usize,

    /// How long the player may stay out of `Playing` before the display
    /// is cleared
    /// Default: 600 seconds (10 minutes)
    pub idle_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            subscription_timeout: DEFAULT_SUBSCRIPTION_TIMEOUT,
            min_renewal_interval: Duration::from_secs(60),
            subscribe_timeout: Duration::from_secs(5),
            unsubscribe_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
            event_buffer_size: 16,
            idle_timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

impl ListenerConfig {
    /// Create a new ListenerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ListenerConfig that blanks the display soon after playback stops
    pub fn quick_idle() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60),
            ..Default::default()
        }
    }

    /// Create a ListenerConfig with a longer lease and a smaller queue
    pub fn resource_efficient() -> Self {
        Self {
            subscription_timeout: Duration::from_secs(3600),
            event_buffer_size: 4,
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), StreamError> {
        let path = self.callback_path.trim();
        if path.is_empty() || path == "/" {
            return Err(StreamError::Configuration(
                "Callback path must name a resource".to_string(),
            ));
        }

        if path.chars().any(char::is_whitespace) {
            return Err(StreamError::Configuration(
                "Callback path must not contain whitespace".to_string(),
            ));
        }

        if self.subscription_timeout.is_zero() {
            return Err(StreamError::Configuration(
                "Subscription timeout must be greater than 0".to_string(),
            ));
        }

        if self.min_renewal_interval < MIN_RENEWAL_INTERVAL {
            return Err(StreamError::Configuration(format!(
                "Minimum renewal interval must be at least {:?}, got {:?}",
                MIN_RENEWAL_INTERVAL, self.min_renewal_interval
            )));
        }

        if self.subscribe_timeout.is_zero()
            || self.unsubscribe_timeout.is_zero()
            || self.shutdown_timeout.is_zero()
        {
            return Err(StreamError::Configuration(
                "Subscribe, unsubscribe and shutdown timeouts must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(StreamError::Configuration(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.idle_timeout.is_zero() {
            return Err(StreamError::Configuration(
                "Idle timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    pub fn with_min_renewal_interval(mut self, interval: Duration) -> Self {
        self.min_renewal_interval = interval;
        self
    }

    pub fn with_request_timeouts(mut self, subscribe: Duration, unsubscribe: Duration) -> Self {
        self.subscribe_timeout = subscribe;
        self.unsubscribe_timeout = unsubscribe;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListenerConfig::default();
        assert_eq!(config.callback_path, "/sonos/events");
        assert_eq!(config.subscription_timeout, Duration::from_secs(1800));
        assert_eq!(config.min_renewal_interval, Duration::from_secs(60));
        assert_eq!(config.event_buffer_size, 16);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let no_path = ListenerConfig::new().with_callback_path(" ");
        assert!(no_path.validate().is_err());

        let root_path = ListenerConfig::new().with_callback_path("/");
        assert!(root_path.validate().is_err());

        let zero_buffer = ListenerConfig::new().with_buffer_size(0);
        assert!(matches!(
            zero_buffer.validate(),
            Err(StreamError::Configuration(_))
        ));

        let zero_idle = ListenerConfig::new().with_idle_timeout(Duration::ZERO);
        assert!(zero_idle.validate().is_err());

        let eager_renewal = ListenerConfig::new().with_min_renewal_interval(Duration::from_secs(59));
        let err = eager_renewal.validate().unwrap_err();
        assert!(err.to_string().contains("at least 60s, got 59s"));

        let zero_unsubscribe = ListenerConfig::new()
            .with_request_timeouts(Duration::from_secs(5), Duration::ZERO);
        assert!(zero_unsubscribe.validate().is_err());
    }

    #[test]
    fn test_config_presets() {
        let quick = ListenerConfig::quick_idle();
        assert_eq!(quick.idle_timeout, Duration::from_secs(60));
        assert!(quick.validate().is_ok());

        let efficient = ListenerConfig::resource_efficient();
        assert_eq!(efficient.event_buffer_size, 4);
        assert!(efficient.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ListenerConfig::new()
            .with_callback_path("/upnp/notify")
            .with_subscription_timeout(Duration::from_secs(300))
            .with_min_renewal_interval(Duration::from_secs(120))
            .with_buffer_size(32)
            .with_idle_timeout(Duration::from_secs(90));

        assert_eq!(config.callback_path, "/upnp/notify");
        assert_eq!(config.subscription_timeout, Duration::from_secs(300));
        assert_eq!(config.min_renewal_interval, Duration::from_secs(120));
        assert_eq!(config.event_buffer_size, 32);
        assert_eq!(config.idle_timeout, Duration::from_secs(90));
        assert!(config.validate().is_ok());
    }
}
