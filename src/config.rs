//! Configuration consumed at connection construction.
//!
//! Only one value matters to the transport core: how long a peer may stall
//! once a transfer has started. It is read from a [`ConfigSource`]; when no
//! source is available, or it has nothing to say, [`DEFAULT_READ_TIMEOUT`]
//! applies instead of failing construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout used when no configuration source supplies one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Supplier of the slow-peer timeout.
pub trait ConfigSource {
    /// Configured timeout, or `None` to use the default.
    fn read_timeout(&self) -> Option<Duration>;
}

impl ConfigSource for Duration {
    fn read_timeout(&self) -> Option<Duration> { Some(*self) }
}

/// TCP settings section, as found under `tcp` in a speaker's configuration.
///
/// ```
/// use peerwire::config::{ConfigSource, TcpConfig};
///
/// let tcp = TcpConfig { timeout: 5 };
/// assert_eq!(tcp.read_timeout(), Some(std::time::Duration::from_secs(5)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Slow-peer timeout in whole seconds. Zero means "not configured".
    pub timeout: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READ_TIMEOUT.as_secs(),
        }
    }
}

impl ConfigSource for TcpConfig {
    fn read_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

/// Resolve the timeout from an optional source, falling back to
/// [`DEFAULT_READ_TIMEOUT`].
#[must_use]
pub fn resolve_read_timeout(source: Option<&dyn ConfigSource>) -> Duration {
    source
        .and_then(|source| source.read_timeout())
        .unwrap_or(DEFAULT_READ_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::absent(None, DEFAULT_READ_TIMEOUT)]
    #[case::unset(Some(TcpConfig { timeout: 0 }), DEFAULT_READ_TIMEOUT)]
    #[case::configured(Some(TcpConfig { timeout: 7 }), Duration::from_secs(7))]
    fn timeout_falls_back_to_default(#[case] tcp: Option<TcpConfig>, #[case] expected: Duration) {
        let source = tcp.as_ref().map(|cfg| cfg as &dyn ConfigSource);
        assert_eq!(resolve_read_timeout(source), expected);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let tcp: TcpConfig = serde_json::from_str("{}").expect("deserialise empty section");
        assert_eq!(tcp, TcpConfig::default());
        let tcp: TcpConfig = serde_json::from_str(r#"{"timeout": 3}"#).expect("deserialise");
        assert_eq!(tcp.read_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn durations_are_their_own_source() {
        let source = Duration::from_millis(250);
        assert_eq!(resolve_read_timeout(Some(&source)), source);
    }
}
