//! Resolved client settings: endpoints plus timing and buffer knobs.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::window::LIVE_WINDOW_CAPACITY;
use crate::ws::DEFAULT_RETRY_DELAY;

/// How often the current-snapshot endpoint is polled while the push channel is down.
pub const DEFAULT_FALLBACK_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub push_url: Url,
    pub api_url: Url,
    pub retry_delay: Duration,
    pub window_capacity: usize,
    pub history_cap: Option<usize>,
    pub fallback_poll: Duration,
}

impl ClientConfig {
    /// Build from a push URL and an optional API base. Without an API base the
    /// push URL's host is reused over http(s).
    pub fn new(push_url: &str, api_url: Option<&str>) -> Result<Self, ConfigError> {
        let push_url = parse(push_url)?;
        if !matches!(push_url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Scheme(push_url.scheme().to_string()));
        }
        let api_url = match api_url {
            Some(a) => {
                let u = parse(a)?;
                if !matches!(u.scheme(), "http" | "https") {
                    return Err(ConfigError::Scheme(u.scheme().to_string()));
                }
                with_trailing_slash(u)
            }
            None => derive_api_url(&push_url),
        };
        Ok(Self {
            push_url,
            api_url,
            retry_delay: DEFAULT_RETRY_DELAY,
            window_capacity: LIVE_WINDOW_CAPACITY,
            history_cap: None,
            fallback_poll: DEFAULT_FALLBACK_POLL,
        })
    }
}

fn parse(s: &str) -> Result<Url, ConfigError> {
    Url::parse(s.trim()).map_err(|source| ConfigError::Url {
        url: s.to_string(),
        source,
    })
}

/// `ws://host:port/ws/metrics` -> `http://host:port/`
pub fn derive_api_url(push: &Url) -> Url {
    let mut api = push.clone();
    let scheme = if push.scheme() == "wss" { "https" } else { "http" };
    // ws<->http share the special-scheme rules, so this cannot fail.
    let _ = api.set_scheme(scheme);
    api.set_path("/");
    api.set_query(None);
    api.set_fragment(None);
    api
}

// Url::join drops the last path segment unless the base ends in '/'.
fn with_trailing_slash(mut u: Url) -> Url {
    if !u.path().ends_with('/') {
        let p = format!("{}/", u.path());
        u.set_path(&p);
    }
    u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_derived_from_push_url() {
        let c = ClientConfig::new("ws://127.0.0.1:8000/ws/metrics", None).unwrap();
        assert_eq!(c.api_url.as_str(), "http://127.0.0.1:8000/");
        let c = ClientConfig::new("wss://mon.example/ws/metrics?x=1", None).unwrap();
        assert_eq!(c.api_url.as_str(), "https://mon.example/");
    }

    #[test]
    fn explicit_api_keeps_prefix() {
        let c = ClientConfig::new("ws://h/ws/metrics", Some("http://h/monitor")).unwrap();
        assert_eq!(
            c.api_url.join("api/metrics/current").unwrap().as_str(),
            "http://h/monitor/api/metrics/current"
        );
    }

    #[test]
    fn defaults() {
        let c = ClientConfig::new("ws://h/ws/metrics", None).unwrap();
        assert_eq!(c.retry_delay, Duration::from_secs(3));
        assert_eq!(c.window_capacity, 60);
        assert_eq!(c.history_cap, None);
        assert_eq!(c.fallback_poll, Duration::from_secs(1));
    }

    #[test]
    fn rejects_bad_schemes() {
        assert!(matches!(
            ClientConfig::new("http://h/ws", None),
            Err(ConfigError::Scheme(_))
        ));
        assert!(matches!(
            ClientConfig::new("ws://h/ws", Some("ftp://h/")),
            Err(ConfigError::Scheme(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url", None),
            Err(ConfigError::Url { .. })
        ));
    }
}
