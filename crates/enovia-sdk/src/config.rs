//! Client behaviour knobs that are not part of the service credential.

use std::time::Duration;

/// Per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ENOVIA_TIMEOUT_SECS";
/// `false` turns off re-authentication after session expiry.
pub const ENV_REAUTHENTICATE: &str = "ENOVIA_REAUTHENTICATE";
/// Upper bound on concurrent downloads in a batch.
pub const ENV_MAX_CONCURRENT_DOWNLOADS: &str = "ENOVIA_MAX_CONCURRENT_DOWNLOADS";

/// Options applied to the HTTP client and the [`EnoviaClient`](crate::EnoviaClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Timeout applied to every request. A timeout fails the step it hit.
    pub request_timeout: Option<Duration>,
    /// Re-run the ticket exchange once when a download step answers 401.
    pub reauthenticate_on_expiry: bool,
    /// Downloads in flight at once in
    /// [`EnoviaClient::download_many`](crate::EnoviaClient::download_many).
    pub max_concurrent_downloads: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(60)),
            reauthenticate_on_expiry: true,
            max_concurrent_downloads: 4,
        }
    }
}

impl ClientOptions {
    /// Build options from an arbitrary key/value source, falling back to
    /// [`ClientOptions::default`] for unset or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = lookup(ENV_TIMEOUT_SECS).and_then(|v| v.trim().parse::<u64>().ok());
        let request_timeout = match timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };

        let reauthenticate_on_expiry = lookup(ENV_REAUTHENTICATE)
            .map_or(defaults.reauthenticate_on_expiry, |v| {
                !v.trim().eq_ignore_ascii_case("false")
            });

        let max_concurrent_downloads = lookup(ENV_MAX_CONCURRENT_DOWNLOADS)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_concurrent_downloads);

        Self {
            request_timeout,
            reauthenticate_on_expiry,
            max_concurrent_downloads,
        }
    }

    /// Build options from environment variables.
    ///
    /// | Variable                          | Default | Description                        |
    /// |-----------------------------------|---------|------------------------------------|
    /// | `ENOVIA_TIMEOUT_SECS`             | `60`    | Per-request timeout, `0` disables  |
    /// | `ENOVIA_REAUTHENTICATE`           | `true`  | Re-authenticate on session expiry  |
    /// | `ENOVIA_MAX_CONCURRENT_DOWNLOADS` | `4`     | Parallelism of batch downloads     |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let opts = ClientOptions::from_lookup(|_| None);
        assert_eq!(opts, ClientOptions::default());
        assert_eq!(opts.request_timeout, Some(Duration::from_secs(60)));
        assert!(opts.reauthenticate_on_expiry);
        assert_eq!(opts.max_concurrent_downloads, 4);
    }

    #[test]
    fn parses_overrides() {
        let opts = ClientOptions::from_lookup(|key| match key {
            ENV_TIMEOUT_SECS => Some("5".into()),
            ENV_REAUTHENTICATE => Some("FALSE".into()),
            ENV_MAX_CONCURRENT_DOWNLOADS => Some("8".into()),
            _ => None,
        });
        assert_eq!(opts.request_timeout, Some(Duration::from_secs(5)));
        assert!(!opts.reauthenticate_on_expiry);
        assert_eq!(opts.max_concurrent_downloads, 8);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let opts = ClientOptions::from_lookup(|key| (key == ENV_TIMEOUT_SECS).then(|| "0".into()));
        assert_eq!(opts.request_timeout, None);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let opts = ClientOptions::from_lookup(|key| match key {
            ENV_TIMEOUT_SECS => Some("soon".into()),
            ENV_MAX_CONCURRENT_DOWNLOADS => Some("0".into()),
            _ => None,
        });
        assert_eq!(opts, ClientOptions::default());
    }
}
