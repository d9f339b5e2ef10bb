use std::fmt;

use crate::RetryPolicy;

const TIMEOUT_ENV: &str = "VSTS_HTTP_TIMEOUT";
const USER_AGENT_ENV: &str = "AZURE_HTTP_USER_AGENT";
const PROXY_URL_ENV: &str = "AGENT_PROXYURL";
const PROXY_USERNAME_ENV: &str = "AGENT_PROXYUSERNAME";
const PROXY_PASSWORD_ENV: &str = "AGENT_PROXYPASSWORD";
const IGNORE_SSL_ERRORS_ENV: &str = "VSTS_ARM_REST_IGNORE_SSL_ERRORS";

/// Configures the transport and the default retry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// `User-Agent` sent with every request.
    pub user_agent: Option<String>,
    /// Outbound proxy for every request.
    pub proxy: Option<ProxyOptions>,
    /// Skips TLS certificate verification.
    pub ignore_ssl_errors: bool,
    /// Writes a `##vso[task.logissue ...]` line for terminal transport
    /// errors.
    pub report_error_issues: bool,
    /// Retry policy applied to every call unless overridden.
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 100_000,
            user_agent: None,
            proxy: None,
            ignore_ssl_errors: false,
            report_error_issues: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientOptions {
    /// Reads options from the agent's environment variables.
    ///
    /// Reads:
    /// - `VSTS_HTTP_TIMEOUT`: per-attempt timeout in seconds
    /// - `AZURE_HTTP_USER_AGENT`
    /// - `AGENT_PROXYURL`, `AGENT_PROXYUSERNAME`, `AGENT_PROXYPASSWORD`
    /// - `VSTS_ARM_REST_IGNORE_SSL_ERRORS`: `true` disables TLS verification
    ///
    /// Missing, empty or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut options = Self::default();
        if let Some(seconds) = get(TIMEOUT_ENV).and_then(|value| value.parse::<u64>().ok()) {
            options.timeout_ms = seconds.saturating_mul(1_000);
        }
        options.user_agent = get(USER_AGENT_ENV);
        options.proxy = get(PROXY_URL_ENV).map(|url| ProxyOptions {
            url,
            username: get(PROXY_USERNAME_ENV),
            password: get(PROXY_PASSWORD_ENV),
        });
        options.ignore_ssl_errors = get(IGNORE_SSL_ERRORS_ENV)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        options
    }

    /// Replaces the default retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Outbound proxy settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyOptions {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ProxyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyOptions")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
