use std::time::Duration;

use crate::{backoff::Backoff, ErrorCode};

/// Attempts made per call unless overridden.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base retry interval unless overridden.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP statuses retried unless overridden.
pub const DEFAULT_RETRIABLE_STATUS_CODES: [u16; 6] = [408, 409, 500, 502, 503, 504];

/// Transport error codes retried unless overridden.
pub const DEFAULT_RETRIABLE_ERROR_CODES: [&str; 8] = [
    "ETIMEDOUT",
    "ECONNRESET",
    "ENOTFOUND",
    "ESOCKETTIMEDOUT",
    "ECONNREFUSED",
    "EHOSTUNREACH",
    "EPIPE",
    "EAGAIN",
];

/// Decides which outcomes of a call are retried and how long to wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// First wait; also the growth factor in seconds.
    pub retry_interval: Duration,
    /// Statuses that trigger another attempt.
    pub retriable_status_codes: Vec<u16>,
    /// Transport error codes that trigger another attempt.
    pub retriable_error_codes: Vec<ErrorCode>,
    /// Whether `ESOCKETTIMEDOUT` from an elapsed per-attempt timeout is
    /// retried when listed in `retriable_error_codes`.
    pub retry_request_timed_out: bool,
    /// Upper bound on the whole call. No retry is scheduled whose wait would
    /// end past it.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            retriable_status_codes: DEFAULT_RETRIABLE_STATUS_CODES.to_vec(),
            retriable_error_codes: DEFAULT_RETRIABLE_ERROR_CODES
                .iter()
                .map(|code| ErrorCode::from(*code))
                .collect(),
            retry_request_timed_out: true,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Sets the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the first wait and the growth base.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Replaces the retried statuses.
    pub fn with_retriable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retriable_status_codes = codes.into_iter().collect();
        self
    }

    /// Replaces the retried error codes. Strings are parsed with
    /// [`ErrorCode::from`], so `"econnreset"` matches
    /// [`ErrorCode::ConnectionReset`].
    pub fn with_retriable_error_codes<I, C>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ErrorCode>,
    {
        self.retriable_error_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Bounds the whole call, waits included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Effective attempt count, at least 1.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `status_code` is in the retried set.
    pub fn is_retriable_status(&self, status_code: u16) -> bool {
        self.retriable_status_codes.contains(&status_code)
    }

    /// Whether `code` is retried. `ESOCKETTIMEDOUT` also requires
    /// `retry_request_timed_out`.
    pub fn is_retriable_error(&self, code: &ErrorCode) -> bool {
        if *code == ErrorCode::SocketTimedOut && !self.retry_request_timed_out {
            return false;
        }
        self.retriable_error_codes.contains(code)
    }

    /// Whether a retry after `wait` still fits the deadline, given the time
    /// already spent on the call.
    pub fn allows_wait(&self, elapsed: Duration, wait: Duration) -> bool {
        match self.deadline {
            Some(deadline) => elapsed.saturating_add(wait) <= deadline,
            None => true,
        }
    }

    /// Fresh wait sequence starting at `retry_interval`.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.retry_interval)
    }

    /// Applies per-call overrides on top of this policy.
    pub fn merged(&self, overrides: &RequestOptions) -> Self {
        let base = self.clone();
        Self {
            max_attempts: overrides.max_attempts.unwrap_or(base.max_attempts),
            retry_interval: overrides.retry_interval.unwrap_or(base.retry_interval),
            retriable_status_codes: overrides
                .retriable_status_codes
                .clone()
                .unwrap_or(base.retriable_status_codes),
            retriable_error_codes: overrides
                .retriable_error_codes
                .clone()
                .unwrap_or(base.retriable_error_codes),
            retry_request_timed_out: overrides
                .retry_request_timed_out
                .unwrap_or(base.retry_request_timed_out),
            deadline: overrides.deadline.or(base.deadline),
        }
    }
}

/// Per-call overrides of the client's [`RetryPolicy`].
///
/// Unset fields keep the client's value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub max_attempts: Option<u32>,
    pub retry_interval: Option<Duration>,
    /// Replaces, not extends, the client's list.
    pub retriable_status_codes: Option<Vec<u16>>,
    /// Replaces, not extends, the client's list.
    pub retriable_error_codes: Option<Vec<ErrorCode>>,
    pub retry_request_timed_out: Option<bool>,
    pub deadline: Option<Duration>,
}
