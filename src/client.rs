use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tokio::time::{sleep, Instant};

use crate::{
    decode::decode_response, issue::IssueWriter, ClientOptions, ReqwestTransport, Request,
    RequestOptions, Response, Result, RetryPolicy, Transport, WebClientError,
};

/// HTTP client that retries transient failures.
#[derive(Clone)]
pub struct WebClient {
    transport: Arc<dyn Transport>,
    options: ClientOptions,
    issues: IssueWriter,
}

impl fmt::Debug for WebClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl WebClient {
    /// Creates a client with default options over reqwest.
    pub fn new() -> Result<Self> {
        Self::from_options(ClientOptions::default())
    }

    /// Creates a client over reqwest configured by `options`.
    pub fn from_options(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(&options)?;
        Ok(Self {
            transport: Arc::new(transport),
            options,
            issues: IssueWriter::default(),
        })
    }

    /// Creates a client from the agent's environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::from_options(ClientOptions::from_env())
    }

    /// Creates a client over a custom transport with default options.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            options: ClientOptions::default(),
            issues: IssueWriter::default(),
        }
    }

    /// Replaces the default retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.options.retry = policy;
        self
    }

    /// Enables or disables the `##vso[task.logissue]` line on terminal
    /// transport errors.
    pub fn with_error_issues(mut self, enabled: bool) -> Self {
        self.options.report_error_issues = enabled;
        self
    }

    /// Sends the `##vso[task.logissue]` lines to `writer` instead of
    /// stdout. Clones of this client share the writer.
    pub fn with_issue_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.issues = IssueWriter::custom(writer);
        self
    }

    /// Options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `request` under the client's retry policy.
    ///
    /// Any status outside the retriable set is returned as a normal
    /// [`Response`], including 4xx/5xx. When attempts run out the last
    /// response or transport error is returned unchanged.
    pub async fn send_request(&self, request: &Request) -> Result<Response> {
        self.send_with_policy(request, &self.options.retry).await
    }

    /// Sends `request` with per-call overrides of the retry policy.
    pub async fn send_request_with(
        &self,
        request: &Request,
        overrides: &RequestOptions,
    ) -> Result<Response> {
        let policy = self.options.retry.merged(overrides);
        self.send_with_policy(request, &policy).await
    }

    async fn send_with_policy(&self, request: &Request, policy: &RetryPolicy) -> Result<Response> {
        let started = Instant::now();
        let max_attempts = policy.attempts();
        let mut backoff = policy.backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let can_retry = attempt < max_attempts;

            #[cfg(feature = "tracing")]
            tracing::debug!("[{}]{}", request.method, request.uri);

            match self.transport.execute(request).await {
                Ok(raw) => {
                    let response = decode_response(raw);
                    if can_retry && policy.is_retriable_status(response.status_code) {
                        let wait = backoff.next_interval();
                        if policy.allows_wait(started.elapsed(), wait) {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                attempt,
                                max_attempts,
                                "Encountered a retriable status code: {}. Message: '{}'.",
                                response.status_code,
                                response.status_message
                            );
                            sleep(wait).await;
                            continue;
                        }
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if can_retry && policy.is_retriable_error(&err.code) {
                        let wait = backoff.next_interval();
                        if policy.allows_wait(started.elapsed(), wait) {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                attempt,
                                max_attempts,
                                "Encountered a retriable error: {}. Message: {}.",
                                err.code,
                                err.message
                            );
                            sleep(wait).await;
                            continue;
                        }
                    }

                    if self.options.report_error_issues {
                        self.issues.report_error_code(&err.code);
                    }
                    return Err(WebClientError::Transport(err));
                }
            }
        }
    }
}
