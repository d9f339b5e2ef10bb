//! `resilient-http` is an async HTTP client that retries transient failures.
//!
//! Pipeline tasks calling cloud control planes send every request through
//! [`WebClient::send_request`], which:
//! - retries transport errors whose [`ErrorCode`] is in the policy,
//! - retries responses whose status is in the policy,
//! - waits `t, t*base + base, ...` between attempts,
//! - returns every other response as-is, with the body parsed as JSON when
//!   possible.
//!
//! ```no_run
//! use resilient_http::{Request, WebClient};
//!
//! # async fn run() -> resilient_http::Result<()> {
//! let client = WebClient::from_env()?;
//! let response = client
//!     .send_request(&Request::get("https://management.azure.com/subscriptions?api-version=2020-01-01"))
//!     .await?;
//! println!("{} {}", response.status_code, response.text());
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client;
mod decode;
mod error;
pub mod issue;
mod options;
mod policy;
mod request;
mod response;
mod transport;

pub use backoff::Backoff;
pub use client::WebClient;
pub use error::{ErrorCode, TransportError, WebClientError};
pub use options::{ClientOptions, ProxyOptions};
pub use policy::{
    RequestOptions, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRIABLE_ERROR_CODES,
    DEFAULT_RETRIABLE_STATUS_CODES, DEFAULT_RETRY_INTERVAL,
};
pub use request::{Request, RequestBody};
pub use reqwest::Method;
pub use response::{RawResponse, Response, ResponseBody};
pub use transport::{ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, WebClientError>;
