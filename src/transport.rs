use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::{
    ClientOptions, ErrorCode, RawResponse, Request, RequestBody, TransportError, WebClientError,
};

/// Performs a single HTTP exchange. Retrying is the client's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builds the pooled client. Fails with [`WebClientError::Config`] on an
    /// invalid proxy URL.
    pub fn new(options: &ClientOptions) -> crate::Result<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(options.ignore_ssl_errors);

        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if let Some(proxy) = &options.proxy {
            let mut reqwest_proxy = reqwest::Proxy::all(proxy.url.as_str()).map_err(|err| {
                WebClientError::Config(format!("invalid proxy url '{}': {err}", proxy.url))
            })?;
            if let Some(username) = &proxy.username {
                reqwest_proxy =
                    reqwest_proxy.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(reqwest_proxy);
        }

        let http = builder
            .build()
            .map_err(|err| WebClientError::Config(format!("could not build http client: {err}")))?;

        Ok(Self {
            http,
            timeout: Duration::from_millis(options.timeout_ms),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let url = reqwest::Url::parse(&request.uri).map_err(|err| {
            TransportError::new(
                ErrorCode::Other("ERR_INVALID_URL".to_owned()),
                format!("invalid URL '{}': {err}", request.uri),
            )
        })?;

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::File(path) => {
                let contents = tokio::fs::read(path)
                    .await
                    .map_err(TransportError::from_io)?;
                builder.body(contents)
            }
        };

        let response = builder.send().await.map_err(into_transport_error)?;
        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(into_transport_error)?;

        Ok(RawResponse {
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: body.to_vec(),
        })
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    collected
}

fn into_transport_error(err: reqwest::Error) -> TransportError {
    let code = classify_reqwest_error(&err);
    TransportError::new(code, error_chain_text(&err)).with_source(err)
}

/// Maps a reqwest failure onto a socket error code.
pub(crate) fn classify_reqwest_error(err: &reqwest::Error) -> ErrorCode {
    if err.is_timeout() {
        return if err.is_connect() {
            ErrorCode::TimedOut
        } else {
            ErrorCode::SocketTimedOut
        };
    }

    // Resolver failures surface as uncategorized io errors, so the text is
    // checked before the io kind.
    let chain = error_chain_text(err).to_ascii_lowercase();
    if chain.contains("dns error") || chain.contains("failed to lookup address") {
        return ErrorCode::HostNotFound;
    }

    if let Some(io_err) = find_io_error(err) {
        return ErrorCode::from_io(io_err);
    }

    if chain.contains("connection closed before message completed")
        || chain.contains("connection reset")
    {
        return ErrorCode::ConnectionReset;
    }
    if chain.contains("no route to host") {
        return ErrorCode::HostUnreachable;
    }
    if err.is_builder() {
        return ErrorCode::Other("ERR_INVALID_REQUEST".to_owned());
    }

    ErrorCode::Other("EUNKNOWN".to_owned())
}

fn find_io_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a std::io::Error> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(candidate) = current {
        if let Some(io_err) = candidate.downcast_ref::<std::io::Error>() {
            return Some(io_err);
        }
        current = candidate.source();
    }
    None
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        current = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

    use super::{collect_headers, ReqwestTransport, Transport};
    use crate::{ClientOptions, ErrorCode, ProxyOptions, Request, WebClientError};

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert("X-Request-Id", HeaderValue::from_static("42"));

        let collected = collect_headers(&headers);
        assert_eq!(collected.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
        assert_eq!(collected.get("x-request-id").map(String::as_str), Some("42"));
    }

    #[test]
    fn invalid_proxy_url_is_a_config_error() {
        let options = ClientOptions {
            proxy: Some(ProxyOptions {
                url: "not a url".to_owned(),
                username: None,
                password: None,
            }),
            ..ClientOptions::default()
        };
        assert!(matches!(
            ReqwestTransport::new(&options),
            Err(WebClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn malformed_uri_is_classified_before_sending() {
        let transport =
            ReqwestTransport::new(&ClientOptions::default()).expect("transport must build");
        let err = transport
            .execute(&Request::get("no-scheme/path"))
            .await
            .expect_err("malformed uri must fail");
        assert_eq!(err.code, ErrorCode::Other("ERR_INVALID_URL".to_owned()));
    }

    #[tokio::test]
    async fn missing_body_file_is_enoent() {
        let transport =
            ReqwestTransport::new(&ClientOptions::default()).expect("transport must build");
        let request = Request::put("http://127.0.0.1:9/upload")
            .body(std::path::PathBuf::from("/definitely/not/here.zip"));
        let err = transport
            .execute(&request)
            .await
            .expect_err("missing file must fail");
        assert_eq!(err.code, ErrorCode::Other("ENOENT".to_owned()));
    }
}
