use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use reqwest::Method;
use serde::Serialize;

use crate::{Result, WebClientError};

/// Request payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// File contents, read again for every attempt.
    File(PathBuf),
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<PathBuf> for RequestBody {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// A single logical HTTP call. Borrowed, never mutated, while it is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl Request {
    /// Request with no headers and an empty body.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// `GET` request; see [`Request::new`].
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Sets a header, replacing an earlier value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replaces the body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_string(value)
            .map_err(|err| WebClientError::InvalidRequest(format!("invalid JSON body: {err}")))?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Sets an `application/x-www-form-urlencoded` body, as used by token
    /// endpoints.
    pub fn form<T: Serialize + ?Sized>(self, fields: &T) -> Result<Self> {
        let body = serde_urlencoded::to_string(fields)
            .map_err(|err| WebClientError::InvalidRequest(format!("invalid form body: {err}")))?;
        Ok(self
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(body))
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::{Request, RequestBody};
    use crate::WebClientError;

    #[test]
    fn json_sets_body_and_content_type() {
        let request = Request::put("https://management.azure.com/resource")
            .json(&json!({"properties": {"enabled": true}}))
            .expect("json body must serialize");

        assert_eq!(request.method, Method::PUT);
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            request.body,
            RequestBody::Text(r#"{"properties":{"enabled":true}}"#.to_owned())
        );
    }

    #[test]
    fn form_encodes_reserved_characters() {
        let request = Request::post("https://login/oauth2/token")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_secret", "a b&c=d/é"),
            ])
            .expect("pairs must encode");

        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded; charset=utf-8")
        );

        assert_eq!(
            request.body,
            RequestBody::Text(
                "grant_type=client_credentials&client_secret=a+b%26c%3Dd%2F%C3%A9".to_owned()
            )
        );
    }

    #[test]
    fn form_rejects_values_without_field_names() {
        let err = Request::post("https://login/oauth2/token")
            .form("client_credentials")
            .expect_err("a bare string has no field names");
        assert!(matches!(err, WebClientError::InvalidRequest(_)), "{err:?}");
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let request = Request::get("https://api.github.com/repos/o/r")
            .header("Authorization", "Bearer secret-token")
            .header("Accept", "application/json");
        let debug = format!("{request:?}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("application/json"));
        assert!(!debug.contains("secret-token"));
    }
}
