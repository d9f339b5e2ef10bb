use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::{Result, WebClientError};

/// Response as received from a [`Transport`](crate::Transport), before body
/// normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status_code: u16,
    pub status_message: String,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ResponseBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// Body that is not valid JSON.
    Text(String),
}

/// Final outcome of [`WebClient::send_request`](crate::WebClient::send_request).
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status_code: u16,
    /// Canonical reason phrase for `status_code`.
    pub status_message: String,
    /// Lower-cased names; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl Response {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Looks up a header regardless of case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Deserializes a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            ResponseBody::Json(value) => T::deserialize(value).map_err(|err| {
                WebClientError::Decode(format!(
                    "unexpected JSON body for status {}: {err}",
                    self.status_code
                ))
            }),
            ResponseBody::Text(_) => Err(WebClientError::Decode(format!(
                "body of status {} is not JSON",
                self.status_code
            ))),
            ResponseBody::Empty => Err(WebClientError::Decode(format!(
                "status {} has no body",
                self.status_code
            ))),
        }
    }

    /// Body as text; JSON bodies are re-serialized.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.body {
            ResponseBody::Empty => Cow::Borrowed(""),
            ResponseBody::Text(text) => Cow::Borrowed(text),
            ResponseBody::Json(value) => Cow::Owned(value.to_string()),
        }
    }
}
