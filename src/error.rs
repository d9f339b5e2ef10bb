use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::str::FromStr;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum WebClientError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(TransportError),
    /// The request could not be assembled (e.g. body serialization).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The underlying transport could not be constructed.
    #[error("configuration error: {0}")]
    Config(String),
    /// Response body did not match the requested shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl WebClientError {
    /// Error code of a transport failure, if this is one.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Transport(err) => Some(&err.code),
            _ => None,
        }
    }
}

impl From<TransportError> for WebClientError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Failure reported by a [`Transport`](crate::Transport) before any
/// response was received.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    /// Classified failure kind.
    pub code: ErrorCode,
    /// Human readable description.
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    /// Creates an error without an underlying cause.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub(crate) fn from_io(err: io::Error) -> Self {
        let code = ErrorCode::from_io(&err);
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// Transport-level failure classification.
///
/// Known kinds use the conventional socket error names so that retry
/// policies can be written as plain string lists; anything else is kept
/// verbatim in [`ErrorCode::Other`].
///
/// Equality and hashing compare the canonical code, so `Other("econnreset")`
/// equals [`ErrorCode::ConnectionReset`] and `Other("enoent")` equals
/// `Other("ENOENT")`.
#[derive(Clone, Debug)]
pub enum ErrorCode {
    /// `ETIMEDOUT`
    TimedOut,
    /// `ECONNRESET`
    ConnectionReset,
    /// `ENOTFOUND`, host name did not resolve.
    HostNotFound,
    /// `ESOCKETTIMEDOUT`, the per-attempt timeout elapsed.
    SocketTimedOut,
    /// `ECONNREFUSED`
    ConnectionRefused,
    /// `EHOSTUNREACH`
    HostUnreachable,
    /// `EPIPE`
    BrokenPipe,
    /// `EAGAIN` (also parsed from `EAI_AGAIN`)
    TryAgain,
    /// Any other code, kept as given.
    Other(String),
}

impl ErrorCode {
    /// Code as written in logs and issue lines.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(code) => code,
            known => known.static_str(),
        }
    }

    /// Maps an I/O error onto the closest socket error code.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                Self::ConnectionReset
            }
            io::ErrorKind::BrokenPipe => Self::BrokenPipe,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::WouldBlock => Self::TryAgain,
            io::ErrorKind::NotFound => Self::Other("ENOENT".to_owned()),
            io::ErrorKind::PermissionDenied => Self::Other("EACCES".to_owned()),
            io::ErrorKind::AddrNotAvailable => Self::Other("EADDRNOTAVAIL".to_owned()),
            _ => {
                let message = err.to_string().to_ascii_lowercase();
                if message.contains("failed to lookup address") {
                    Self::HostNotFound
                } else if message.contains("no route to host")
                    || message.contains("unreachable")
                {
                    Self::HostUnreachable
                } else {
                    Self::Other("EIO".to_owned())
                }
            }
        }
    }

    /// Upper-cased code with known spellings folded onto their variant.
    fn canonical(&self) -> Cow<'_, str> {
        match self {
            Self::Other(code) => match Self::from(code.as_str()) {
                Self::Other(_) => Cow::Owned(code.trim().to_ascii_uppercase()),
                known => Cow::Borrowed(known.static_str()),
            },
            known => Cow::Borrowed(known.static_str()),
        }
    }

    fn static_str(&self) -> &'static str {
        match self {
            Self::TimedOut => "ETIMEDOUT",
            Self::ConnectionReset => "ECONNRESET",
            Self::HostNotFound => "ENOTFOUND",
            Self::SocketTimedOut => "ESOCKETTIMEDOUT",
            Self::ConnectionRefused => "ECONNREFUSED",
            Self::HostUnreachable => "EHOSTUNREACH",
            Self::BrokenPipe => "EPIPE",
            Self::TryAgain => "EAGAIN",
            Self::Other(_) => "",
        }
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ErrorCode {}

impl Hash for ErrorCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "ETIMEDOUT" => Self::TimedOut,
            "ECONNRESET" => Self::ConnectionReset,
            "ENOTFOUND" => Self::HostNotFound,
            "ESOCKETTIMEDOUT" => Self::SocketTimedOut,
            "ECONNREFUSED" => Self::ConnectionRefused,
            "EHOSTUNREACH" => Self::HostUnreachable,
            "EPIPE" => Self::BrokenPipe,
            "EAGAIN" | "EAI_AGAIN" => Self::TryAgain,
            _ => Self::Other(code.trim().to_owned()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(code))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io;

    use super::{ErrorCode, TransportError, WebClientError};

    #[test]
    fn known_codes_round_trip_through_strings() {
        for code in [
            "ETIMEDOUT",
            "ECONNRESET",
            "ENOTFOUND",
            "ESOCKETTIMEDOUT",
            "ECONNREFUSED",
            "EHOSTUNREACH",
            "EPIPE",
            "EAGAIN",
        ] {
            let parsed = ErrorCode::from(code);
            assert!(!matches!(parsed, ErrorCode::Other(_)), "{code}");
            assert_eq!(parsed.as_str(), code);
        }
    }

    #[test]
    fn eai_again_is_try_again() {
        assert_eq!(ErrorCode::from("EAI_AGAIN"), ErrorCode::TryAgain);
    }

    #[test]
    fn unknown_code_is_preserved() {
        assert_eq!(ErrorCode::from("ENOENT"), ErrorCode::Other("ENOENT".to_owned()));
        assert_eq!(ErrorCode::from("ENOENT").to_string(), "ENOENT");
    }

    #[test]
    fn raw_spelling_of_known_code_equals_variant() {
        assert_eq!(ErrorCode::Other("ECONNRESET".to_owned()), ErrorCode::ConnectionReset);
        assert_eq!(ErrorCode::Other(" eai_again ".to_owned()), ErrorCode::TryAgain);
        assert_ne!(ErrorCode::Other("ECONNRESET".to_owned()), ErrorCode::BrokenPipe);
    }

    #[test]
    fn other_codes_compare_case_insensitively() {
        assert_eq!(ErrorCode::from("enoent"), ErrorCode::Other("ENOENT".to_owned()));
        assert_ne!(ErrorCode::from("ENOENT"), ErrorCode::from("EACCES"));
    }

    #[test]
    fn hash_agrees_with_equality() {
        let codes: HashSet<ErrorCode> = [
            ErrorCode::ConnectionReset,
            ErrorCode::Other("econnreset".to_owned()),
            ErrorCode::from("ENOENT"),
            ErrorCode::Other("enoent".to_owned()),
        ]
        .into_iter()
        .collect();
        assert_eq!(codes.len(), 2);
    }

    #[test]
    fn unresolved_host_io_error_is_host_not_found() {
        let dns = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        );
        assert_eq!(ErrorCode::from_io(&dns), ErrorCode::HostNotFound);
    }

    #[test]
    fn io_kinds_map_to_socket_codes() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(ErrorCode::from_io(&refused), ErrorCode::ConnectionRefused);

        let aborted = io::Error::new(io::ErrorKind::ConnectionAborted, "aborted");
        assert_eq!(ErrorCode::from_io(&aborted), ErrorCode::ConnectionReset);

        let missing = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(ErrorCode::from_io(&missing), ErrorCode::Other("ENOENT".to_owned()));
    }

    #[test]
    fn transport_error_display_includes_code_and_message() {
        let err = WebClientError::from(TransportError::new("ECONNRESET", "socket hang up"));
        assert_eq!(err.to_string(), "transport error: ECONNRESET: socket hang up");
        assert_eq!(err.code(), Some(&ErrorCode::ConnectionReset));
    }
}
