use std::fmt;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::Format;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown data format \"{0}\", expected one of json, xml or empty")]
    UnknownFormat(String),
    #[error("missing credentials: {0} must be supplied, an empty string is accepted")]
    MissingCredentials(&'static str),
    #[error(transparent)]
    Http(#[from] FanfouHttpError),
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("malformed JSON response : {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not valid UTF-8 : {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("i/o failed : {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid request URL : {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid HTTP method : {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),
    #[error("invalid value {value:?} for keyword {key}")]
    InvalidArgument { key: &'static str, value: String },
    #[error("OAuth sign failed : {0}")]
    Signer(#[from] SignError),
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("too many consecutive failures ({0}), giving up")]
    TooManyFailures(u32),
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether repeating the same call may succeed.
    ///
    /// Transport failures, rate limiting and server-side errors qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Reqwest(_) => true,
            Error::Http(e) => e.status.is_server_error() || e.status == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if it came from the API.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(e) => Some(e.status),
            Error::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("unknown oauth parameter : {0}")]
    UnknownParameter(String),
    #[error("signing key rejected : {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("expected a plain text token response, got {0}")]
    UnexpectedResponse(&'static str),
}

/// A non-success answer from the API.
///
/// `uri` is the built path (without domain or format suffix) and `params` the
/// encoded parameter string that was sent along with the request.
#[derive(Error, Debug, Clone)]
#[error(
    "Fanfou HTTP Error {} for URL: {}{}, using parameters: ({})\ndetails: {}",
    .status.as_u16(),
    .uri,
    .format.suffix(),
    .params,
    .response
)]
pub struct FanfouHttpError {
    pub status: StatusCode,
    pub uri: String,
    pub format: Format,
    pub params: String,
    pub response: ErrorBody,
}

/// Body of an error response, decoded as far as it allows.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ErrorBody {
    pub(crate) fn decode(data: Vec<u8>, format: Format) -> Self {
        if data.is_empty() {
            return ErrorBody::Empty;
        }
        let text = match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => return ErrorBody::Binary(e.into_bytes()),
        };
        if format == Format::Json {
            if let Ok(value) = serde_json::from_str(&text) {
                return ErrorBody::Json(value);
            }
        }
        ErrorBody::Text(text)
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Empty => f.write_str("{}"),
            ErrorBody::Json(value) => write!(f, "{}", value),
            ErrorBody::Text(text) => f.write_str(text),
            ErrorBody::Binary(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
