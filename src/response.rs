//! Decoded API responses.
//!
//! JSON objects and arrays come back wrapped in a [`FanfouResponse`], which
//! carries the response headers next to the value but otherwise behaves like
//! the value itself: it compares, hashes, iterates and serializes exactly as
//! the plain container does.
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::ops::{Deref, DerefMut, Index};

use flate2::read::GzDecoder;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::{ErrorBody, FanfouHttpError, Format, Result};

/// Header carrying the authenticated user's id.
pub const X_AUTH_USER: &str = "X-AuthUser";

const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// A decoded JSON container plus the headers of the response it came from.
#[derive(Debug, Clone, Default)]
pub struct FanfouResponse<T> {
    value: T,
    headers: HeaderMap,
}

impl<T> FanfouResponse<T> {
    pub fn new(value: T, headers: HeaderMap) -> Self {
        FanfouResponse { value, headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `X-AuthUser` header, or an empty string when absent.
    pub fn x_auth_user(&self) -> &str {
        self.headers
            .get(X_AUTH_USER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> From<T> for FanfouResponse<T> {
    fn from(value: T) -> Self {
        FanfouResponse::new(value, HeaderMap::new())
    }
}

impl<T> Deref for FanfouResponse<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for FanfouResponse<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PartialEq> PartialEq for FanfouResponse<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for FanfouResponse<T> {}

impl<T: Hash> Hash for FanfouResponse<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T, I> Index<I> for FanfouResponse<T>
where
    T: Index<I>,
{
    type Output = T::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.value[index]
    }
}

impl<T: IntoIterator> IntoIterator for FanfouResponse<T> {
    type Item = T::Item;
    type IntoIter = T::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.value.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a FanfouResponse<T>
where
    &'a T: IntoIterator,
{
    type Item = <&'a T as IntoIterator>::Item;
    type IntoIter = <&'a T as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (&self.value).into_iter()
    }
}

impl<T: Serialize> Serialize for FanfouResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FanfouResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        T::deserialize(deserializer).map(FanfouResponse::from)
    }
}

/// Image body, left unread for the caller.
#[derive(Debug)]
pub struct ImageResponse {
    content_type: String,
    inner: reqwest::blocking::Response,
}

impl ImageResponse {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }
}

impl Read for ImageResponse {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Result of a successful call.
#[derive(Debug)]
pub enum ApiResponse {
    /// A JSON object, or the empty object for an empty body.
    Object(FanfouResponse<Map<String, Value>>),
    /// A JSON array.
    List(FanfouResponse<Vec<Value>>),
    /// A JSON scalar. Headers are not kept.
    Value(Value),
    /// A body requested without JSON decoding (`xml` or empty format).
    Text(String),
    Image(ImageResponse),
}

impl ApiResponse {
    /// Response headers, where they were kept.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            ApiResponse::Object(r) => Some(r.headers()),
            ApiResponse::List(r) => Some(r.headers()),
            ApiResponse::Image(r) => Some(r.headers()),
            ApiResponse::Value(_) | ApiResponse::Text(_) => None,
        }
    }

    /// The `X-AuthUser` header, or an empty string when absent.
    pub fn x_auth_user(&self) -> &str {
        self.headers()
            .and_then(|h| h.get(X_AUTH_USER))
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// The decoded JSON value, if the body was JSON.
    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Object(r) => Some(Value::Object(r.into_inner())),
            ApiResponse::List(r) => Some(Value::Array(r.into_inner())),
            ApiResponse::Value(v) => Some(v),
            ApiResponse::Text(_) | ApiResponse::Image(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ApiResponse::Object(_) => "object",
            ApiResponse::List(_) => "list",
            ApiResponse::Value(_) => "value",
            ApiResponse::Text(_) => "text",
            ApiResponse::Image(_) => "image",
        }
    }
}

/// Attach `headers` to containers; anything else passes through.
pub fn wrap_response(value: Value, headers: HeaderMap) -> ApiResponse {
    match value {
        Value::Object(map) => ApiResponse::Object(FanfouResponse::new(map, headers)),
        Value::Array(list) => ApiResponse::List(FanfouResponse::new(list, headers)),
        other => ApiResponse::Value(other),
    }
}

/// Read a body to its end. A transport error midway keeps what arrived.
pub(crate) fn read_body<R: Read>(mut reader: R) -> Vec<u8> {
    let mut data = Vec::new();
    if let Err(e) = reader.read_to_end(&mut data) {
        warn!(error = %e, received = data.len(), "incomplete read, using partial body");
    }
    data
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .map_or(false, |v| v.as_bytes() == b"gzip")
}

/// Undo `Content-Encoding: gzip`, leaving other bodies untouched.
pub(crate) fn decompress(headers: &HeaderMap, data: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(headers) {
        return Ok(data);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(data.as_slice()).read_to_end(&mut decoded)?;
    Ok(decoded)
}

/// Turn a successful body into an [`ApiResponse`].
pub(crate) fn decode_body(headers: HeaderMap, data: Vec<u8>, format: Format) -> Result<ApiResponse> {
    let data = decompress(&headers, data)?;
    if data.is_empty() {
        return Ok(ApiResponse::Object(FanfouResponse::new(Map::new(), headers)));
    }
    let text = String::from_utf8(data)?;
    if format == Format::Json {
        let value: Value = serde_json::from_str(&text)?;
        Ok(wrap_response(value, headers))
    } else {
        Ok(ApiResponse::Text(text))
    }
}

/// Build the error for a failed call. Decoding problems in the body are
/// tolerated and keep the body in its rawest usable form.
pub(crate) fn http_error(
    status: StatusCode,
    headers: &HeaderMap,
    data: Vec<u8>,
    uri: &str,
    format: Format,
    params: &str,
) -> FanfouHttpError {
    let data = match decompress(headers, data.clone()) {
        Ok(decoded) => decoded,
        Err(_) => data,
    };
    debug!(status = status.as_u16(), uri, "Fanfou API returned an error");
    FanfouHttpError {
        status,
        uri: uri.to_string(),
        format,
        params: params.to_string(),
        response: ErrorBody::decode(data, format),
    }
}

/// Route a raw HTTP response to the matching result.
pub(crate) fn handle_response(
    response: reqwest::blocking::Response,
    uri: &str,
    format: Format,
    params: &str,
) -> Result<ApiResponse> {
    let status = response.status();
    let headers = response.headers().clone();

    if status == StatusCode::NOT_MODIFIED {
        return Ok(ApiResponse::List(FanfouResponse::new(Vec::new(), headers)));
    }
    if !(status.is_success() || status.is_redirection()) {
        let data = read_body(response);
        return Err(http_error(status, &headers, data, uri, format, params).into());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if IMAGE_CONTENT_TYPES.contains(&content_type) {
        trace!(content_type, "passing image body through");
        return Ok(ApiResponse::Image(ImageResponse {
            content_type: content_type.to_string(),
            inner: response,
        }));
    }

    let data = read_body(response);
    let decoded = decode_body(headers, data, format)?;
    trace!(kind = decoded.kind(), "decoded response");
    Ok(decoded)
}
