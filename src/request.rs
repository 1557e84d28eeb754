use std::time::Duration;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use reqwest::blocking::{Client as ReqwestClient, Response};

/// Boundary of multipart uploads. Fixed, so a body is reproducible.
pub const MULTIPART_BOUNDARY: &str = "----FanfouFormBoundary7MA4YWxkTrZu0gW";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A fully assembled request, ready to go over the wire.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    pub(crate) fn new(method: Method, url: String) -> Self {
        PreparedRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Append an encoded parameter string as the query.
    pub(crate) fn query(mut self, encoded: &str) -> Self {
        if !encoded.is_empty() {
            self.url.push('?');
            self.url.push_str(encoded);
        }
        self
    }

    /// Send an encoded parameter string as a form body.
    pub(crate) fn form(mut self, encoded: String) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        self.body = Some(encoded.into_bytes());
        self
    }

    /// Send a `multipart/form-data` body with the photo first, then one text
    /// part per field.
    pub(crate) fn multipart(mut self, photo: &[u8], fields: &[(String, Vec<u8>)]) -> Self {
        let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = Some(multipart_body(photo, fields));
        self
    }

    pub(crate) fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub(crate) fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn send(self, client: &ReqwestClient) -> reqwest::Result<Response> {
        let mut builder = client
            .request(self.method, self.url.as_str())
            .headers(self.headers);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.send()
    }
}

/// RFC 2388 body for a photo upload.
///
/// The photo part must carry a file name, the API refuses uploads without
/// one. Field values are written as given, without any re-encoding.
pub fn multipart_body(photo: &[u8], fields: &[(String, Vec<u8>)]) -> Vec<u8> {
    let delimiter = format!("--{}", MULTIPART_BOUNDARY);
    let mut lines: Vec<Vec<u8>> = vec![
        delimiter.clone().into_bytes(),
        b"Content-Disposition: form-data; name=\"photo\"; filename=\"filename\"".to_vec(),
        b"Content-Type: application/octet-stream".to_vec(),
        Vec::new(),
        photo.to_vec(),
    ];
    for (key, value) in fields {
        lines.push(delimiter.clone().into_bytes());
        lines.push(format!("Content-Disposition: form-data; name=\"{}\"", key).into_bytes());
        lines.push(b"Content-Type: text/plain;charset=utf-8".to_vec());
        lines.push(Vec::new());
        lines.push(value.clone());
    }
    lines.push(format!("{}--", delimiter).into_bytes());
    lines.push(Vec::new());
    lines.push(Vec::new());
    lines.join(&b"\r\n"[..])
}
