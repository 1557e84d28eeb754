//! OAuth flavoured parameter encoding.
//!
//! Only `A-Za-z0-9-_.~` pass through unescaped, and a space always becomes
//! `%20`. Generic form encoding (`+` for space, `~` escaped) yields strings
//! the server computes a different signature for.
use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Request parameters. Iteration is always sorted by key.
pub type Params = BTreeMap<String, String>;

const OAUTH_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-escape a single component.
pub fn oauth_escape(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_UNRESERVED).to_string()
}

/// Encode `params` as `key=value` pairs joined by `&`, in key order.
pub fn urlencode_noplus(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", oauth_escape(key), oauth_escape(value)))
        .collect::<Vec<_>>()
        .join("&")
}
