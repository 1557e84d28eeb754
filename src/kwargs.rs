use std::borrow::Cow;
use std::collections::btree_map::{BTreeMap, IntoIter, Iter};
use std::fmt;
use std::time::Duration;

use http::Method;

use crate::{ID_KEY, METHOD_KEY, PHOTO_KEY, TIMEOUT_KEY};

/// A single keyword argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    Bytes(Vec<u8>),
}

impl Arg {
    /// Text form of the value. Bytes that are not UTF-8 are replaced lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Arg::Text(text) => Cow::Borrowed(text),
            Arg::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Arg::Text(text) => text,
            Arg::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            },
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Arg::Text(text) => text.into_bytes(),
            Arg::Bytes(bytes) => bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Arg::Text(text) => text.is_empty(),
            Arg::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Text(value.clone())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Arg::Bytes(value)
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Arg::Bytes(value.to_vec())
    }
}

macro_rules! arg_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Text(value.to_string())
                }
            }
        )*
    };
}

arg_from_display!(i32, i64, u32, u64, usize);

/// Keyword arguments of one API call.
///
/// Besides ordinary API parameters a few names are reserved and consumed by
/// the dispatcher: `_id`, `_timeout`, `_method`, `photo`, and every name
/// that matches a placeholder segment of the call path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kwargs(BTreeMap<String, Arg>);

impl Kwargs {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an argument, replacing a previous one with the same name.
    pub fn arg<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Arg>,
    {
        self.insert(key, value);
        self
    }

    /// Target id, appended to the path unless a placeholder takes it.
    pub fn id<V: Into<Arg>>(self, id: V) -> Self {
        self.arg(ID_KEY, id)
    }

    /// Per-call timeout, overriding the client default.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.arg(TIMEOUT_KEY, timeout.as_secs_f64().to_string())
    }

    /// Force the HTTP verb instead of deriving it from the path.
    pub fn method(self, method: Method) -> Self {
        self.arg(METHOD_KEY, method.as_str())
    }

    /// Image to upload. The call is sent as `multipart/form-data`.
    pub fn photo<V: Into<Vec<u8>>>(self, photo: V) -> Self {
        self.arg(PHOTO_KEY, Arg::Bytes(photo.into()))
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Arg>
    where
        K: Into<String>,
        V: Into<Arg>,
    {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Arg> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Arg> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Arg> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Kwargs
where
    K: Into<String>,
    V: Into<Arg>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Kwargs(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Kwargs {
    type Item = (String, Arg);
    type IntoIter = IntoIter<String, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Kwargs {
    type Item = (&'a String, &'a Arg);
    type IntoIter = Iter<'a, String, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
