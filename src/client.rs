use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderValue, ACCEPT_ENCODING};
use http::{HeaderMap, Method};
use reqwest::blocking::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::encode::Params;
use crate::request::PreparedRequest;
use crate::response::handle_response;
use crate::uri::{build_uri, method_for_uri};
use crate::{
    ApiResponse, Arg, Authenticator, Error, Kwargs, NoAuth, Result, ID_KEY, METHOD_KEY,
    PHOTO_KEY, PRIVATE_ID_KEY, TIMEOUT_KEY,
};

/// Default API host.
pub const DEFAULT_DOMAIN: &str = "api.fanfou.com";

/// Response format, also used as the path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    /// No suffix, raw text back.
    None,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
            Format::None => "",
        }
    }

    /// `.json`, `.xml`, or nothing.
    pub fn suffix(&self) -> String {
        match self {
            Format::None => String::new(),
            other => format!(".{}", other.as_str()),
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::Json
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "" => Ok(Format::None),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Settings shared by every call built from one client.
#[derive(Debug)]
struct Context {
    auth: Box<dyn Authenticator>,
    format: Format,
    domain: String,
    secure: bool,
    timeout: Option<Duration>,
    gzip: bool,
    inner: ReqwestClient,
}

/// A call to the Fanfou API under construction.
///
/// Each [`segment`](Fanfou::segment) returns a new value with one more path
/// segment; the value it was built from is left as it was, so a partial
/// chain can be kept and reused for any number of calls.
///
/// ```no_run
/// use fanfou::{Fanfou, Kwargs, OAuth};
///
/// # fn run() -> fanfou::Result<()> {
/// let auth = OAuth::new("token", Some("token secret"), "consumer key", Some("consumer secret"))?;
/// let fanfou = Fanfou::builder().auth(auth).build()?;
///
/// // GET statuses/home_timeline.json?count=5
/// let timeline = fanfou.segment("statuses").segment("home_timeline")
///     .call(Kwargs::new().arg("count", 5))?;
///
/// // POST statuses/update.json
/// fanfou.path("statuses/update").call(Kwargs::new().arg("status", "Hello, world!"))?;
///
/// // GET users/show/<id>.json through a placeholder segment
/// let show = fanfou.path("users/show/_user");
/// show.call(Kwargs::new().arg("_user", "ifanfou"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fanfou {
    context: Arc<Context>,
    uriparts: Vec<String>,
}

impl Fanfou {
    pub fn builder() -> FanfouBuilder {
        FanfouBuilder::new()
    }

    /// Anonymous client with default settings.
    pub fn new() -> Result<Self> {
        FanfouBuilder::new().build()
    }

    /// Extend the path by one segment. Segments starting with `_` are
    /// placeholders, filled from the keyword argument of the same name.
    pub fn segment<S: Into<String>>(&self, segment: S) -> Self {
        let mut uriparts = self.uriparts.clone();
        uriparts.push(segment.into());
        Fanfou {
            context: Arc::clone(&self.context),
            uriparts,
        }
    }

    /// Extend the path by every `/`-separated segment of `path`.
    pub fn path(&self, path: &str) -> Self {
        path.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.clone(), |call, s| call.segment(s))
    }

    pub fn uriparts(&self) -> &[String] {
        &self.uriparts
    }

    pub fn format(&self) -> Format {
        self.context.format
    }

    /// Perform the call and decode the response.
    ///
    /// # Errors
    ///
    /// Any HTTP status outside 2xx/3xx becomes [`Error::Http`]; a 304 yields
    /// an empty list instead. Transport, signing and decoding failures are
    /// passed through.
    pub fn call(&self, kwargs: Kwargs) -> Result<ApiResponse> {
        let prepared = self.prepare(kwargs)?;
        debug!(
            method = %prepared.request.method,
            url = %prepared.base_url,
            multipart = prepared.multipart,
            "dispatching Fanfou API call"
        );
        let response = prepared.request.send(&self.context.inner)?;
        handle_response(
            response,
            &prepared.uri,
            self.context.format,
            &prepared.encoded_params,
        )
    }

    /// Assemble the request for `kwargs` without sending it.
    pub fn prepare(&self, kwargs: Kwargs) -> Result<Prepared> {
        let context = &self.context;
        let mut kwargs = kwargs;
        let uri = build_uri(&self.uriparts, &mut kwargs);

        let method = match kwargs.remove(METHOD_KEY) {
            Some(method) if !method.is_empty() => {
                Method::from_bytes(method.as_text().to_uppercase().as_bytes())?
            }
            _ => method_for_uri(&uri),
        };

        if let Some(id) = kwargs.remove(PRIVATE_ID_KEY) {
            if !id.is_empty() {
                kwargs.insert(ID_KEY, id);
            }
        }

        let timeout = match kwargs.remove(TIMEOUT_KEY) {
            Some(timeout) => parse_timeout(&timeout)?,
            None => None,
        }
        .or(context.timeout);

        let base_url = Url::parse(&format!(
            "http{}://{}/{}{}",
            if context.secure { "s" } else { "" },
            context.domain,
            uri,
            context.format.suffix()
        ))?;

        let photo = kwargs.remove(PHOTO_KEY).map(Arg::into_bytes);

        let mut headers = HeaderMap::new();
        if context.gzip {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }
        headers.extend(context.auth.generate_headers());

        let request = PreparedRequest::new(method.clone(), base_url.to_string())
            .headers(headers)
            .timeout(timeout);
        let multipart = photo.is_some();
        let (encoded_params, request) = match photo {
            // a multipart upload signs without its parameters, they travel
            // in the body as sent
            Some(photo) => {
                let encoded_params =
                    context.auth.encode_params(&base_url, &method, &Params::new())?;
                let fields: Vec<(String, Vec<u8>)> = kwargs
                    .into_iter()
                    .map(|(key, value)| (key, value.into_bytes()))
                    .collect();
                let request = request.query(&encoded_params).multipart(&photo, &fields);
                (encoded_params, request)
            }
            None => {
                let params: Params = kwargs
                    .into_iter()
                    .map(|(key, value)| (key, value.into_text()))
                    .collect();
                let encoded_params = context.auth.encode_params(&base_url, &method, &params)?;
                let request = if method == Method::GET {
                    request.query(&encoded_params)
                } else {
                    request.form(encoded_params.clone())
                };
                (encoded_params, request)
            }
        };

        Ok(Prepared {
            uri,
            base_url,
            encoded_params,
            multipart,
            request,
        })
    }
}

fn parse_timeout(value: &Arg) -> Result<Option<Duration>> {
    if value.is_empty() {
        return Ok(None);
    }
    let text = value.as_text();
    let seconds = text
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| Error::InvalidArgument {
            key: TIMEOUT_KEY,
            value: text.to_string(),
        })?;
    if seconds == 0.0 {
        Ok(None)
    } else {
        Ok(Some(Duration::from_secs_f64(seconds)))
    }
}

/// A request assembled by [`Fanfou::prepare`].
#[derive(Debug, Clone)]
pub struct Prepared {
    /// The built path, e.g. `statuses/user_timeline/ifanfou`.
    pub uri: String,
    /// Scheme, domain, path and format suffix, without query.
    pub base_url: Url,
    /// Parameter string produced by the authenticator.
    pub encoded_params: String,
    /// Whether the body is a photo upload.
    pub multipart: bool,
    pub request: PreparedRequest,
}

/// Configures a [`Fanfou`] client.
#[derive(Debug)]
pub struct FanfouBuilder {
    auth: Box<dyn Authenticator>,
    format: String,
    domain: String,
    secure: bool,
    api_version: Option<String>,
    timeout: Option<Duration>,
    gzip: bool,
    client: Option<ReqwestClient>,
}

impl Default for FanfouBuilder {
    fn default() -> Self {
        FanfouBuilder {
            auth: Box::new(NoAuth),
            format: Format::Json.as_str().to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            secure: false,
            api_version: None,
            timeout: None,
            gzip: false,
            client: None,
        }
    }
}

impl FanfouBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Credentials for every call. Anonymous by default.
    pub fn auth<A: Authenticator + 'static>(mut self, auth: A) -> Self {
        self.auth = Box::new(auth);
        self
    }

    /// `json` (default), `xml`, or empty for raw text. Checked by
    /// [`build`](FanfouBuilder::build).
    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    pub fn domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = domain.into();
        self
    }

    /// Use `https`. Off by default.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Prefix every path with an API version such as `1.1`.
    pub fn api_version<S: Into<String>>(mut self, api_version: Option<S>) -> Self {
        self.api_version = api_version.map(Into::into);
        self
    }

    /// Timeout for calls that do not set `_timeout` themselves.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Ask for gzip compressed responses.
    pub fn gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Use a preconfigured `reqwest` client. It must not decompress bodies
    /// on its own.
    pub fn client(mut self, client: ReqwestClient) -> Self {
        self.client = Some(client);
        self
    }

    /// # Errors
    ///
    /// Fails with [`Error::UnknownFormat`] for a format other than `json`,
    /// `xml` or empty, and when the HTTP client cannot be created.
    pub fn build(self) -> Result<Fanfou> {
        let format = self.format.parse::<Format>()?;
        let inner = match self.client {
            Some(client) => client,
            None => ReqwestClient::builder().build()?,
        };
        let uriparts = self
            .api_version
            .filter(|v| !v.is_empty())
            .into_iter()
            .collect();
        Ok(Fanfou {
            context: Arc::new(Context {
                auth: self.auth,
                format,
                domain: self.domain,
                secure: self.secure,
                timeout: self.timeout,
                gzip: self.gzip,
                inner,
            }),
            uriparts,
        })
    }
}
