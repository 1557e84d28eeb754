use std::fmt::Debug;

use http::{HeaderMap, Method};
use url::Url;

use crate::encode::{urlencode_noplus, Params};
use crate::{Error, OAuthParameters, Result, Secrets, Signer};

/// How a client proves who it is.
///
/// An authenticator is built once per client and shared by every call made
/// through it, so implementations must not rely on per-call mutation.
pub trait Authenticator: Debug + Send + Sync {
    /// Encode `params` for a request to `base_url`, adding whatever the
    /// scheme requires. The result is sent as the query string or the body.
    fn encode_params(&self, base_url: &Url, method: &Method, params: &Params) -> Result<String>;

    /// Extra headers to send with every request.
    fn generate_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }
}

/// Anonymous access. Parameters are sent as they are, without a signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn encode_params(&self, _base_url: &Url, _method: &Method, params: &Params) -> Result<String> {
        Ok(urlencode_noplus(params))
    }
}

/// OAuth 1.0a with HMAC-SHA1 signatures.
#[derive(Debug, Clone)]
pub struct OAuth {
    secrets: Secrets<String>,
    parameters: OAuthParameters,
}

impl OAuth {
    /// Create the authenticator.
    ///
    /// While the token exchange is still in progress there is no token yet;
    /// pass empty strings then. `None` for either secret is refused.
    pub fn new<T, K>(
        token: T,
        token_secret: Option<&str>,
        consumer_key: K,
        consumer_secret: Option<&str>,
    ) -> Result<Self>
    where
        T: Into<String>,
        K: Into<String>,
    {
        let token_secret = token_secret.ok_or(Error::MissingCredentials("token_secret"))?;
        let consumer_secret =
            consumer_secret.ok_or(Error::MissingCredentials("consumer_secret"))?;
        Ok(Secrets::new(consumer_key, consumer_secret)
            .token(token, token_secret)
            .into())
    }

    /// Pin the nonce and/or timestamp of every signature this authenticator
    /// produces.
    pub fn with_params(self, parameters: OAuthParameters) -> Self {
        OAuth { parameters, ..self }
    }

    pub fn secrets(&self) -> &Secrets<String> {
        &self.secrets
    }
}

impl From<Secrets<String>> for OAuth {
    fn from(secrets: Secrets<String>) -> Self {
        OAuth {
            secrets,
            parameters: OAuthParameters::new(),
        }
    }
}

impl Authenticator for OAuth {
    fn encode_params(&self, base_url: &Url, method: &Method, params: &Params) -> Result<String> {
        let signer = Signer::new(&self.secrets, self.parameters.clone());
        Ok(signer.generate_signature(method, base_url, params)?)
    }
}
