use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use http::Method;
use sha1::Sha1;
use url::Url;

use crate::encode::{oauth_escape, urlencode_noplus, Params};
use crate::{
    SecretsProvider, SignError, SignResult, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY,
    OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY, OAUTH_VERSION_KEY,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign `params` for a request to `url` and return the parameter string
    /// to send: every request and `oauth_*` parameter in canonical order,
    /// followed by `oauth_signature`.
    ///
    /// The signature is HMAC-SHA1 over `METHOD&url&params`, each part escaped
    /// on its own, where `params` is exactly the string that goes over the
    /// wire. The key is the consumer secret as given, `&`, and the escaped
    /// token secret.
    ///
    /// `url` must not carry a query string. `oauth_callback` and
    /// `oauth_verifier` are accepted in `params`; any other `oauth_*` key is
    /// rejected.
    pub fn generate_signature(
        &self,
        method: &Method,
        url: &Url,
        params: &Params,
    ) -> SignResult<String> {
        for key in params.keys() {
            if key.starts_with(OAUTH_KEY_PREFIX)
                && key != OAUTH_CALLBACK_KEY
                && key != OAUTH_VERIFIER_KEY
            {
                return Err(SignError::UnknownParameter(key.clone()));
            }
        }

        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_option_pair();
        // an empty token means we are still asking for a request token
        let token = token.filter(|t| !t.is_empty());
        let nonce = self
            .parameters
            .nonce
            .clone()
            .unwrap_or_else(generate_nonce);
        let timestamp = self.parameters.timestamp.unwrap_or_else(current_timestamp);

        let mut wire = params.clone();
        if let Some(token) = token {
            wire.insert(OAUTH_TOKEN_KEY.to_string(), token.to_string());
        }
        wire.insert(OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string());
        wire.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            SIGNATURE_METHOD.to_string(),
        );
        wire.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());
        wire.insert(OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string());
        wire.insert(OAUTH_NONCE_KEY.to_string(), nonce);
        let enc_params = urlencode_noplus(&wire);

        let base_string = signature_base_string(method, url, &enc_params);
        let key = signing_key(consumer_secret, token_secret.unwrap_or_default());
        let signature = hmac_sha1_base64(&key, &base_string)?;

        Ok(format!(
            "{}&{}={}",
            enc_params,
            OAUTH_SIGNATURE_KEY,
            oauth_escape(&signature)
        ))
    }
}

/// `METHOD&url&params`, every component escaped as one opaque value.
fn signature_base_string(method: &Method, url: &Url, enc_params: &str) -> String {
    [
        method.as_str().to_uppercase().as_str(),
        url.as_str(),
        enc_params,
    ]
    .iter()
    .map(|part| oauth_escape(part))
    .collect::<Vec<_>>()
    .join("&")
}

// the consumer secret goes in unescaped
fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!("{}&{}", consumer_secret, oauth_escape(token_secret))
}

fn hmac_sha1_base64(key: &str, message: &str) -> SignResult<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn generate_nonce() -> String {
    rand::random::<u64>().to_string()
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Overrides for the per-signature values.
///
/// Whatever is left unset is generated fresh for every signature: a random
/// 64-bit decimal nonce and the current unix time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthParameters {
    nonce: Option<String>,
    timestamp: Option<u64>,
}

impl OAuthParameters {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }
}
