use std::time::Duration;

use crate::{
    Fanfou, Kwargs, OAuth, Result, Secrets, TokenReader, TokenResponse, OAUTH_CALLBACK_KEY,
    OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY,
};

/// Host serving the OAuth endpoints.
pub const OAUTH_DOMAIN: &str = "fanfou.com";

/// Callback for out-of-band (PIN based) authorization.
pub const OOB_CALLBACK: &str = "oob";

/// The three-legged OAuth exchange for desktop applications.
///
/// 1. [`request_token`](TokenExchange::request_token) obtains a request token.
/// 2. The user opens [`authorize_url`](TokenExchange::authorize_url), allows
///    access and is shown a PIN.
/// 3. [`access_token`](TokenExchange::access_token) trades the request token
///    and the PIN for the access token.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    consumer_key: String,
    consumer_secret: String,
    domain: String,
    secure: bool,
    timeout: Option<Duration>,
}

impl TokenExchange {
    pub fn new<K, S>(consumer_key: K, consumer_secret: S) -> Self
    where
        K: Into<String>,
        S: Into<String>,
    {
        TokenExchange {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            domain: OAUTH_DOMAIN.to_string(),
            secure: false,
            timeout: None,
        }
    }

    pub fn domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Step 1. Ask for a request token with an out-of-band callback.
    pub fn request_token(&self) -> Result<TokenResponse> {
        self.client("", "")?
            .path("oauth/request_token")
            .call(Kwargs::new().arg(OAUTH_CALLBACK_KEY, OOB_CALLBACK))
            .parse_oauth_token()
    }

    /// Step 2. Page where the user authorizes the request token.
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}://{}/oauth/authorize?{}={}",
            self.scheme(),
            self.domain,
            OAUTH_TOKEN_KEY,
            request_token
        )
    }

    /// Step 3. Exchange the authorized request token and the PIN for an
    /// access token.
    pub fn access_token(
        &self,
        request_token: &TokenResponse,
        verifier: &str,
    ) -> Result<TokenResponse> {
        self.client(&request_token.oauth_token, &request_token.oauth_token_secret)?
            .path("oauth/access_token")
            .call(Kwargs::new().arg(OAUTH_VERIFIER_KEY, verifier))
            .parse_oauth_token()
    }

    fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    fn client(&self, token: &str, token_secret: &str) -> Result<Fanfou> {
        let auth: OAuth = Secrets::new(self.consumer_key.as_str(), self.consumer_secret.as_str())
            .token(token, token_secret)
            .into();
        let mut builder = Fanfou::builder()
            .auth(auth)
            .format("")
            .domain(self.domain.as_str())
            .secure(self.secure);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::Format;

    #[test]
    fn authorize_url_carries_token() {
        let exchange = TokenExchange::new("key", "secret");
        assert_eq!(
            exchange.authorize_url("abc"),
            "http://fanfou.com/oauth/authorize?oauth_token=abc"
        );
        assert_eq!(
            exchange.secure(true).domain("example.com").authorize_url("abc"),
            "https://example.com/oauth/authorize?oauth_token=abc"
        );
    }

    #[test]
    fn request_token_call_shape() {
        let exchange = TokenExchange::new("key", "secret");
        let fanfou = exchange.client("", "").unwrap();
        assert_eq!(fanfou.format(), Format::None);
        let prepared = fanfou
            .path("oauth/request_token")
            .prepare(Kwargs::new().arg(OAUTH_CALLBACK_KEY, OOB_CALLBACK))
            .unwrap();
        assert_eq!(prepared.request.method, Method::POST);
        assert_eq!(prepared.request.url, "http://fanfou.com/oauth/request_token");
        assert!(prepared.encoded_params.starts_with("oauth_callback=oob&oauth_consumer_key=key&"));
        assert!(!prepared.encoded_params.contains("oauth_token="));
    }

    #[test]
    fn access_token_call_shape() {
        let exchange = TokenExchange::new("key", "secret");
        let fanfou = exchange.client("reqtoken", "reqsecret").unwrap();
        let prepared = fanfou
            .path("oauth/access_token")
            .prepare(Kwargs::new().arg(OAUTH_VERIFIER_KEY, "123456"))
            .unwrap();
        assert_eq!(prepared.request.url, "http://fanfou.com/oauth/access_token");
        assert!(prepared.encoded_params.contains("&oauth_token=reqtoken&"));
        assert!(prepared.encoded_params.contains("&oauth_verifier=123456&"));
    }
}
