/*!
fanfou: a client for the [Fanfou](https://fanfou.com) REST API.

# Overview

Calls are not declared one by one. A [`Fanfou`] value holds a path under
construction; every [`segment`](Fanfou::segment) adds to it, and
[`call`](Fanfou::call) turns the path plus keyword arguments into a signed
HTTP request. The verb is picked from the path: endpoints that change state
go out as `POST`, everything else as `GET`.

Requests are signed with OAuth 1.0a (HMAC-SHA1) over exactly the parameter
string that is sent, and go out through the blocking
[reqwest](https://crates.io/crates/reqwest) client.

Everyday calls (timelines, posting, following) live in [`actions`], and
[`archive`] downloads a whole timeline page by page.

# How to use

## Basic usecase 1 - posting a status

```no_run
use fanfou::{Fanfou, Kwargs, OAuth};

# fn run() -> fanfou::Result<()> {
// prepare authorization info
let consumer_key = "[CONSUMER_KEY]";
let consumer_secret = "[CONSUMER_SECRET]";
let access_token = "[ACCESS_TOKEN]";
let token_secret = "[TOKEN_SECRET]";

let auth = OAuth::new(access_token, Some(token_secret), consumer_key, Some(consumer_secret))?;
let fanfou = Fanfou::builder().auth(auth).build()?;

// POST statuses/update.json
let status = fanfou
    .segment("statuses")
    .segment("update")
    .call(Kwargs::new().arg("status", "Hello, Fanfou!"))?;
println!("posted as {}", status.x_auth_user());

// GET statuses/user_timeline/ifanfou.json?count=5
let timeline = fanfou
    .path("statuses/user_timeline")
    .call(Kwargs::new().id("ifanfou").arg("count", 5))?;
# Ok(())
# }
```

## Basic usecase 2 - acquiring OAuth token & secret

```no_run
use std::io;
use fanfou::{write_token_file, TokenExchange};

# fn run() -> Result<(), Box<dyn std::error::Error>> {
let exchange = TokenExchange::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");

// step 1: acquire request token & token secret
let request_token = exchange.request_token()?;

// step 2. acquire user pin
println!("please access to: {}", exchange.authorize_url(&request_token.oauth_token));
println!("input pin: ");
let mut user_input = String::new();
io::stdin().read_line(&mut user_input)?;
let pin = user_input.trim();

// step 3. acquire access token
let access_token = exchange.access_token(&request_token, pin)?;
write_token_file("fanfou_oauth", &access_token.oauth_token, &access_token.oauth_token_secret)?;
println!("other attributes: {:#?}", access_token.remain);
# Ok(())
# }
```
*/
pub mod actions;
pub mod archive;
mod auth;
mod client;
mod encode;
mod error;
mod exchange;
mod fail;
mod kwargs;
mod request;
mod response;
mod secrets;
mod signer;
mod token_reader;
mod uri;

// exposed to external program
pub use archive::Timeline;
pub use auth::{Authenticator, NoAuth, OAuth};
pub use client::{Fanfou, FanfouBuilder, Format, Prepared, DEFAULT_DOMAIN};
pub use encode::{oauth_escape, urlencode_noplus, Params};
pub use error::{
    Error, ErrorBody, FanfouHttpError, Result, SignError, SignResult, TokenReaderError,
    TokenReaderResult,
};
pub use exchange::{TokenExchange, OAUTH_DOMAIN, OOB_CALLBACK};
pub use fail::{Fail, DEFAULT_MAX_FAILURES};
pub use kwargs::{Arg, Kwargs};
pub use request::{multipart_body, PreparedRequest, MULTIPART_BOUNDARY};
pub use response::{wrap_response, ApiResponse, FanfouResponse, ImageResponse, X_AUTH_USER};
pub use secrets::{read_token_file, write_token_file, Secrets, SecretsProvider};
pub use signer::{OAuthParameters, Signer};
pub use token_reader::{read_oauth_token, TokenReader, TokenResponse};
pub use uri::{build_uri, method_for_uri, PLACEHOLDER_PREFIX, POST_ACTIONS};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_token_secret`.
pub const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Keyword appended to the path as the last segment.
pub const ID_KEY: &str = "id";
/// Keyword sent as the `id` parameter instead of a path segment.
pub const PRIVATE_ID_KEY: &str = "_id";
/// Keyword overriding the HTTP verb.
pub const METHOD_KEY: &str = "_method";
/// Keyword holding the per-call timeout in seconds.
pub const TIMEOUT_KEY: &str = "_timeout";
/// Keyword holding image bytes to upload.
pub const PHOTO_KEY: &str = "photo";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
