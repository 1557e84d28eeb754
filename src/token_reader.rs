use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    ApiResponse, Result, TokenReaderError, TokenReaderResult, OAUTH_TOKEN_KEY,
    OAUTH_TOKEN_SECRET_KEY,
};

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

/// Add parse_oauth_token feature to the result of a token endpoint call.
///
/// The token endpoints answer with a form encoded body, so the call must be
/// made with the empty format to receive it as text.
pub trait TokenReader: private::Sealed {
    fn parse_oauth_token(self) -> Result<TokenResponse>;
}

impl TokenReader for ApiResponse {
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        match self {
            ApiResponse::Text(text) => Ok(read_oauth_token(text)?),
            other => Err(TokenReaderError::UnexpectedResponse(other.kind()).into()),
        }
    }
}

impl TokenReader for Result<ApiResponse> {
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        self?.parse_oauth_token()
    }
}

pub fn read_oauth_token(text: String) -> TokenReaderResult<TokenResponse> {
    let mut destructured = text
        .trim_end()
        .split('&')
        .map(|e| e.splitn(2, '='))
        .map(|mut iter| {
            (
                iter.next().unwrap_or_default().to_string(),
                iter.next().unwrap_or_default().to_string(),
            )
        })
        .collect::<HashMap<String, String>>();
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(OAUTH_TOKEN_KEY, text)),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text,
        )),
    }
}

mod private {
    use crate::{ApiResponse, Result};

    pub trait Sealed {}
    impl Sealed for ApiResponse {}
    impl Sealed for Result<ApiResponse> {}
}
