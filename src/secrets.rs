use std::{fs, io::Write, path::Path};

use crate::Result;

pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);

    fn get_token_pair_option(&self) -> Option<(&str, &str)>;

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or((None, None))
    }
}

/// Consumer credentials, optionally paired with an access (or request) token.
///
/// `Secrets<()>` carries no token; `Secrets<String>` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secrets<T> {
    token: T,
    token_secret: T,
    consumer_key: String,
    consumer_secret: String,
}

impl Secrets<()> {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Secrets {
            token: (),
            token_secret: (),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Secrets<String>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Secrets {
            token: token.into(),
            token_secret: token_secret.into(),
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
        }
    }
}

impl SecretsProvider for Secrets<()> {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        None
    }
}

impl SecretsProvider for Secrets<String> {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        Some((&self.token, &self.token_secret))
    }
}

/// Read the token file written by [`write_token_file`].
///
/// Returns `(oauth_token, oauth_token_secret)` with surrounding whitespace
/// removed. Missing lines read as empty strings.
pub fn read_token_file<P: AsRef<Path>>(path: P) -> Result<(String, String)> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();
    let token = lines.next().unwrap_or_default().trim().to_string();
    let token_secret = lines.next().unwrap_or_default().trim().to_string();
    Ok((token, token_secret))
}

/// Store the token and its secret, one per line.
pub fn write_token_file<P: AsRef<Path>>(path: P, token: &str, token_secret: &str) -> Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "{}", token)?;
    writeln!(file, "{}", token_secret)?;
    Ok(())
}
