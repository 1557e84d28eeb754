//! Command-line access to the Fanfou API.
//!
//! # Usage
//!
//! ```bash
//! export FANFOU_CONSUMER_KEY=... FANFOU_CONSUMER_SECRET=...
//!
//! # authorize once, the token lands in ~/.fanfou_oauth
//! fanfou request-token
//! fanfou access-token --token T --secret S --verifier PIN
//!
//! fanfou whoami
//! fanfou friends --length 5
//! fanfou set "a status longer than one post is split" --invert-split
//! fanfou archive ifanfou --timeline favorites > favorites.json
//! fanfou call statuses/home_timeline count=5
//! fanfou call statuses/update status="hello"
//! fanfou call photos/upload status="look" --photo cat.jpg
//! ```

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _};
use clap::{ArgAction, Parser, Subcommand};
use fanfou::actions::{self, DEFAULT_LENGTH};
use fanfou::archive::{self, RETRY_DELAY};
use fanfou::{
    read_token_file, write_token_file, ApiResponse, Error, Fail, Fanfou, FanfouBuilder, Kwargs,
    NoAuth, OAuth, Timeline, TokenExchange, TokenResponse, DEFAULT_DOMAIN,
};
use http::Method;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const TOKEN_FILE_NAME: &str = ".fanfou_oauth";

/// Fanfou API client.
#[derive(Parser, Debug)]
#[command(name = "fanfou")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Consumer key of the registered application.
    #[arg(long, env = "FANFOU_CONSUMER_KEY", hide_env_values = true)]
    consumer_key: String,

    /// Consumer secret of the registered application.
    #[arg(long, env = "FANFOU_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: String,

    /// API host.
    #[arg(long, env = "FANFOU_DOMAIN", default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// Use https.
    #[arg(long, default_value_t = false)]
    secure: bool,

    /// API version prepended to every path.
    #[arg(long, env = "FANFOU_API_VERSION")]
    api_version: Option<String>,

    /// Response format: json, xml, or an empty string for raw text.
    #[arg(long, env = "FANFOU_FORMAT", default_value = "json")]
    format: String,

    /// File holding the access token. Defaults to ~/.fanfou_oauth.
    #[arg(long, env = "FANFOU_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, env = "FANFOU_TIMEOUT", value_parser = parse_seconds)]
    timeout: Option<Duration>,

    /// Ask for gzip compressed responses.
    #[arg(long, default_value_t = false)]
    gzip: bool,

    /// More log output, repeat for more. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Call any endpoint, e.g. `call statuses/user_timeline count=5`.
    Call {
        /// Endpoint path without format suffix.
        path: String,

        /// Parameters as key=value.
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Force the HTTP verb.
        #[arg(long)]
        method: Option<Method>,

        /// Id appended to the path.
        #[arg(long)]
        id: Option<String>,

        /// Image to upload.
        #[arg(long)]
        photo: Option<PathBuf>,

        /// Give up after this many consecutive retryable failures.
        #[arg(long, default_value_t = fanfou::DEFAULT_MAX_FAILURES)]
        retries: u32,
    },
    /// Obtain a request token and print the authorization URL.
    RequestToken,
    /// Trade an authorized request token for an access token and save it.
    AccessToken {
        /// Request token.
        #[arg(long)]
        token: String,

        /// Request token secret.
        #[arg(long)]
        secret: String,

        /// PIN shown after authorization.
        #[arg(long)]
        verifier: String,
    },
    /// Show the authenticated user.
    Whoami,
    /// Home timeline, oldest first.
    Friends {
        /// Number of statuses.
        #[arg(long, default_value_t = DEFAULT_LENGTH)]
        length: u32,
    },
    /// Statuses mentioning you, oldest first.
    Replies {
        /// Number of statuses.
        #[arg(long, default_value_t = DEFAULT_LENGTH)]
        length: u32,
    },
    /// Search public statuses.
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Post a status, split into several when too long.
    Set {
        /// Words of the status, joined by spaces.
        #[arg(required = true)]
        text: Vec<String>,

        /// Post the last part first.
        #[arg(long, default_value_t = false)]
        invert_split: bool,
    },
    /// Follow a user.
    Follow {
        /// User id.
        user: String,
    },
    /// Stop following a user.
    Leave {
        /// User id.
        user: String,
    },
    /// Download a whole timeline as JSON.
    Archive {
        /// User whose timeline is read. Defaults to you.
        user: Option<String>,

        /// One of user, mentions, inbox, sent, favorites.
        #[arg(long, default_value = "user", value_parser = parse_timeline)]
        timeline: Timeline,

        /// Give up after this many consecutive failures on one page.
        #[arg(long, default_value_t = fanfou::DEFAULT_MAX_FAILURES)]
        retries: u32,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", s))
}

fn parse_timeline(s: &str) -> Result<Timeline, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    s.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| format!("expected a positive number of seconds, got {:?}", s))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(Error::TooManyFailures(n)) = e.downcast_ref::<Error>() {
                eprintln!("Giving up after {} failures: {:#}", n, e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Call {
            path,
            params,
            method,
            id,
            photo,
            retries,
        } => {
            let mut kwargs: Kwargs = params.iter().cloned().collect();
            if let Some(method) = method {
                kwargs = kwargs.method(method.clone());
            }
            if let Some(id) = id {
                kwargs = kwargs.id(id.as_str());
            }
            if let Some(photo) = photo {
                let data = fs::read(photo)
                    .with_context(|| format!("cannot read photo {}", photo.display()))?;
                kwargs = kwargs.photo(data);
            }
            let fanfou = client(&args)?;
            let response = call_with_retries(&fanfou.path(path), kwargs, *retries)?;
            print_response(response)
        }
        Command::RequestToken => {
            let exchange = exchange(&args);
            let token = exchange.request_token()?;
            println!("oauth_token: {}", token.oauth_token);
            println!("oauth_token_secret: {}", token.oauth_token_secret);
            println!();
            println!("Authorize the application at:");
            println!("  {}", exchange.authorize_url(&token.oauth_token));
            println!(
                "then run `fanfou access-token --token {} --secret {} --verifier <PIN>`",
                token.oauth_token, token.oauth_token_secret
            );
            Ok(())
        }
        Command::AccessToken {
            token,
            secret,
            verifier,
        } => {
            let request_token = TokenResponse {
                oauth_token: token.clone(),
                oauth_token_secret: secret.clone(),
                remain: HashMap::new(),
            };
            let access_token = exchange(&args).access_token(&request_token, verifier)?;
            let path = token_file(&args)?;
            write_token_file(
                &path,
                &access_token.oauth_token,
                &access_token.oauth_token_secret,
            )?;
            println!("Authorization keys have been written to {}.", path.display());
            Ok(())
        }
        Command::Whoami => {
            let path = token_file(&args)?;
            if !path.exists() {
                bail!("no token file at {}, run request-token first", path.display());
            }
            let fanfou = client(&args)?;
            let response = fanfou
                .path("account/verify_credentials")
                .call(Kwargs::new())?;
            println!("X-AuthUser: {}", response.x_auth_user());
            let screen_name = response
                .into_json()
                .as_ref()
                .and_then(|user| user.get("screen_name"))
                .and_then(|name| name.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("response carries no screen_name"))?;
            println!("screen_name: {}", screen_name);
            Ok(())
        }
        Command::Friends { length } => print_json(&actions::friends(&client(&args)?, *length)?),
        Command::Replies { length } => print_json(&actions::replies(&client(&args)?, *length)?),
        Command::Search { terms } => {
            print_json(&actions::search(&client(&args)?, terms.as_slice())?)
        }
        Command::Set { text, invert_split } => {
            let text = text.join(" ");
            print_json(&actions::set_status(&client(&args)?, &text, *invert_split)?)
        }
        Command::Follow { user } => print_json(&actions::follow(&client(&args)?, user)?),
        Command::Leave { user } => print_json(&actions::leave(&client(&args)?, user)?),
        Command::Archive {
            user,
            timeline,
            retries,
        } => {
            let fanfou = client(&args)?;
            let mut fail = Fail::new(*retries);
            let statuses =
                archive::fetch_all(&fanfou, *timeline, user.as_deref(), &mut fail, RETRY_DELAY)?;
            print_json(&statuses)
        }
    }
}

fn call_with_retries(call: &Fanfou, kwargs: Kwargs, retries: u32) -> fanfou::Result<ApiResponse> {
    let mut fail = Fail::new(retries);
    loop {
        match call.call(kwargs.clone()) {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "call failed");
                fail.wait(RETRY_DELAY)?;
            }
            Err(e) => return Err(e),
        }
    }
}

fn print_response(response: ApiResponse) -> anyhow::Result<()> {
    match response {
        ApiResponse::Text(text) => println!("{}", text),
        ApiResponse::Image(mut image) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut image, &mut out)?;
            out.flush()?;
        }
        other => {
            let value = other
                .into_json()
                .ok_or_else(|| anyhow!("response is not JSON"))?;
            print_json(&value)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn token_file(args: &Args) -> anyhow::Result<PathBuf> {
    match &args.token_file {
        Some(path) => Ok(path.clone()),
        None => dirs::home_dir()
            .map(|home| home.join(TOKEN_FILE_NAME))
            .ok_or_else(|| anyhow!("cannot locate the home directory, pass --token-file")),
    }
}

fn builder(args: &Args) -> FanfouBuilder {
    let mut builder = Fanfou::builder()
        .format(args.format.as_str())
        .domain(args.domain.as_str())
        .secure(args.secure)
        .api_version(args.api_version.as_deref())
        .gzip(args.gzip);
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

/// Signed client when a token file exists, anonymous otherwise.
fn client(args: &Args) -> anyhow::Result<Fanfou> {
    let path = token_file(args)?;
    let builder = builder(args);
    let builder = if path.exists() {
        let (token, token_secret) = read_token_file(&path)?;
        debug!(path = %path.display(), "using stored access token");
        builder.auth(OAuth::new(
            token,
            Some(token_secret.as_str()),
            args.consumer_key.as_str(),
            Some(args.consumer_secret.as_str()),
        )?)
    } else {
        debug!(path = %path.display(), "no token file, calling anonymously");
        builder.auth(NoAuth)
    };
    Ok(builder.build()?)
}

fn exchange(args: &Args) -> TokenExchange {
    let mut exchange = TokenExchange::new(args.consumer_key.as_str(), args.consumer_secret.as_str())
        .secure(args.secure);
    if let Some(timeout) = args.timeout {
        exchange = exchange.timeout(timeout);
    }
    exchange
}
