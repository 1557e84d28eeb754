//! Paged download of a whole timeline.
//!
//! Pages of [`PAGE_SIZE`] statuses are requested, each one older than the
//! last status of the previous page, until the API runs out.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::actions::into_list;
use crate::{Error, Fail, Fanfou, Kwargs, Result};

/// Statuses asked for per page.
pub const PAGE_SIZE: u32 = 60;
/// Pause between two attempts at the same page.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// A timeline that can be archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeline {
    #[default]
    User,
    Mentions,
    Inbox,
    Sent,
    Favorites,
}

impl Timeline {
    pub fn path(&self) -> &'static str {
        match self {
            Timeline::User => "statuses/user_timeline",
            Timeline::Mentions => "statuses/mentions",
            Timeline::Inbox => "direct_messages/inbox",
            Timeline::Sent => "direct_messages/sent",
            Timeline::Favorites => "favorites",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Timeline::User => "user",
            Timeline::Mentions => "mentions",
            Timeline::Inbox => "inbox",
            Timeline::Sent => "sent",
            Timeline::Favorites => "favorites",
        }
    }

    /// Whether a short page already means the end.
    fn ends_on_short_page(&self) -> bool {
        matches!(self, Timeline::Favorites)
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Timeline::User),
            "mentions" => Ok(Timeline::Mentions),
            "inbox" => Ok(Timeline::Inbox),
            "sent" => Ok(Timeline::Sent),
            "favorites" => Ok(Timeline::Favorites),
            other => Err(Error::General(format!(
                "unknown timeline \"{}\", expected one of user, mentions, inbox, sent or favorites",
                other
            ))),
        }
    }
}

/// The `id` of a status, numeric ids included.
pub fn status_id(status: &Value) -> Result<String> {
    match status.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(Error::General("status carries no id".to_string())),
    }
}

/// One page of `timeline`, together with the id to continue from.
///
/// Without `user_id` the authenticated user's timeline is read.
pub fn fetch_page(
    fanfou: &Fanfou,
    timeline: Timeline,
    user_id: Option<&str>,
    max_id: Option<&str>,
) -> Result<(Vec<Value>, Option<String>)> {
    let mut kwargs = Kwargs::new().arg("count", PAGE_SIZE).arg("mode", "lite");
    if let Some(user_id) = user_id {
        kwargs = kwargs.id(user_id);
    }
    if let Some(max_id) = max_id {
        kwargs = kwargs.arg("max_id", max_id);
    }
    let page = into_list(fanfou.path(timeline.path()).call(kwargs)?)?;
    let last = page.last().map(status_id).transpose()?;
    Ok((page, last))
}

/// Every status of `timeline`, in the order received.
///
/// A 401 or 404 answer ends the download with what was collected so far.
/// Other API and transport failures are retried through `fail`, which is
/// reset after every page that arrives.
///
/// # Errors
///
/// [`Error::TooManyFailures`] once `fail` runs out. Errors that a retry
/// cannot fix, such as signing errors, are returned at once.
pub fn fetch_all(
    fanfou: &Fanfou,
    timeline: Timeline,
    user_id: Option<&str>,
    fail: &mut Fail,
    retry_delay: Duration,
) -> Result<Vec<Value>> {
    let mut statuses = Vec::new();
    let mut max_id: Option<String> = None;
    loop {
        match fetch_page(fanfou, timeline, user_id, max_id.as_deref()) {
            Ok((page, last)) => {
                let received = page.len();
                statuses.extend(page);
                debug!(%timeline, received, total = statuses.len(), "page archived");
                if received == 0
                    || (timeline.ends_on_short_page() && received < PAGE_SIZE as usize)
                {
                    break;
                }
                max_id = last;
                fail.reset();
            }
            Err(e) if matches!(e.status().map(|s| s.as_u16()), Some(401 | 404)) => {
                warn!(%timeline, error = %e, "timeline not readable, stopping");
                break;
            }
            Err(e) if e.is_retryable() || matches!(e, Error::Http(_) | Error::General(_)) => {
                warn!(%timeline, error = %e, "page failed");
                fail.wait(retry_delay)?;
            }
            Err(e) => return Err(e),
        }
    }
    info!(%timeline, total = statuses.len(), "timeline archived");
    Ok(statuses)
}
