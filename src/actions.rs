//! Everyday calls behind the command-line actions.

use serde_json::Value;
use tracing::debug;

use crate::{ApiResponse, Error, Fanfou, Kwargs, Result, PRIVATE_ID_KEY};

/// Statuses fetched by [`friends`] and [`replies`] unless told otherwise.
pub const DEFAULT_LENGTH: u32 = 20;
/// Longest status the API accepts, counted in characters.
pub const STATUS_LENGTH: usize = 140;

/// Home timeline of the authenticated user, oldest first.
pub fn friends(fanfou: &Fanfou, length: u32) -> Result<Vec<Value>> {
    let response = fanfou
        .path("statuses/home_timeline")
        .call(Kwargs::new().arg("count", length))?;
    oldest_first(response)
}

/// Statuses mentioning the authenticated user, oldest first.
pub fn replies(fanfou: &Fanfou, length: u32) -> Result<Vec<Value>> {
    let response = fanfou
        .path("statuses/mentions")
        .call(Kwargs::new().arg("count", length))?;
    oldest_first(response)
}

/// Public statuses matching every term.
pub fn search<S: AsRef<str>>(fanfou: &Fanfou, terms: &[S]) -> Result<Vec<Value>> {
    let q = terms
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("+");
    let response = fanfou
        .path("search/public_timeline")
        .call(Kwargs::new().arg("q", q))?;
    into_list(response)
}

/// Cut `text` into chunks the API accepts, last chunk first when `invert`.
pub fn split_status(text: &str, invert: bool) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks: Vec<String> = chars
        .chunks(STATUS_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect();
    if invert {
        chunks.reverse();
    }
    chunks
}

/// Post `text`, split over as many statuses as it takes.
///
/// Returns the created statuses in posting order.
///
/// # Errors
///
/// [`Error::InvalidArgument`] for empty text. A failing post stops the rest.
pub fn set_status(fanfou: &Fanfou, text: &str, invert: bool) -> Result<Vec<Value>> {
    if text.is_empty() {
        return Err(Error::InvalidArgument {
            key: "status",
            value: String::new(),
        });
    }
    let update = fanfou.path("statuses/update");
    let chunks = split_status(text, invert);
    let total = chunks.len();
    let mut posted = Vec::with_capacity(total);
    for (n, chunk) in chunks.into_iter().enumerate() {
        debug!(part = n + 1, total, "posting status");
        let response = update.call(Kwargs::new().arg("status", chunk))?;
        posted.push(into_value(response)?);
    }
    Ok(posted)
}

/// Follow `user_id`.
pub fn follow(fanfou: &Fanfou, user_id: &str) -> Result<Value> {
    friendship(fanfou, "friendships/create", user_id)
}

/// Stop following `user_id`.
pub fn leave(fanfou: &Fanfou, user_id: &str) -> Result<Value> {
    friendship(fanfou, "friendships/destroy", user_id)
}

fn friendship(fanfou: &Fanfou, path: &str, user_id: &str) -> Result<Value> {
    if user_id.is_empty() {
        return Err(Error::General(
            "You need to specify a user (user_id)".to_string(),
        ));
    }
    let response = fanfou
        .path(path)
        .call(Kwargs::new().arg(PRIVATE_ID_KEY, user_id))?;
    into_value(response)
}

fn oldest_first(response: ApiResponse) -> Result<Vec<Value>> {
    let mut statuses = into_list(response)?;
    statuses.reverse();
    Ok(statuses)
}

/// The statuses of a list response.
pub(crate) fn into_list(response: ApiResponse) -> Result<Vec<Value>> {
    match response {
        ApiResponse::List(list) => Ok(list.into_inner()),
        other => Err(Error::General(format!(
            "expected a list of statuses, got {}",
            other.kind()
        ))),
    }
}

fn into_value(response: ApiResponse) -> Result<Value> {
    let kind = response.kind();
    response
        .into_json()
        .ok_or_else(|| Error::General(format!("expected JSON, got {}", kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::HeaderMap;
    use serde_json::json;

    use crate::wrap_response;

    #[test]
    fn short_status_is_one_chunk() {
        assert_eq!(split_status("hello", false), vec!["hello".to_string()]);
        assert!(split_status("", false).is_empty());
    }

    #[test]
    fn split_counts_characters() {
        let text = "饭".repeat(STATUS_LENGTH) + "否";
        let chunks = split_status(&text, false);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), STATUS_LENGTH);
        assert_eq!(chunks[1], "否");
    }

    #[test]
    fn invert_split_posts_tail_first() {
        let text = "a".repeat(STATUS_LENGTH) + "b";
        let chunks = split_status(&text, true);
        assert_eq!(chunks, vec!["b".to_string(), "a".repeat(STATUS_LENGTH)]);
    }

    #[test]
    fn list_response_is_required() {
        let list = wrap_response(json!([{"id": "a"}]), HeaderMap::new());
        assert_eq!(into_list(list).unwrap(), vec![json!({"id": "a"})]);

        let object = wrap_response(json!({"error": "x"}), HeaderMap::new());
        match into_list(object) {
            Err(Error::General(message)) => assert!(message.ends_with("got object")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn follow_without_user_is_refused() {
        let fanfou = Fanfou::new().unwrap();
        match follow(&fanfou, "") {
            Err(Error::General(message)) => {
                assert_eq!(message, "You need to specify a user (user_id)")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_status_is_refused() {
        let fanfou = Fanfou::new().unwrap();
        assert!(matches!(
            set_status(&fanfou, "", false),
            Err(Error::InvalidArgument { key: "status", .. })
        ));
    }
}
