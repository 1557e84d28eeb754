use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Kwargs, ID_KEY};

/// Segments starting with this are placeholders, filled in from the
/// keyword argument of the same name.
pub const PLACEHOLDER_PREFIX: char = '_';

/// Endpoints that change state and therefore need `POST`.
///
/// Matched against the end of the path, optionally followed by a numeric id.
pub const POST_ACTIONS: &[&str] = &[
    // statuses
    "statuses/destroy",
    "statuses/update",
    "statuses/",
    // photos
    "photos/upload",
    // direct messages
    "direct_messages/destroy",
    "direct_messages/new",
    // account
    "account/find_friends",
    "account/update_notify_num",
    "account/update_profile",
    "account/update_profile_image",
    // blocks, friendships, favorites, saved searches
    "blocks/create",
    "blocks/destroy",
    "friendships/accept",
    "friendships/create",
    "friendships/",
    "friendships/deny",
    "friendships/destroy",
    "favorites/create",
    "favourites/",
    "favorites/destroy",
    "saved_searches/create",
    // oauth
    "token",
    "access_token",
    "request_token",
    "invalidate_token",
];

static POST_ACTIONS_RE: Lazy<Regex> = Lazy::new(|| {
    let actions = POST_ACTIONS
        .iter()
        .map(|action| regex::escape(action))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"({})(/\d+)?$", actions)).expect("POST action pattern is valid")
});

/// Pick the HTTP verb for a built path.
pub fn method_for_uri(uri: &str) -> Method {
    if POST_ACTIONS_RE.is_match(uri) {
        Method::POST
    } else {
        Method::GET
    }
}

/// Join `uriparts` with `/`, consuming from `kwargs` every argument used in
/// the path.
///
/// A placeholder segment takes the value of the keyword argument with the
/// same name, or stays as it is when there is none. A remaining non-empty
/// `id` argument becomes the last segment.
pub fn build_uri<S: AsRef<str>>(uriparts: &[S], kwargs: &mut Kwargs) -> String {
    let mut uri = uriparts
        .iter()
        .map(|part| {
            let part = part.as_ref();
            if part.starts_with(PLACEHOLDER_PREFIX) {
                kwargs
                    .remove(part)
                    .map(|arg| arg.into_text())
                    .unwrap_or_else(|| part.to_string())
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if let Some(id) = kwargs.remove(ID_KEY) {
        if !id.is_empty() {
            uri.push('/');
            uri.push_str(&id.as_text());
        }
    }
    uri
}
