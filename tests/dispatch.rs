//! End-to-end calls against a fake Fanfou server.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::Duration;

use fanfou::{
    ApiResponse, Error, ErrorBody, Fanfou, Kwargs, NoAuth, OAuth, OAuthParameters, TokenExchange,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const C_KEY: &str = "1469b495a824c7abb2bf9fd2";
const C_SECRET: &str = "9095f46ecf5ede903fa79a57";

fn domain(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

fn oauth() -> OAuth {
    OAuth::new("a1b2c3d4e5f6", Some("f6e5d4c3b2a1"), C_KEY, Some(C_SECRET)).unwrap()
}

/// The blocking client must be created, used and dropped off the runtime.
async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task")
}

fn form_of(request: &Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).expect("form body")
}

fn query_of(request: &Request) -> HashMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

fn header_of<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn get_sends_signed_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/home_timeline.json"))
        .and(query_param("count", "5"))
        .and(query_param("mode", "lite"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "a"}, {"id": "b"}]))
                .insert_header("X-AuthUser", "~abcdef"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    let (len, user, first) = blocking(move || {
        let fanfou = Fanfou::builder().auth(oauth()).domain(domain).build().unwrap();
        let response = fanfou
            .path("statuses/home_timeline")
            .call(Kwargs::new().arg("count", 5).arg("mode", "lite"))
            .unwrap();
        match response {
            ApiResponse::List(list) => (
                list.len(),
                list.x_auth_user().to_string(),
                list[0]["id"].clone(),
            ),
            other => panic!("unexpected response: {:?}", other),
        }
    })
    .await;
    assert_eq!(len, 2);
    assert_eq!(user, "~abcdef");
    assert_eq!(first, json!("a"));

    let requests = server.received_requests().await.unwrap();
    let query = query_of(&requests[0]);
    assert_eq!(query["oauth_consumer_key"], C_KEY);
    assert_eq!(query["oauth_token"], "a1b2c3d4e5f6");
    assert_eq!(query["oauth_signature_method"], "HMAC-SHA1");
    assert!(query.contains_key("oauth_signature"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn post_sends_signed_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/statuses/update.json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("status=hello%20world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "text": "hello world"})))
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    let text = blocking(move || {
        let fanfou = Fanfou::builder()
            .auth(oauth().with_params(OAuthParameters::new().timestamp(1_500_000_000u64)))
            .domain(domain)
            .build()
            .unwrap();
        let response = fanfou
            .segment("statuses")
            .segment("update")
            .call(Kwargs::new().arg("status", "hello world"))
            .unwrap();
        response.into_json().unwrap()["text"].clone()
    })
    .await;
    assert_eq!(text, json!("hello world"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none());
    let form = form_of(&requests[0]);
    assert_eq!(form["status"], "hello world");
    assert_eq!(form["oauth_timestamp"], "1500000000");
    assert!(form.contains_key("oauth_nonce"));
    assert!(form.contains_key("oauth_signature"));
}

#[tokio::test]
async fn id_and_placeholders_build_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline/ifanfou.json"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/friendships/create.json"))
        .and(body_string_contains("id=ifanfou"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ifanfou"})))
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).build().unwrap();
        let timeline = fanfou.segment("statuses").segment("_kind");
        timeline
            .call(Kwargs::new().arg("_kind", "user_timeline").id("ifanfou").arg("count", 2))
            .unwrap();
        fanfou
            .path("friendships/create")
            .call(Kwargs::new().arg("_id", "ifanfou"))
            .unwrap();
    })
    .await;
}

#[tokio::test]
async fn error_status_becomes_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "request": "/account/verify_credentials.json",
            "error": "unauthorized"
        })))
        .mount(&server)
        .await;

    let domain = domain(&server);
    let error = blocking(move || {
        let fanfou = Fanfou::builder().auth(NoAuth).domain(domain).build().unwrap();
        fanfou
            .path("account/verify_credentials")
            .call(Kwargs::new())
            .unwrap_err()
    })
    .await;

    assert_eq!(error.status().map(|s| s.as_u16()), Some(401));
    assert!(!error.is_retryable());
    let message = error.to_string();
    assert!(
        message.starts_with("Fanfou HTTP Error 401 for URL: account/verify_credentials.json"),
        "{}",
        message
    );
    match error {
        Error::Http(e) => {
            assert_eq!(e.uri, "account/verify_credentials");
            assert_eq!(e.params, "");
            assert_eq!(
                e.response,
                ErrorBody::Json(json!({
                    "request": "/account/verify_credentials.json",
                    "error": "unauthorized"
                }))
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/public_timeline.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let domain = domain(&server);
    let error = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).build().unwrap();
        fanfou
            .path("statuses/public_timeline")
            .call(Kwargs::new().arg("count", 1))
            .unwrap_err()
    })
    .await;
    assert!(error.is_retryable());
    match error {
        Error::Http(e) => {
            assert_eq!(e.params, "count=1");
            assert_eq!(e.response, ErrorBody::Text("busy".to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn not_modified_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/direct_messages/inbox.json"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let domain = domain(&server);
    let empty = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).build().unwrap();
        match fanfou.path("direct_messages/inbox").call(Kwargs::new()).unwrap() {
            ApiResponse::List(list) => list.is_empty(),
            _ => false,
        }
    })
    .await;
    assert!(empty);
}

#[tokio::test]
async fn gzip_body_is_decompressed() {
    let server = MockServer::start().await;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"{"screen_name": "fanfou"}"#)
        .unwrap();
    let gzipped = encoder.finish().unwrap();
    Mock::given(method("GET"))
        .and(path("/users/show.json"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_raw(gzipped, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    let value = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).gzip(true).build().unwrap();
        fanfou.path("users/show").call(Kwargs::new()).unwrap().into_json()
    })
    .await;
    assert_eq!(value, Some(json!({"screen_name": "fanfou"})));
}

#[tokio::test]
async fn photo_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/photos/upload.json"))
        .and(body_string_contains("filename=\"filename\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    blocking(move || {
        let fanfou = Fanfou::builder().auth(oauth()).domain(domain).build().unwrap();
        fanfou
            .path("photos/upload")
            .call(
                Kwargs::new()
                    .photo(b"PNGDATA".to_vec())
                    .arg("status", "look"),
            )
            .unwrap();
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    assert!(header_of(request, "content-type").starts_with("multipart/form-data; boundary="));
    let query = query_of(request);
    assert!(query.contains_key("oauth_signature"));
    assert!(!query.contains_key("status"));
    let body = String::from_utf8(request.body.clone()).unwrap();
    assert!(body.contains("PNGDATA"));
    assert!(body.contains("name=\"status\""));
}

#[tokio::test]
async fn xml_format_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/help/test.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<ok>true</ok>", "application/xml"))
        .mount(&server)
        .await;

    let domain = domain(&server);
    let text = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).format("xml").build().unwrap();
        let response = fanfou.path("help/test").call(Kwargs::new()).unwrap();
        response.as_text().map(String::from)
    })
    .await;
    assert_eq!(text.as_deref(), Some("<ok>true</ok>"));
}

#[tokio::test]
async fn image_is_streamed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/show/p1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, 0x50, 0x4e, 0x47], "image/png"))
        .mount(&server)
        .await;

    let domain = domain(&server);
    let (content_type, data) = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).build().unwrap();
        match fanfou.path("photos/show").call(Kwargs::new().id("p1")).unwrap() {
            ApiResponse::Image(mut image) => {
                let mut data = Vec::new();
                image.read_to_end(&mut data).unwrap();
                (image.content_type().to_string(), data)
            }
            other => panic!("unexpected response: {:?}", other),
        }
    })
    .await;
    assert_eq!(content_type, "image/png");
    assert_eq!(data, vec![0x89u8, 0x50, 0x4e, 0x47]);
}

#[tokio::test]
async fn per_call_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/mentions.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let domain = domain(&server);
    let error = blocking(move || {
        let fanfou = Fanfou::builder().domain(domain).build().unwrap();
        fanfou
            .path("statuses/mentions")
            .call(Kwargs::new().timeout(Duration::from_millis(200)))
            .unwrap_err()
    })
    .await;
    assert!(matches!(error, Error::Reqwest(ref e) if e.is_timeout()), "{:?}", error);
    assert!(error.is_retryable());
}

#[tokio::test]
async fn token_exchange_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .and(body_string_contains("oauth_callback=oob"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=rtoken&oauth_token_secret=rsecret&oauth_callback_confirmed=true",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .and(body_string_contains("oauth_token=rtoken"))
        .and(body_string_contains("oauth_verifier=123456"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=atoken&oauth_token_secret=asecret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let domain = domain(&server);
    let (request_token, url, access_token) = blocking(move || {
        let exchange = TokenExchange::new(C_KEY, C_SECRET).domain(domain);
        let request_token = exchange.request_token().unwrap();
        let url = exchange.authorize_url(&request_token.oauth_token);
        let access_token = exchange.access_token(&request_token, "123456").unwrap();
        (request_token, url, access_token)
    })
    .await;

    assert_eq!(request_token.oauth_token, "rtoken");
    assert_eq!(request_token.oauth_token_secret, "rsecret");
    assert_eq!(request_token.remain["oauth_callback_confirmed"], "true");
    assert!(url.ends_with("/oauth/authorize?oauth_token=rtoken"));
    assert_eq!(access_token.oauth_token, "atoken");
    assert_eq!(access_token.oauth_token_secret, "asecret");
}
