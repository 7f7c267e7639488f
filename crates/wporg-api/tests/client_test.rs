#![allow(clippy::unwrap_used)]
// Integration tests for request building, response decoding and API root
// discovery using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wporg_api::{
    ApiRequest, AuthStrategy, Error, SiteCredential, TransportConfig, WordPressOrgRestApi,
    discover_api_root,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    status: &'a str,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Post {
    id: u64,
    title: Rendered,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Rendered {
    rendered: String,
}

fn credential(site: &str) -> SiteCredential {
    SiteCredential::for_site(
        &Url::parse(site).unwrap(),
        "admin".into(),
        SecretString::from("s3cret".to_string()),
    )
    .unwrap()
}

fn transport() -> TransportConfig {
    TransportConfig::default().with_cookie_jar()
}

async fn setup() -> (MockServer, WordPressOrgRestApi) {
    let server = MockServer::start().await;
    let api_root = Url::parse(&format!("{}/wp-json/", server.uri())).unwrap();
    let client =
        WordPressOrgRestApi::self_hosted(api_root, credential(&server.uri()), &transport())
            .unwrap();
    (server, client)
}

// ── Requests ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_with_query_decodes_typed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("per_page", "2"))
        .and(query_param("status", "publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": { "rendered": "Hello world!" } },
            { "id": 2, "title": { "rendered": "Second" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let posts: Vec<Post> = client
        .get("/wp/v2/posts", &[("per_page", "2"), ("status", "publish")])
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(
        posts[0],
        Post {
            id: 1,
            title: Rendered {
                rendered: "Hello world!".into()
            }
        }
    );
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "title": "Draft", "status": "draft" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": 9, "title": { "rendered": "Draft" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let post: Post = client
        .post(
            "/wp/v2/posts",
            &NewPost {
                title: "Draft",
                status: "draft",
            },
        )
        .await
        .unwrap();
    assert_eq!(post.id, 9);
}

#[tokio::test]
async fn test_put_and_delete() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/wp-json/wp/v2/posts/9"))
        .and(body_json(json!({ "status": "publish" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 9 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/wp-json/wp/v2/posts/9"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let updated: Value = client
        .put("/wp/v2/posts/9", &json!({ "status": "publish" }))
        .await
        .unwrap();
    assert_eq!(updated["id"], 9);

    let deleted: Value = client
        .delete("/wp/v2/posts/9", &[("force", "true")])
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);
}

#[tokio::test]
async fn test_form_body_and_extra_headers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/comments"))
        .and(header("X-HTTP-Method-Override", "PATCH"))
        .and(body_string_contains("content=Nice+post"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::post("/wp/v2/comments")
        .form([("content", "Nice post"), ("post", "1")])
        .header("X-HTTP-Method-Override", "PATCH");
    let created: Value = client.request(&request).await.unwrap();
    assert_eq!(created["id"], 3);
}

#[tokio::test]
async fn test_no_content_decodes_as_unit() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/wp-json/wp/v2/tags/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result: Option<Value> = client.delete("/wp/v2/tags/4", &[]).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_rest_route_root() {
    let server = MockServer::start().await;
    let api_root = Url::parse(&format!("{}/?rest_route=/", server.uri())).unwrap();
    let client =
        WordPressOrgRestApi::self_hosted(api_root, credential(&server.uri()), &transport())
            .unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("rest_route", "/wp/v2/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let me: Value = client.get("/wp/v2/users/me", &[]).await.unwrap();
    assert_eq!(me["id"], 1);
}

#[tokio::test]
async fn test_raw_response_exposes_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-Total", "42")
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let resp = client
        .request_raw(&ApiRequest::get("/wp/v2/posts"))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers().get("X-WP-Total").unwrap(), "42");
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_carries_wordpress_code() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "rest_post_invalid_id",
            "message": "Invalid post ID.",
            "data": { "status": 404 }
        })))
        .mount(&server)
        .await;

    let err = client.get::<Value>("/wp/v2/posts/999", &[]).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.api_error_code(), Some("rest_post_invalid_id"));
    assert!(err.to_string().contains("Invalid post ID."));
}

#[tokio::test]
async fn test_html_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client.get::<Value>("/wp/v2/posts", &[]).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>maintenance</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_gateway_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get::<Value>("/wp/v2/posts", &[]).await.unwrap_err();
    assert!(err.is_transient());
    assert!(!err.is_auth_failure());
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_from_link_header() {
    let server = MockServer::start().await;
    let site = Url::parse(&server.uri()).unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "Link",
            format!("<{}/wp-json/>; rel=\"https://api.w.org/\"", server.uri()).as_str(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let root = discover_api_root(&reqwest::Client::new(), &site).await.unwrap();
    assert_eq!(root.as_str(), format!("{}/wp-json/", server.uri()));
}

#[tokio::test]
async fn test_discover_falls_back_to_wp_json_index() {
    let server = MockServer::start().await;
    let site = Url::parse(&format!("{}/blog", server.uri())).unwrap();

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/wp-json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Test site",
            "namespaces": ["oembed/1.0", "wp/v2"]
        })))
        .mount(&server)
        .await;

    let root = discover_api_root(&reqwest::Client::new(), &site).await.unwrap();
    assert_eq!(root.as_str(), format!("{}/blog/wp-json/", server.uri()));
}

#[tokio::test]
async fn test_discover_not_wordpress() {
    let server = MockServer::start().await;
    let site = Url::parse(&server.uri()).unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>static</html>"))
        .mount(&server)
        .await;

    let err = discover_api_root(&reqwest::Client::new(), &site).await.unwrap_err();
    assert!(matches!(err, Error::ApiRootNotFound { .. }));
}

#[tokio::test]
async fn test_discovered_client_uses_root() {
    let server = MockServer::start().await;
    let site = Url::parse(&server.uri()).unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "Link",
            format!("<{}/api/>; rel=\"https://api.w.org/\"", server.uri()).as_str(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wp/v2/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "Site" })))
        .mount(&server)
        .await;

    let client = WordPressOrgRestApi::discover(&site, credential(&server.uri()), &transport())
        .await
        .unwrap();
    assert_eq!(client.api_root().path(), "/api/");
    let settings: Value = client.get("/wp/v2/settings", &[]).await.unwrap();
    assert_eq!(settings["title"], "Site");
    assert_eq!(client.strategy(), AuthStrategy::Nonce);
}
