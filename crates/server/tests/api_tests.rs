//! Integration tests for signup, login, sessions and user endpoints.

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use common::TestServer;
use roster_core::verify_password;
use roster_metadata::models::{ProfilePictureRow, UserRow};
use roster_metadata::repos::{PictureRepo, UserRepo};
use roster_metadata::{MetadataResult, MetadataStore};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;

/// Metadata store that never finds a user by username, so signup always
/// reaches the insert and only the unique index can reject a duplicate.
struct NoUsernameLookup(Arc<dyn MetadataStore>);

#[async_trait]
impl UserRepo for NoUsernameLookup {
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
        self.0.create_user(user).await
    }

    async fn get_user(&self, id: &str) -> MetadataResult<Option<UserRow>> {
        self.0.get_user(id).await
    }

    async fn get_user_by_username(&self, _username: &str) -> MetadataResult<Option<UserRow>> {
        Ok(None)
    }
}

#[async_trait]
impl PictureRepo for NoUsernameLookup {
    async fn get_profile_picture(
        &self,
        user_id: &str,
    ) -> MetadataResult<Option<ProfilePictureRow>> {
        self.0.get_profile_picture(user_id).await
    }

    async fn create_profile_picture(&self, picture: &ProfilePictureRow) -> MetadataResult<()> {
        self.0.create_profile_picture(picture).await
    }

    async fn update_profile_picture(
        &self,
        user_id: &str,
        profile_picture: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        self.0
            .update_profile_picture(user_id, profile_picture, updated_at)
            .await
    }
}

#[async_trait]
impl MetadataStore for NoUsernameLookup {
    async fn migrate(&self) -> MetadataResult<()> {
        self.0.migrate().await
    }

    async fn health_check(&self) -> MetadataResult<()> {
        self.0.health_check().await
    }
}

#[tokio::test]
async fn test_end_to_end_signup_login_fetch() {
    let server = TestServer::new().await;

    let (status, body) = server
        .json_request(
            "POST",
            "/signup",
            Some(json!({"name": "Ann", "username": "ann1", "password": "pw"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signup successful.");

    let login = server.login_response("ann1", "pw").await;
    assert_eq!(login.status, StatusCode::OK);
    let login_body = login.json();
    assert_eq!(login_body["message"], "Login successful.");
    let id = login_body["user"].as_str().unwrap().to_string();
    let cookie = login.session_cookie().unwrap();

    let (status, body) = server
        .json_request("GET", &format!("/user/{id}"), None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id.as_str());
    assert_eq!(body["user"]["name"], "Ann");
    assert_eq!(body["user"]["username"], "ann1");
    assert!(body["user"].get("password").is_none());

    let (status, body) = server
        .json_request("GET", "/user/other-id", None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_signup_stores_verifiable_credential() {
    let server = TestServer::new().await;
    assert_eq!(server.signup("Ann", "ann1", "pw").await, StatusCode::OK);

    let row = server
        .metadata()
        .get_user_by_username("ann1")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(row.password, "pw");
    assert!(row.password.starts_with("test-salt$"));
    assert!(verify_password("pw", "test-salt", &row.password));
}

#[tokio::test]
async fn test_signup_accepts_form_body() {
    let server = TestServer::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Ann&username=ann1&password=pw"))
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=ann1&password=pw"))
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_duplicate_signup_rejected_without_mutation() {
    let server = TestServer::new().await;
    assert_eq!(server.signup("Ann", "ann1", "pw").await, StatusCode::OK);
    let original = server
        .metadata()
        .get_user_by_username("ann1")
        .await
        .unwrap()
        .unwrap();

    let (status, body) = server
        .json_request(
            "POST",
            "/signup",
            Some(json!({"name": "Other", "username": "ann1", "password": "different"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "username_taken");
    assert_eq!(body["message"], "Username is already taken.");

    let stored = server
        .metadata()
        .get_user_by_username("ann1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.name, "Ann");
    assert_eq!(stored.password, original.password);

    // The original credentials still work, the new ones do not
    assert_eq!(
        server.login_response("ann1", "pw").await.status,
        StatusCode::OK
    );
    assert_eq!(
        server.login_response("ann1", "different").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_signup_unique_index_rejects_duplicate() {
    let mut inner = None;
    let server = TestServer::with_metadata(|store| {
        inner = Some(store.clone());
        Arc::new(NoUsernameLookup(store))
    })
    .await;
    let inner = inner.unwrap();

    assert_eq!(server.signup("Ann", "ann1", "pw").await, StatusCode::OK);
    let original = inner.get_user_by_username("ann1").await.unwrap().unwrap();

    let (status, body) = server
        .json_request(
            "POST",
            "/signup",
            Some(json!({"name": "Other", "username": "ann1", "password": "different"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "username_taken");
    assert_eq!(body["message"], "Username is already taken.");

    let stored = inner.get_user_by_username("ann1").await.unwrap().unwrap();
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.name, "Ann");
    assert_eq!(stored.password, original.password);
}

#[tokio::test]
async fn test_signup_missing_fields() {
    let server = TestServer::new().await;

    for body in [
        json!({"username": "ann1", "password": "pw"}),
        json!({"name": "Ann", "password": "pw"}),
        json!({"name": "Ann", "username": "ann1"}),
        json!({"name": "", "username": "ann1", "password": "pw"}),
    ] {
        let (status, body) = server
            .json_request("POST", "/signup", Some(body), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    assert!(
        server
            .metadata()
            .get_user_by_username("ann1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let server = TestServer::new().await;
    assert_eq!(server.signup("Ann", "ann1", "pw").await, StatusCode::OK);

    let wrong_password = server.login_response("ann1", "nope").await;
    let unknown_user = server.login_response("nobody", "pw").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json(), unknown_user.json());
    assert_eq!(wrong_password.json()["message"], "invalid credentials");
    assert!(wrong_password.session_cookie().is_none());
}

#[tokio::test]
async fn test_login_missing_credentials() {
    let server = TestServer::new().await;
    let (status, _) = server
        .json_request("POST", "/login", Some(json!({"username": "ann1"})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let server = TestServer::new().await;
    let (id, _cookie) = server.signup_and_login("Ann", "ann1").await;

    for uri in [
        format!("/user/{id}"),
        format!("/userprofiledata/{id}"),
        format!("/profilepicture/{id}"),
    ] {
        let (status, body) = server.json_request("GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["message"], "Unauthorized access");
    }

    // Authentication is checked before ownership
    let (status, _) = server
        .json_request("GET", "/user/someone-else", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_cookie_is_unauthenticated() {
    let server = TestServer::new().await;
    let (id, _) = server.signup_and_login("Ann", "ann1").await;

    let (status, _) = server
        .json_request("GET", &format!("/user/{id}"), None, Some("id=not-a-session"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = TestServer::new().await;
    let (id, cookie) = server.signup_and_login("Ann", "ann1").await;

    let (status, _) = server
        .json_request("GET", &format!("/user/{id}"), None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .json_request("GET", "/logout", None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful.");

    let (status, _) = server
        .json_request("GET", &format!("/user/{id}"), None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session() {
    let server = TestServer::new().await;
    let (status, body) = server.json_request("GET", "/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful.");
}

#[tokio::test]
async fn test_sessions_are_per_user() {
    let server = TestServer::new().await;
    let (ann_id, ann_cookie) = server.signup_and_login("Ann", "ann1").await;
    let (bob_id, bob_cookie) = server.signup_and_login("Bob", "bob1").await;
    assert_ne!(ann_id, bob_id);

    let (status, body) = server
        .json_request("GET", &format!("/user/{bob_id}"), None, Some(&bob_cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Bob");

    // Ann cannot read Bob's data, and nothing of Bob's leaks in the error
    let (status, body) = server
        .json_request(
            "GET",
            &format!("/userprofiledata/{bob_id}"),
            None,
            Some(&ann_cookie),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.to_string().contains("Bob"));
}

#[tokio::test]
async fn test_profile_data_without_picture() {
    let server = TestServer::new().await;
    let (id, cookie) = server.signup_and_login("Ann", "ann1").await;

    let (status, body) = server
        .json_request(
            "GET",
            &format!("/userprofiledata/{id}"),
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["id"], id.as_str());
    assert_eq!(body["profile"]["name"], "Ann");
    assert_eq!(body["profile"]["username"], "ann1");
    assert!(body["profile"]["profile_picture"].is_null());
    assert!(body["profile"].get("password").is_none());
}

#[tokio::test]
async fn test_unknown_route_serves_html_404() {
    let server = TestServer::new().await;

    let request = Request::builder()
        .uri("/does/not/exist")
        .body(Body::empty())
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let content_type = response.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    assert!(String::from_utf8_lossy(&response.body).contains("404"));
}

#[tokio::test]
async fn test_configured_not_found_page() {
    let page_dir = tempfile::tempdir().unwrap();
    let page = page_dir.path().join("notfound.html");
    std::fs::write(&page, "<p>nothing here</p>").unwrap();

    let server = TestServer::with_config(|config| {
        config.server.not_found_page = Some(page.clone());
    })
    .await;

    let request = Request::builder()
        .uri("/missing")
        .body(Body::empty())
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(String::from_utf8_lossy(&response.body), "<p>nothing here</p>");
}

#[tokio::test]
async fn test_userdata_route_is_not_served() {
    let server = TestServer::new().await;
    let (id, cookie) = server.signup_and_login("Ann", "ann1").await;

    let request = Request::builder()
        .uri(format!("/userdata?id={id}"))
        .header(axum::http::header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!String::from_utf8_lossy(&response.body).contains(&id));
}
