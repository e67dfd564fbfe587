#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::json;
use taskpilot::AppState;

use common::{access_token, bearer, post_json, register_and_login, send};

#[test_log::test(actix_rt::test)]
async fn test_full_session_lifecycle() {
    let app = test_app!(common::test_state());
    let credentials = json!({ "email": "a@x.com", "password": "secret1" });

    // Register
    let (status, body) = send(
        &app,
        post_json("/auth/register", credentials.clone()).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"]["id"].is_string());
    assert!(body.get("accessToken").is_none());

    // Wrong password
    let (status, body) = send(
        &app,
        post_json("/auth/login", json!({ "email": "a@x.com", "password": "wrong" })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    // Login -> T1
    let (status, t1) = send(&app, post_json("/auth/login", credentials).to_request()).await;
    assert_eq!(status, StatusCode::OK, "Login failed: {}", t1);
    assert_eq!(t1["message"], "Login successful");
    assert_eq!(t1["user"]["email"], "a@x.com");
    let t1_refresh = t1["refreshToken"].as_str().unwrap().to_string();

    // Refresh T1 -> T2
    let (status, t2) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": t1_refresh })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Refresh failed: {}", t2);
    assert_eq!(t2["message"], "Token refreshed successfully");
    assert_ne!(t2["refreshToken"], t1["refreshToken"]);
    assert_ne!(t2["accessToken"], t1["accessToken"]);

    // Replaying T1 fails
    let (status, body) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": t1_refresh })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid refresh token");

    // Logout with T2's access token
    let req = bearer(test::TestRequest::post().uri("/auth/logout"), &access_token(&t2));
    let (status, body) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::OK, "Logout failed: {}", body);
    assert_eq!(body["message"], "Logged out successfully");

    // T2's refresh token is revoked
    let (status, _) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": t2["refreshToken"] })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_duplicate_registration_fails_regardless_of_password() {
    let app = test_app!(common::test_state());

    let (status, _) = send(
        &app,
        post_json("/auth/register", json!({ "email": "dup@x.com", "password": "secret1" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for (email, password) in [("dup@x.com", "secret1"), ("DUP@x.com", "different-password")] {
        let (status, body) = send(
            &app,
            post_json("/auth/register", json!({ "email": email, "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already registered");
    }
}

#[actix_rt::test]
async fn test_login_failure_messages_are_identical() {
    let app = test_app!(common::test_state());
    register_and_login(&app, "known@x.com", "secret1").await;

    let (unknown_status, unknown) = send(
        &app,
        post_json("/auth/login", json!({ "email": "nobody@x.com", "password": "secret1" }))
            .to_request(),
    )
    .await;
    let (wrong_status, wrong) = send(
        &app,
        post_json("/auth/login", json!({ "email": "known@x.com", "password": "nope" }))
            .to_request(),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
}

#[actix_rt::test]
async fn test_refresh_chain_is_valid() {
    let app = test_app!(common::test_state());
    let mut current = register_and_login(&app, "chain@x.com", "secret1").await;

    for _ in 0..3 {
        let (status, next) = send(
            &app,
            post_json("/auth/refresh", json!({ "refreshToken": current["refreshToken"] }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "Refresh failed: {}", next);
        current = next;
    }

    // The newest access token passes the gate.
    let req = bearer(test::TestRequest::get().uri("/tasks"), &access_token(&current));
    let (status, _) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_new_login_revokes_previous_refresh_token() {
    let app = test_app!(common::test_state());
    let first = register_and_login(&app, "twice@x.com", "secret1").await;

    let (status, _) = send(
        &app,
        post_json("/auth/login", json!({ "email": "twice@x.com", "password": "secret1" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": first["refreshToken"] })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = test_app!(common::test_state());
    let login = register_and_login(&app, "kinds@x.com", "secret1").await;

    let (status, _) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": login["accessToken"] })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = bearer(
        test::TestRequest::post().uri("/auth/logout"),
        login["refreshToken"].as_str().unwrap(),
    );
    let (status, _) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_logout_requires_bearer_token() {
    let app = test_app!(common::test_state());

    let (status, body) = send(
        &app,
        test::TestRequest::post().uri("/auth/logout").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");

    let req = bearer(test::TestRequest::post().uri("/auth/logout"), "garbage");
    let (status, body) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[actix_rt::test]
async fn test_expired_access_token_is_rejected_by_gate() {
    let config = taskpilot::config::AuthConfig {
        access_expiry: Duration::seconds(-30),
        ..common::auth_config()
    };
    let app = test_app!(AppState::in_memory(&config));
    let login = register_and_login(&app, "late@x.com", "secret1").await;

    let req = bearer(test::TestRequest::get().uri("/tasks"), &access_token(&login));
    let (status, body) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // The refresh token has its own lifetime and still works.
    let (status, _) = send(
        &app,
        post_json("/auth/refresh", json!({ "refreshToken": login["refreshToken"] })).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_request_validation() {
    let app = test_app!(common::test_state());

    let cases = vec![
        ("/auth/register", json!({ "email": "invalid-email", "password": "secret1" })),
        ("/auth/register", json!({ "email": "a@x.com", "password": "short" })),
        ("/auth/login", json!({ "email": "invalid-email", "password": "secret1" })),
        ("/auth/login", json!({ "email": "a@x.com", "password": "" })),
        ("/auth/refresh", json!({ "refreshToken": "" })),
    ];

    for (uri, payload) in cases {
        let (status, body) = send(&app, post_json(uri, payload.clone()).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} accepted {}", uri, payload);
        assert_eq!(body["error"], "Validation failed");
        assert!(body["details"].is_object());
    }

    // Undecodable bodies never reach validation.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, post_json("/auth/refresh", json!({})).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_health_and_unknown_routes() {
    let app = test_app!(common::test_state());

    let (status, body) = send(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
