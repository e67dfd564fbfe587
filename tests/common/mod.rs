#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use serde_json::{json, Value};
use taskpilot::{config::AuthConfig, AppState};

/// Fast hashing keeps the suite quick; everything else uses the production defaults.
pub fn auth_config() -> AuthConfig {
    AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    }
}

pub fn test_state() -> AppState {
    AppState::in_memory(&auth_config())
}

/// Builds the full application (routes, gate, extractor error handlers, fallback) on top of
/// the given `AppState`.
macro_rules! test_app {
    ($state:expr) => {{
        let state = $state;
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| state.register(cfg))
                .service(taskpilot::routes::health::health)
                .configure(taskpilot::routes::config)
                .default_service(actix_web::web::route().to(taskpilot::routes::not_found)),
        )
        .await
    }};
}

/// Sends a request and returns the status with the decoded JSON body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("non-JSON body: {:?}", String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

pub fn post_json(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

pub fn bearer(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

/// Registers `email` with `password` and logs in, returning the login body.
pub async fn register_and_login<S, B>(app: &S, email: &str, password: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let credentials = json!({ "email": email, "password": password });

    let (status, body) = send(app, post_json("/auth/register", credentials.clone()).to_request()).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = send(app, post_json("/auth/login", credentials).to_request()).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body
}

pub fn access_token(login: &Value) -> String {
    login["accessToken"]
        .as_str()
        .expect("login body carries accessToken")
        .to_string()
}
