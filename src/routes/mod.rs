pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Malformed bodies, query strings and path segments all answer 400 `{error}`.
fn extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    );
}

pub fn config(cfg: &mut web::ServiceConfig) {
    extractor_errors(cfg);

    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(
                web::resource("/logout")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(auth::logout)),
            ),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::toggle_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Route not found" }))
}
