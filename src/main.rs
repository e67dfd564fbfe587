use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use taskpilot::{
    config::Config,
    routes::{self, health::health},
    store::{PgTaskStore, PgUserStore},
    AppState,
};

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io_error("Invalid configuration", e))?;
    config.warn_insecure_defaults();

    let (state, pool) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .map_err(|e| io_error("Failed to connect to database", e))?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| io_error("Failed to run migrations", e))?;

            let state = AppState::new(
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgTaskStore::new(pool.clone())),
                &config.auth,
            );
            (state, Some(pool))
        }
        None => {
            log::warn!("DATABASE_URL is not set; using in-memory stores, data will not persist");
            (AppState::in_memory(&config.auth), None)
        }
    };

    log::info!(
        "Starting TaskPilot server at {} ({:?})",
        config.server_url(),
        config.environment
    );

    let cors_origin = config.cors_origin.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allow_any_method()
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(|cfg| state.register(cfg))
            .service(health)
            .configure(routes::config)
            .default_service(web::route().to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run();

    let result = server.await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    result
}
