use crate::{
    auth::{
        AuthService, AuthenticatedUser, LoginRequest, LoginResponse, MessageResponse,
        RefreshRequest, RefreshResponse, RegisterRequest, RegisterResponse,
    },
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the account only. No tokens are issued until the first login.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = auth
        .register(&register_data.email, &register_data.password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".into(),
        user,
    }))
}

/// Login user
///
/// Authenticates a user and starts a new session, returning an access/refresh pair.
/// Any refresh token from an earlier session stops working.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome = auth.login(&login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".into(),
        user: outcome.user,
        tokens: outcome.tokens,
    }))
}

/// Exchange the current refresh token for a new pair. The presented token is consumed.
#[post("/refresh")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let tokens = auth.refresh(&refresh_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        message: "Token refreshed successfully".into(),
        tokens,
    }))
}

/// Logout user
///
/// Mounted behind `AuthMiddleware`. Revokes the caller's refresh token.
pub async fn logout(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    auth.logout(user.0.user_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully")))
}
