/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Token refresh
/// - Current user lookup
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `GET /v1/auth/me` - Fetch the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tackboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, UserSummary},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The newly created user
    pub user: UserSummary,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The authenticated user
    pub user: UserSummary,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The authenticated user
    pub user: UserSummary,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "correct-horse-battery"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com" },
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.summary(),
            access_token,
            refresh_token,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user and returns JWT tokens.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "correct-horse-battery"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com" },
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    // Find user by email
    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // Verify password
    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // Generate tokens
    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: user.summary(),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// Content-Type: application/json
///
/// {
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
/// - `500 Internal Server Error`: Server error
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    // Use the refresh helper from jwt module
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Current user endpoint
///
/// Returns the profile of the user the bearer token belongs to.
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <access_token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com" }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token, or the user no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    Ok(Json(MeResponse {
        user: user.summary(),
    }))
}
