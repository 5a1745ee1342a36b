/// Bearer-token authentication middleware for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, validates the token
/// as an access token, and inserts an [`AuthContext`] into the request
/// extensions for handlers to extract.
///
/// All failures map to `401 Unauthorized` with the standard error envelope,
/// so unauthenticated callers cannot distinguish a missing header from an
/// expired token beyond the message text.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use tackboard_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {}", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware("secret")));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// Authentication context added to request extensions
///
/// Present on every request that passed the bearer middleware. Handlers
/// extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing authentication credentials".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "message": message })),
        )
            .into_response()
    }
}

/// JWT authentication middleware
///
/// Validates access tokens from the `Authorization: Bearer <token>` header
/// and attaches an [`AuthContext`] on success.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing, malformed, or the
/// token is invalid, expired, or a refresh token.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(claims.sub));

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Captures the secret so the result can be handed straight to
/// `axum::middleware::from_fn`.
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>,
> + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}
