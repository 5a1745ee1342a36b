/// JWT token generation and validation
///
/// Tokens are signed with HS256 (HMAC-SHA256) and carry the user identity
/// plus a token-type discriminator, so a refresh token can never be replayed
/// as an access token.
///
/// # Token Types
///
/// - **Access**: short-lived (24h), sent as `Authorization: Bearer` on API
///   requests
/// - **Refresh**: long-lived (30d), exchanged at `/v1/auth/refresh` for a
///   fresh access token
///
/// Validation checks the signature, expiration, `nbf` and the issuer.
/// Secrets must be at least 32 bytes; server configuration enforces that at
/// startup.
///
/// # Example
///
/// ```
/// use tackboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
///
/// let validated = validate_token(&token, "secret-key-at-least-32-bytes-long")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into every token and required on validation
const ISSUER: &str = "tackboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was signed for a different issuer
    #[error("Invalid issuer: expected {ISSUER}")]
    InvalidIssuer,
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived)
    Access,

    /// Refresh token (long-lived)
    Refresh,
}

impl TokenType {
    /// Gets default expiration duration for token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the custom
/// `token_type` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID
    pub sub: Uuid,

    /// Issuer, always "tackboard"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with the default expiration for the token type
    ///
    /// # Example
    ///
    /// ```
    /// use tackboard_shared::auth::jwt::{Claims, TokenType};
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
    /// assert!(!claims.is_expired());
    /// ```
    pub fn new(user_id: Uuid, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration
    ///
    /// Useful when the token TTL is configured rather than defaulted.
    pub fn with_expiration(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret. The secret should
/// be at least 32 bytes, randomly generated, and kept out of source control.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts its claims
///
/// Verifies the signature, expiration, `nbf` window, and that the issuer is
/// "tackboard".
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for foreign tokens, and `JwtError::ValidationError` for everything else
/// (bad signature, malformed token, missing claims).
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and checks it is an access token
///
/// The bearer middleware uses this so refresh tokens cannot authenticate
/// API requests.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::ValidationError(
            "Expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates a token and checks it is a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::ValidationError(
            "Expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Issues a new access token from a valid refresh token
///
/// # Errors
///
/// Returns an error if the refresh token is invalid, expired, or is
/// actually an access token.
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::new(refresh_claims.sub, TokenType::Access);
    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::hours(24));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();

        let claims = Claims::new(user_id, TokenType::Access);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "tackboard");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), TokenType::Access, Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let secret = "test-secret-key-at-least-32-bytes-long";

        let claims = Claims::new(user_id, TokenType::Access);
        let token = create_token(&claims, secret).expect("Should create token");

        let validated = validate_token(&token, secret).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.token_type, TokenType::Access);
        assert_eq!(validated.iss, "tackboard");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, "secret1").expect("Should create token");

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_tampered_token() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, "secret").expect("Should create token");

        // Flip a character in the payload segment
        let mut tampered: Vec<String> = token.split('.').map(str::to_string).collect();
        tampered[1] = format!("x{}", &tampered[1][1..]);
        let tampered = tampered.join(".");

        assert!(validate_token(&tampered, "secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let secret = "test-secret";

        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            TokenType::Access,
            Duration::seconds(-3600), // Expired an hour ago
        );

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, secret).expect("Should create token");
        let result = validate_token(&token, secret);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_type_is_enforced() {
        let secret = "secret";

        let access_token =
            create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), secret).unwrap();
        let refresh_token =
            create_token(&Claims::new(Uuid::new_v4(), TokenType::Refresh), secret).unwrap();

        assert!(validate_access_token(&access_token, secret).is_ok());
        assert!(validate_access_token(&refresh_token, secret).is_err());

        assert!(validate_refresh_token(&refresh_token, secret).is_ok());
        assert!(validate_refresh_token(&access_token, secret).is_err());
    }

    #[test]
    fn test_refresh_access_token() {
        let user_id = Uuid::new_v4();
        let secret = "secret";

        let refresh_claims = Claims::new(user_id, TokenType::Refresh);
        let refresh_token = create_token(&refresh_claims, secret).unwrap();

        let new_access_token = refresh_access_token(&refresh_token, secret).unwrap();

        let validated = validate_access_token(&new_access_token, secret).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_with_access_token_fails() {
        let secret = "secret";

        let access_claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let access_token = create_token(&access_claims, secret).unwrap();

        assert!(refresh_access_token(&access_token, secret).is_err());
    }
}
