/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: access and refresh token generation and validation
/// - [`middleware`]: Axum bearer-token middleware that attaches an
///   [`middleware::AuthContext`] to authenticated requests
/// - [`authorization`]: board-level role resolution and access checks
///
/// Passwords are hashed with Argon2id (64 MB memory, 3 iterations) and
/// tokens are signed with HS256. Authorization is role-based per board:
/// every check resolves the caller's role on the target board first, then
/// compares it against the roles the operation allows.
///
/// # Example
///
/// ```no_run
/// use tackboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use tackboard_shared::auth::password::hash_password;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
///
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
