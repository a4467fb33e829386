/// Authentication for the admin API
///
/// Tokens are issued by an external identity service. This crate validates
/// them and turns the claims into an [`middleware::AuthContext`]; it does not
/// check permissions beyond that.
///
/// # Modules
///
/// - [`jwt`]: HS256 token validation
/// - [`middleware`]: bearer header parsing and the authenticated context
///
/// # Example
///
/// ```
/// use hamayesh_shared::auth::jwt::{create_token, Claims, TokenType};
/// use hamayesh_shared::auth::middleware::authenticate_bearer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "shared-secret-at-least-32-bytes-long";
/// let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), secret)?;
///
/// let header = format!("Bearer {}", token);
/// let auth = authenticate_bearer(Some(&header), secret)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
