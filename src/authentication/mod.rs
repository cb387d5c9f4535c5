mod middleware;
mod password;
mod token;

pub use middleware::{
    reject_anonymous_users, reject_non_admin_users, AccessError, AuthenticatedUser,
};
pub use password::{
    compute_password_hash, hash_password, validate_credentials, AuthError, Credentials,
};
pub use token::{Claims, TokenError, TokenIssuer, DEFAULT_TOKEN_TTL_DAYS};
