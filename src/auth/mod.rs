pub mod claims;
pub mod context;
pub mod jwks;
pub mod middleware;

use anyhow::Result;
use axum::async_trait;

pub use claims::Claims;
pub use context::AuthContext;
pub use jwks::JwksCache;
pub use middleware::{authenticate, RequireAuth};

/// Resolves a bearer token to the calling user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<AuthContext>;
}
