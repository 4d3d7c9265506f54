use crate::api::ApiResponse;
use crate::auth::{AuthContext, RequireAuth};

/// Caller identity as the identity provider resolved it
pub async fn get_me(RequireAuth(auth): RequireAuth) -> ApiResponse<AuthContext> {
    ApiResponse::new(auth)
}
