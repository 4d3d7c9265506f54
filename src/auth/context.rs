use serde::Serialize;
use uuid::Uuid;

use super::Claims;

/// The caller, as resolved by the identity provider.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Owner key for the caller's todos
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: claims.role.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            aud: "authenticated".to_string(),
            iss: "https://project.supabase.co/auth/v1".to_string(),
            exp: 0,
            email: Some("me@example.com".to_string()),
            role: Some("authenticated".to_string()),
        }
    }

    #[test]
    fn subject_must_be_a_uuid() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(&claims(&id.to_string())).unwrap();
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.email.as_deref(), Some("me@example.com"));

        assert!(AuthContext::from_claims(&claims("service-account")).is_err());
    }
}
