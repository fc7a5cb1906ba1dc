use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use contracts::system::auth::{Role, TokenClaims};

use crate::shared::error::{ServiceError, ServiceResult};

/// Текущий пользователь из JWT (claims кладёт middleware `require_auth`)
///
/// Использование: `async fn handler(user: CurrentUser, ...)`
pub struct CurrentUser(pub TokenClaims);

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Проверка права роли, например `user.require(Role::can_edit_kpi, "edit KPIs")?`
    pub fn require(&self, capability: fn(&Role) -> bool, action: &str) -> ServiceResult<()> {
        if capability(&self.0.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role {} may not {}",
                self.0.role.code(),
                action
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::auth::jwt::new_claims;

    #[test]
    fn test_require_maps_to_forbidden() {
        let manager = CurrentUser(new_claims("u-1", "mark", Role::Manager));
        assert!(manager.require(Role::can_edit_kpi, "edit KPIs").is_ok());
        let err = manager
            .require(Role::can_manage_periods, "manage periods")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(manager.role(), Role::Manager);
    }

    #[tokio::test]
    async fn test_missing_claims_rejected() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let rejection = CurrentUser::from_request_parts(&mut parts, &()).await.err();
        assert_eq!(rejection, Some(StatusCode::UNAUTHORIZED));

        parts.extensions.insert(new_claims("u-2", "alex", Role::Staff));
        let user = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.role(), Role::Staff);
    }
}
