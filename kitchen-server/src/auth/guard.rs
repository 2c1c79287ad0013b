//! Request guards
//!
//! Routes compose these in order: identity first, then role.
//!
//! | Failure | Status |
//! |---------|--------|
//! | no `Authorization: Bearer` header | 401 NotAuthenticated |
//! | bad signature or malformed token | 401 TokenInvalid |
//! | expired token | 401 TokenExpired |
//! | not an admin | 403 AdminRequired |
//! | someone else's resource | 403 PermissionDenied |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::Role;

use crate::auth::{TokenError, TokenService};
use crate::db::UserStore;
use crate::error::ServiceError;
use crate::security_log;
use crate::state::AppState;

/// Verified caller, inserted into request extensions by [`require_identity`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

/// Verify the bearer token. Never touches the store.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(TokenService::extract_from_header);

    let Some(token) = token else {
        security_log!("WARN", "auth_missing", uri = req.uri().to_string());
        return Err(AppError::unauthorized());
    };

    match state.tokens.verify(token) {
        Ok(claims) => {
            req.extensions_mut().insert(Identity {
                email: claims.email,
            });
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            match e {
                TokenError::Expired => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Require the caller's stored role to be admin. Runs after [`require_identity`].
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let email = req
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.email.clone())
        .ok_or_else(AppError::unauthorized)?;

    match stored_role(state.store.as_ref(), &email).await? {
        Role::Admin => Ok(next.run(req).await),
        Role::User => {
            security_log!("WARN", "admin_required", email = email);
            Err(AppError::admin_required())
        }
    }
}

/// Allow only the caller's own email
pub fn ensure_self(identity: &Identity, email: &str) -> Result<(), AppError> {
    if identity.email == email {
        return Ok(());
    }
    security_log!(
        "WARN",
        "ownership_denied",
        email = identity.email.clone(),
        requested = email.to_string()
    );
    Err(AppError::forbidden("Forbidden access"))
}

/// Allow the owner of `email`'s resources, or an admin.
///
/// The store is only consulted when the emails differ.
pub async fn ensure_self_or_admin<S>(
    store: &S,
    identity: &Identity,
    email: &str,
) -> Result<(), ServiceError>
where
    S: UserStore + ?Sized,
{
    if identity.email == email {
        return Ok(());
    }

    match stored_role(store, &identity.email).await? {
        Role::Admin => Ok(()),
        Role::User => {
            security_log!(
                "WARN",
                "ownership_denied",
                email = identity.email.clone(),
                requested = email.to_string()
            );
            Err(AppError::forbidden("Forbidden access").into())
        }
    }
}

/// Unknown users have no role beyond `User`
async fn stored_role<S>(store: &S, email: &str) -> Result<Role, AppError>
where
    S: UserStore + ?Sized,
{
    let user = store
        .find_user_by_email(email)
        .await
        .map_err(|e| AppError::from(ServiceError::from(e)))?;
    Ok(user.map(|u| u.role()).unwrap_or(Role::User))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use shared::error::ErrorCode;

    fn identity(email: &str) -> Identity {
        Identity {
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_self_access_skips_store() {
        let store = MemoryStore::new();
        ensure_self_or_admin(&store, &identity("a@kitchen.test"), "a@kitchen.test")
            .await
            .unwrap();
        assert_eq!(store.operations(), 0);
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let store = MemoryStore::new();
        store.seed_user("a@kitchen.test", None).await;

        let err: AppError =
            ensure_self_or_admin(&store, &identity("a@kitchen.test"), "b@kitchen.test")
                .await
                .unwrap_err()
                .into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_admin_may_access_others() {
        let store = MemoryStore::new();
        store.seed_user("boss@kitchen.test", Some("admin")).await;

        ensure_self_or_admin(&store, &identity("boss@kitchen.test"), "b@kitchen.test")
            .await
            .unwrap();
    }

    #[test]
    fn test_ensure_self() {
        let caller = identity("a@kitchen.test");
        assert!(ensure_self(&caller, "a@kitchen.test").is_ok());
        let err = ensure_self(&caller, "b@kitchen.test").unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_unknown_caller_is_not_admin() {
        let store = MemoryStore::new();
        let role = stored_role(&store, "ghost@kitchen.test").await.unwrap();
        assert_eq!(role, Role::User);
    }
}
