use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims, PrincipalKind};
use crate::database::models::{AdminRow, AdminStatus, Permission, Permissions, Role, UserRow, UserStatus};
use crate::database::Repository;
use crate::error::ApiError;

/// Caller resolved from the bearer token and checked against the store.
#[derive(Clone, Debug)]
pub struct AuthPrincipal {
    pub id: Uuid,
    pub kind: PrincipalKind,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub permissions: Permissions,
}

impl AuthPrincipal {
    fn admin(row: AdminRow) -> Self {
        Self {
            id: row.id,
            kind: PrincipalKind::Admin,
            name: format!("{} {}", row.first_name, row.last_name),
            email: row.email,
            role: None,
            permissions: Permissions::all(),
        }
    }

    fn user(row: UserRow) -> Self {
        Self {
            id: row.id,
            kind: PrincipalKind::User,
            name: format!("{} {}", row.first_name, row.last_name),
            email: row.email,
            role: Some(row.role),
            permissions: Permissions::for_role(row.role),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == PrincipalKind::Admin
    }

    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.permissions.allows(permission) {
            Ok(())
        } else {
            tracing::warn!("{} ({}) denied {:?}", self.email, self.id, permission);
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }

    /// Administrator accounts only.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!("{} ({}) denied administrator route", self.email, self.id);
            Err(ApiError::forbidden("Administrator access required"))
        }
    }

    /// Portal user accounts only.
    pub fn require_user(&self) -> Result<(), ApiError> {
        match self.kind {
            PrincipalKind::User => Ok(()),
            PrincipalKind::Admin => Err(ApiError::forbidden("User account required")),
        }
    }
}

/// JWT authentication middleware: validates the token, loads the account and
/// injects an [`AuthPrincipal`] into the request.
pub async fn jwt_auth_middleware(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token)?;
    let principal = load_principal(&state, &claims).await?;

    tracing::debug!("Authenticated {} ({:?})", principal.email, principal.kind);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

async fn load_principal(state: &AppState, claims: &Claims) -> Result<AuthPrincipal, ApiError> {
    let pool = state.db.pool().clone();
    match claims.kind {
        PrincipalKind::Admin => {
            let admin = Repository::<AdminRow>::new(pool).select_id(claims.sub).await?;
            match admin {
                Some(row) if row.status == AdminStatus::Active => Ok(AuthPrincipal::admin(row)),
                _ => {
                    tracing::warn!("Token for missing or inactive admin {}", claims.sub);
                    Err(ApiError::unauthorized("Account not found or inactive"))
                }
            }
        }
        PrincipalKind::User => {
            let user = Repository::<UserRow>::new(pool).select_id(claims.sub).await?;
            match user {
                Some(row) if row.status == UserStatus::Active => Ok(AuthPrincipal::user(row)),
                _ => {
                    tracing::warn!("Token for missing or inactive user {}", claims.sub);
                    Err(ApiError::unauthorized("Account not found or inactive"))
                }
            }
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn principal(role: Role) -> AuthPrincipal {
        AuthPrincipal {
            id: Uuid::new_v4(),
            kind: PrincipalKind::User,
            email: "thabo@ump.ac.za".into(),
            name: "Thabo M".into(),
            role: Some(role),
            permissions: Permissions::for_role(role),
        }
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers).unwrap_err(), "Missing Authorization header");

        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap_err(), "Empty JWT token");

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn permission_guards() {
        let manager = principal(Role::Manager);
        assert!(manager.require(Permission::BuildingsWrite).is_ok());
        assert!(manager.require(Permission::BuildingsDelete).is_err());
        assert!(manager.require_admin().is_err());

        let student = principal(Role::Student);
        let err = student.require(Permission::DashboardRead).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
