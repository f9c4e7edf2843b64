use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::AppError;
use crate::features::tickets::models::Category;

/// Scope granting access beyond the holder's own dinas. An explicit
/// capability on the token, not a magic role string.
pub const SCOPE_ALL_AGENCIES: &str = "all-agencies";

/// Verified claims of a staff session token: which dinas is acting,
/// its display name, the categories it handles, and optionally the
/// all-agencies capability.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedDinas {
    /// Dinas id (token subject)
    pub sub: String,
    pub name: String,
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AuthenticatedDinas {
    pub fn is_all_agencies(&self) -> bool {
        self.scope.as_deref() == Some(SCOPE_ALL_AGENCIES)
    }

    /// Whether this caller may act on a ticket assigned to the given
    /// dinas list.
    pub fn covers(&self, assigned_dinas: &[String]) -> bool {
        self.is_all_agencies() || assigned_dinas.iter().any(|d| *d == self.sub)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedDinas
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedDinas>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
    }
}

/// Raw JWT claims; `AuthenticatedDinas` is the verified projection
#[derive(Debug, Serialize, Deserialize)]
pub struct DinasClaims {
    pub sub: String,
    pub name: String,
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl From<DinasClaims> for AuthenticatedDinas {
    fn from(claims: DinasClaims) -> Self {
        Self {
            sub: claims.sub,
            name: claims.name,
            categories: claims.categories,
            scope: claims.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dinas(scope: Option<&str>) -> AuthenticatedDinas {
        AuthenticatedDinas {
            sub: "dpu-bandung".to_string(),
            name: "Dinas Pekerjaan Umum".to_string(),
            categories: vec![Category::Infrastructure],
            scope: scope.map(|s| s.to_string()),
        }
    }

    #[test]
    fn coverage_requires_assignment_or_scope() {
        let assigned = vec!["dpu-bandung".to_string()];
        let other = vec!["dlh-bandung".to_string()];

        let plain = dinas(None);
        assert!(plain.covers(&assigned));
        assert!(!plain.covers(&other));

        let admin = dinas(Some(SCOPE_ALL_AGENCIES));
        assert!(admin.covers(&assigned));
        assert!(admin.covers(&other));

        // An unknown scope string grants nothing
        let odd = dinas(Some("read-only"));
        assert!(!odd.covers(&other));
    }
}
