use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};

const ADMIN_ROLE: &str = "admin";

/// Caller identity taken from the bearer token. No local user table exists;
/// the token is the only source of truth, and it is kept around so lookups
/// against the identity service can be made on the caller's behalf.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser {
    pub(crate) id: Uuid,
    pub(crate) role: Option<String>,
    pub(crate) token: String,
}

impl AuthUser {
    pub(crate) fn is_admin(&self) -> bool {
        self.role.as_deref().is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
    }
}

pub(crate) struct CurrentUser(pub(crate) AuthUser);
pub(crate) struct CurrentAdmin(pub(crate) AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentUser(AuthUser { id, role: claims.role, token: token.to_string() }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Optional variant for public endpoints that still personalize when a valid
/// token happens to be present. A malformed token is treated as anonymous.
pub(crate) struct MaybeUser(pub(crate) Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}
