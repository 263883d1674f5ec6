//! Session extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use batchtone_core::error::CoreError;
use batchtone_engine::identity::Identity;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer token from the `Authorization` header, if any.
///
/// A present header in the wrong format is an error rather than `None`.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid Authorization header".into()))
    })?;
    value.strip_prefix("Bearer ").map(Some).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}

/// Caller with a valid session token. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn my_handler(user: SessionUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.identity.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    pub identity: Identity,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing Authorization header".into()))
        })?;
        let identity = state.engine.identity().current_user(token)?;
        Ok(SessionUser { identity })
    }
}

/// Caller that may not have a session yet (first upload). An invalid token
/// still rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeSessionUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeSessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = match bearer_token(parts)? {
            Some(token) => Some(state.engine.identity().current_user(token)?),
            None => None,
        };
        Ok(MaybeSessionUser(identity))
    }
}
