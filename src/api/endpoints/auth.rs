//! Authentication endpoints.
//!
//! `POST /api/auth/register`, `POST /api/auth/login` and
//! `GET /api/auth/session` are public; `GET /api/auth/me` needs a token.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::{AuthSession, LoginInput, RegisterInput};
use crate::authorization::Principal;
use crate::db;
use crate::models::User;

/// `POST /api/auth/register`: create an account and return a token.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = ctx
        .run_blocking(move |core, conn| Ok(core.auth.register(conn, input)?))
        .await?;
    Ok(Json(session))
}

/// `POST /api/auth/login`: exchange email and password for a token.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = ctx
        .run_blocking(move |core, conn| Ok(core.auth.login(conn, input)?))
        .await?;
    Ok(Json(session))
}

/// `GET /api/auth/me`: the authenticated account.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &principal.user_id)?.ok_or(ApiError::Unauthorized)?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

/// `GET /api/auth/session?session_id=`: trade an external identity
/// session for a local token.
pub async fn session(
    State(ctx): State<ApiContext>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = ctx
        .run_blocking(move |core, conn| {
            Ok(core
                .auth
                .exchange_session(conn, core.identity(), &query.session_id)?)
        })
        .await?;
    Ok(Json(session))
}
