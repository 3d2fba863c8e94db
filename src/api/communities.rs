use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::error::{AppError, Result};
use crate::models::{InvitationContext, InviteRequest, InviteResponse};
use crate::state::AppState;

/// Community routes
pub fn community_routes() -> Router<AppState> {
    Router::new().route("/{community_id}/invite", post(invite))
}

/// POST /api/v1/communities/{community_id}/invite
/// Sends one invitation per recipient and reports each outcome
async fn invite(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<InviteRequest>,
) -> Result<Json<InviteResponse>> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::Unauthorized("Bearer token is required".to_string()))?;
    let inviter = state.auth.inviter(bearer.token())?;

    let ctx = InvitationContext {
        inviter,
        community_id,
        message: request.message,
        moderator: request.moderator,
        subject: request.subject,
    };

    // Outcomes recorded by the deadline are returned; sends still pending are dropped.
    let results = state
        .dispatcher
        .dispatch_batch_until(
            &request.emails,
            &ctx,
            tokio::time::sleep(state.config.invite_batch_timeout),
        )
        .await?;

    Ok(Json(InviteResponse { results }))
}
