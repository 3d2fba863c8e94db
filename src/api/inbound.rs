use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::reply::ReplyTarget;
use crate::state::AppState;

/// Inbound-mail webhook payload
#[derive(Debug, Deserialize)]
pub struct InboundReply {
    pub recipient: String,
}

pub fn inbound_routes() -> Router<AppState> {
    Router::new().route("/reply", post(inbound_reply))
}

/// POST /api/v1/inbound/reply - resolve a reply address back to (post, user)
async fn inbound_reply(
    State(state): State<AppState>,
    Json(reply): Json<InboundReply>,
) -> Result<Json<ReplyTarget>> {
    let target = state
        .reply_codec
        .decode_post_reply_address(&reply.recipient)
        .inspect_err(|e| tracing::warn!(error = %e, "Rejected inbound reply address"))?;

    tracing::info!(
        post_id = %target.post_id,
        user_id = %target.user_id,
        "Inbound reply resolved"
    );

    Ok(Json(target))
}
