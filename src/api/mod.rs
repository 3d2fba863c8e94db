pub mod communities;
pub mod health;
pub mod inbound;

use axum::Router;

use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .merge(health::health_routes())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/communities", communities::community_routes())
        .nest("/inbound", inbound::inbound_routes())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AuthService;
    use crate::config::Config;
    use crate::error::{MailError, Result};
    use crate::invite::{CommunityDirectory, InvitationDispatcher};
    use crate::mail::tests::RecordingSender;
    use crate::mail::{Mailer, Sender, TemplatedEmail};
    use crate::models::Community;
    use crate::redis::{create_pool, CommunityRepository};
    use crate::reply::ReplyAddressCodec;

    struct OneCommunity;

    #[async_trait]
    impl CommunityDirectory for OneCommunity {
        async fn find_community(&self, community_id: &str) -> Result<Option<Community>> {
            Ok((community_id == "c1").then(|| Community {
                id: "c1".to_string(),
                name: "Gardeners".to_string(),
                slug: "gardeners".to_string(),
                description: None,
            }))
        }
    }

    /// Hangs on one recipient, accepts everyone else.
    struct StalledSender {
        stalled: String,
    }

    #[async_trait]
    impl Sender for StalledSender {
        async fn send(&self, email: TemplatedEmail) -> std::result::Result<(), MailError> {
            if email.recipient == self.stalled {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            server_host: "localhost".to_string(),
            server_port: 8080,
            redis_url: "redis://127.0.0.1:1".to_string(),
            jwt_secret: "test-secret-key".to_string(),
            jwt_expiry_seconds: 900,
            mail_api_key: "key".to_string(),
            mail_api_url: "http://127.0.0.1:9/send".to_string(),
            email_sender: "noreply@hylo.test".to_string(),
            email_sender_name: "Hylo".to_string(),
            reply_address_key: "reply-secret".to_string(),
            reply_address_salt: "salt".to_string(),
            reply_address_domain: "reply.hylo.test".to_string(),
            invite_max_in_flight: 4,
            invite_batch_timeout: Duration::from_secs(45),
            app_url: "http://localhost:3000".to_string(),
        }
    }

    fn test_state(sender: Arc<RecordingSender>) -> AppState {
        state_with(test_config(), sender)
    }

    fn state_with(config: Config, sender: Arc<dyn Sender>) -> AppState {
        let auth = AuthService::new(&config);
        let communities = Arc::new(CommunityRepository::new(create_pool(&config).unwrap()));
        let codec = Arc::new(ReplyAddressCodec::from_config(&config));
        let mailer = Arc::new(Mailer::new(sender, codec.clone(), &config.email_sender_name));
        let dispatcher = InvitationDispatcher::new(
            mailer.clone(),
            Arc::new(OneCommunity),
            config.invite_max_in_flight,
            &config.app_url,
        );
        AppState::new(config, auth, communities, mailer, codec, dispatcher)
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invite_reports_each_recipient() {
        let sender = Arc::new(RecordingSender {
            failing: vec!["b@x.com".to_string()],
            ..Default::default()
        });
        let state = test_state(sender.clone());
        let token = state.auth.generate_token("u1", "Ann", "ann@x.com").unwrap();

        let response = create_router(state)
            .oneshot(post_json(
                "/api/v1/communities/c1/invite",
                json!({"emails": "a@x.com,not-an-email,Bee <b@x.com>", "message": "hi"}),
                Some(&token),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"results": [
                {"email": "a@x.com", "error": null},
                {"email": "not-an-email", "error": "not a valid email address"},
                {"email": "b@x.com", "error": "mailbox unavailable"},
            ]})
        );

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data["inviter_name"], "Ann");
        assert_eq!(sent[0].data["message"], "hi");
    }

    #[tokio::test]
    async fn test_invite_deadline_returns_recorded_outcomes() {
        let config = Config {
            invite_batch_timeout: Duration::from_millis(100),
            ..test_config()
        };
        let state = state_with(
            config,
            Arc::new(StalledSender {
                stalled: "slow@x.com".to_string(),
            }),
        );
        let token = state.auth.generate_token("u1", "Ann", "ann@x.com").unwrap();

        let response = create_router(state)
            .oneshot(post_json(
                "/api/v1/communities/c1/invite",
                json!({"emails": ["a@x.com", "slow@x.com", "bad", "b@x.com"]}),
                Some(&token),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"results": [
                {"email": "a@x.com", "error": null},
                {"email": "bad", "error": "not a valid email address"},
                {"email": "b@x.com", "error": null},
            ]})
        );
    }

    #[tokio::test]
    async fn test_invite_requires_bearer() {
        let response = create_router(test_state(Arc::default()))
            .oneshot(post_json(
                "/api/v1/communities/c1/invite",
                json!({"emails": ["a@x.com"]}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invite_unknown_community() {
        let state = test_state(Arc::default());
        let token = state.auth.generate_token("u1", "Ann", "ann@x.com").unwrap();

        let response = create_router(state)
            .oneshot(post_json(
                "/api/v1/communities/nope/invite",
                json!({"emails": ["a@x.com"]}),
                Some(&token),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], 404);
    }

    #[tokio::test]
    async fn test_inbound_reply_resolves_ids() {
        let state = test_state(Arc::default());
        let address = state.reply_codec.post_reply_address("311", "27").unwrap();

        let response = create_router(state)
            .oneshot(post_json(
                "/api/v1/inbound/reply",
                json!({ "recipient": format!("Hylo <{}>", address) }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"post_id": "311", "user_id": "27"})
        );
    }

    #[tokio::test]
    async fn test_inbound_reply_rejects_garbage() {
        let response = create_router(test_state(Arc::default()))
            .oneshot(post_json(
                "/api/v1/inbound/reply",
                json!({"recipient": "someone@example.com"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
