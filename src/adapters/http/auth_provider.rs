use crate::domain::{AuthEvent, AuthUser, Credentials, Session, SignUp, UserId};
use crate::ports::auth_provider::{AuthProvider as AuthProviderTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 16;

/// Error body returned by the auth service
#[derive(Debug, Error)]
#[error("auth service responded with {status}: {message}")]
pub struct AuthApiError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    email: Option<String>,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        AuthUser {
            id: UserId::from_uuid(user.id),
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserResponse,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Signup returns a full session when email confirmation is disabled,
/// and only the user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// AuthProvider for a GoTrue-compatible hosted auth service
///
/// Every request carries the project's public `apikey` header. Successful
/// sign-in, sign-up with a session, sign-out and refresh are published to
/// subscribers.
pub struct AuthProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            events,
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
    }

    fn emit(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "Auth event");
        // no subscribers
        let _ = self.events.send(event);
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let response = self
            .post("token")
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let token = ensure_success(response)
            .await?
            .json::<TokenResponse>()
            .await?;
        Ok(token.into_session())
    }
}

/// Turn a non-2xx response into an `AuthApiError` carrying the service's message
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    let message = body
        .error_description
        .or(body.msg)
        .or(body.message)
        .or(body.error)
        .unwrap_or_else(|| status.to_string());

    Err(Box::new(AuthApiError {
        status: status.as_u16(),
        message,
    }))
}

#[async_trait]
impl AuthProviderTrait for AuthProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let session = self
            .token(
                "password",
                json!({ "email": credentials.email(), "password": credentials.password() }),
            )
            .await?;

        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUp> {
        let response = self
            .post("signup")
            .json(&json!({ "email": credentials.email(), "password": credentials.password() }))
            .send()
            .await?;

        let sign_up = match ensure_success(response)
            .await?
            .json::<SignUpResponse>()
            .await?
        {
            SignUpResponse::Session(token) => {
                let session = token.into_session();
                SignUp {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUp {
                user: user.into(),
                session: None,
            },
        };

        if let Some(session) = &sign_up.session {
            self.emit(AuthEvent::signed_in(session.clone()));
        }
        Ok(sign_up)
    }

    /// A token the service no longer knows is treated as already signed out
    async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .post("logout")
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!(status = %response.status(), "Session already invalid on sign-out");
            }
            _ => {
                ensure_success(response).await?;
            }
        }

        self.emit(AuthEvent::signed_out());
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let session = self
            .token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        self.emit(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user = ensure_success(response)
            .await?
            .json::<UserResponse>()
            .await?;
        Ok(Some(user.into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
