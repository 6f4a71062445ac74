use crate::domain::{AuthEvent, AuthUser, Credentials, Session, SignUp, UserId};
use crate::ports::auth_provider::{AuthProvider as AuthProviderTrait, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Mock implementation of AuthProvider
///
/// Keeps accounts and issued tokens in memory and publishes the same
/// auth events a hosted provider would.
pub struct AuthProvider {
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    access_tokens: Mutex<HashMap<String, AuthUser>>,
    refresh_tokens: Mutex<HashMap<String, AuthUser>>,
    events: broadcast::Sender<AuthEvent>,
    unavailable: Mutex<bool>,
}

impl AuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            access_tokens: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
            events,
            unavailable: Mutex::new(false),
        }
    }

    /// Register an account for testing purposes
    pub fn add_account(&self, email: &str, password: &str) -> AuthUser {
        let credentials = Credentials::new(email, password);
        let user = AuthUser {
            id: UserId::new(),
            email: Some(credentials.email().to_string()),
        };
        self.accounts.lock().unwrap().insert(
            credentials.email().to_string(),
            (credentials.password().to_string(), user.clone()),
        );
        user
    }

    /// Issue a session directly, without publishing an event
    pub fn issue_session(&self, user: &AuthUser) -> Session {
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            user: user.clone(),
        };
        self.access_tokens
            .lock()
            .unwrap()
            .insert(session.access_token.clone(), user.clone());
        if let Some(refresh) = &session.refresh_token {
            self.refresh_tokens
                .lock()
                .unwrap()
                .insert(refresh.clone(), user.clone());
        }
        session
    }

    /// Publish an event as if it came from the hosted provider
    pub fn emit(&self, event: AuthEvent) {
        // no receivers is not an error
        let _ = self.events.send(event);
    }

    /// Make every call fail with a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err("auth service unavailable".into());
        }
        Ok(())
    }
}

impl Default for AuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProviderTrait for AuthProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        self.check_available()?;
        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(credentials.email()) {
                Some((password, user)) if password == credentials.password() => user.clone(),
                _ => return Err("invalid login credentials".into()),
            }
        };

        let session = self.issue_session(&user);
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUp> {
        self.check_available()?;
        if self
            .accounts
            .lock()
            .unwrap()
            .contains_key(credentials.email())
        {
            return Err("user already registered".into());
        }

        let user = self.add_account(credentials.email(), credentials.password());
        let session = self.issue_session(&user);
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(SignUp {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        self.check_available()?;
        self.access_tokens
            .lock()
            .unwrap()
            .remove(&session.access_token);
        if let Some(refresh) = &session.refresh_token {
            self.refresh_tokens.lock().unwrap().remove(refresh);
        }
        self.emit(AuthEvent::signed_out());
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.check_available()?;
        let user = self
            .refresh_tokens
            .lock()
            .unwrap()
            .remove(refresh_token)
            .ok_or("invalid refresh token")?;

        let session = self.issue_session(&user);
        self.emit(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        self.check_available()?;
        Ok(self.access_tokens.lock().unwrap().get(access_token).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
