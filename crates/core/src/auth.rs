//! Authentication gate.
//!
//! [`AuthContext`] holds the signed-in user for the whole application. It starts in
//! [`AuthState::Loading`] and leaves that state exactly once, when [`AuthContext::restore`]
//! resolves the stored session. Afterwards it moves between `Authenticated` and
//! `Unauthenticated` on sign-in, sign-out, or a session-change notification from the backend.
//!
//! Signing in only proves the credentials; the user's profile (name, role, institution) is
//! then read from the `users` table. A session without a profile row is treated as signed out.

use crate::backend::{AuthEvent, BackendClient, Session};
use crate::error::{AuthError, WardError, WardResult};
use crate::model::User;
use tokio::sync::broadcast::{self, error::TryRecvError};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum AuthState {
    Loading,
    Authenticated(User),
    Unauthenticated,
}

pub struct AuthContext {
    client: BackendClient,
    state: AuthState,
    session: Option<Session>,
    events: broadcast::Receiver<AuthEvent>,
}

impl AuthContext {
    /// Subscribes to session changes; the context stays `Loading` until [`Self::restore`].
    pub fn new(client: BackendClient) -> Self {
        let events = client.auth().subscribe();
        Self {
            client,
            state: AuthState::Loading,
            session: None,
            events,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Resolves the initial `Loading` state from a previously issued access token.
    ///
    /// Any failure to look the session up resolves to `Unauthenticated`.
    pub fn restore(&mut self, access_token: Option<&str>) -> &AuthState {
        let session = match access_token {
            Some(token) => match self.client.auth().get_session(token) {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!("Error restoring session: {}", e);
                    None
                }
            },
            None => None,
        };

        match session {
            Some(session) => self.adopt(session),
            None => self.clear(),
        }
        &self.state
    }

    /// Signs in with an email and password.
    ///
    /// On failure the state is left unchanged and the backend's error is returned; its display
    /// string is the message the login form shows.
    pub fn sign_in(&mut self, email: &str, password: &str) -> WardResult<&User> {
        let session = self.client.auth().sign_in_with_password(email, password)?;
        let user_id = session.user_id;
        self.adopt(session);

        self.user()
            .ok_or_else(|| WardError::NotFound(format!("profile for user {user_id}")))
    }

    /// Signs out. The context is unauthenticated afterwards even if the backend call fails.
    pub fn sign_out(&mut self) -> WardResult<()> {
        let result = match self.session.as_ref() {
            Some(session) => self.client.auth().sign_out(&session.access_token),
            None => Ok(()),
        };
        self.clear();

        match result {
            Ok(()) | Err(AuthError::SessionNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies queued session-change notifications. Returns true if the state changed.
    pub fn pump_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(AuthEvent::SignedOut { access_token }) => {
                    if self.access_token() == Some(access_token.as_str()) {
                        tracing::info!("session ended elsewhere");
                        self.clear();
                        changed = true;
                    }
                }
                Ok(AuthEvent::SignedIn(_)) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed session events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        changed
    }

    fn adopt(&mut self, session: Session) {
        match self.load_profile(session.user_id) {
            Ok(Some(user)) => {
                self.session = Some(session);
                self.state = AuthState::Authenticated(user);
            }
            Ok(None) => {
                tracing::warn!(user_id = %session.user_id, "session has no user profile");
                self.discard(&session);
            }
            Err(e) => {
                tracing::error!("Error loading user profile: {}", e);
                self.discard(&session);
            }
        }
    }

    /// Ends a backend session the context cannot use, then clears local state.
    fn discard(&mut self, session: &Session) {
        if let Err(e) = self.client.auth().sign_out(&session.access_token) {
            tracing::error!("Error ending session without profile: {}", e);
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.session = None;
        self.state = AuthState::Unauthenticated;
    }

    fn load_profile(&self, user_id: Uuid) -> WardResult<Option<User>> {
        let users = self.client.from::<User>().eq("id", user_id).execute()?;
        Ok(users.into_iter().next())
    }
}
