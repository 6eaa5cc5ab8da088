//! Process-wide session store
//!
//! The session is only ever changed through [`SessionAction`]s dispatched on
//! a [`SessionStore`]. Every handle shares the same state; the last writer
//! wins.

use crate::types::{PracticeAccount, UserDetails};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Authentication state of the current user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub access_token: Option<String>,
    /// Absolute expiry of `access_token`, Unix seconds
    pub access_token_expiry: Option<i64>,
    pub refresh_token: Option<String>,
    pub login_id: Option<String>,
    pub user_id: Option<String>,
    pub practice_account_id: Option<String>,
    pub email_id: Option<String>,
    pub has_2fa: bool,
    pub practice_accounts: Vec<PracticeAccount>,
    pub user_details: Option<UserDetails>,
}

impl Session {
    /// True when a token is held and `now` has reached its expiry
    pub const fn is_expired_at(&self, now: i64) -> bool {
        match (&self.access_token, self.access_token_expiry) {
            (Some(_), Some(expiry)) => now >= expiry,
            _ => false,
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Credentials issued on a completed sign-in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user_details: Option<UserDetails>,
}

/// The only mutations a session accepts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Email and password were accepted
    LoginStarted {
        login_id: String,
        email_id: String,
        practice_accounts: Vec<PracticeAccount>,
    },
    /// A practice was chosen for this login
    PracticeSelected {
        user_id: String,
        practice_account_id: String,
        has_2fa: bool,
    },
    /// Sign-in completed and credentials were issued
    Authenticated(AuthGrant),
    /// The access token was renewed
    Refreshed { access_token: String, expires_at: i64 },
    /// Sign out, or the session could not be kept alive
    Clear,
}

impl Session {
    fn reduce(&self, action: SessionAction) -> Self {
        match action {
            SessionAction::LoginStarted {
                login_id,
                email_id,
                practice_accounts,
            } => Self {
                login_id: Some(login_id),
                email_id: Some(email_id),
                practice_accounts,
                ..Self::default()
            },
            SessionAction::PracticeSelected {
                user_id,
                practice_account_id,
                has_2fa,
            } => Self {
                user_id: Some(user_id),
                practice_account_id: Some(practice_account_id),
                has_2fa,
                ..self.clone()
            },
            SessionAction::Authenticated(grant) => {
                let practice_account_id = grant
                    .user_details
                    .as_ref()
                    .map(|details| details.practice_account_id.clone())
                    .filter(|id| !id.is_empty())
                    .or_else(|| self.practice_account_id.clone());
                Self {
                    access_token: Some(grant.access_token),
                    access_token_expiry: Some(grant.expires_at),
                    refresh_token: Some(grant.refresh_token),
                    practice_account_id,
                    user_details: grant.user_details,
                    ..self.clone()
                }
            }
            SessionAction::Refreshed {
                access_token,
                expires_at,
            } => Self {
                access_token: Some(access_token),
                access_token_expiry: Some(expires_at),
                ..self.clone()
            },
            SessionAction::Clear => Self::default(),
        }
    }
}

/// Durable storage for the session between runs
pub trait SessionPersistence: Send + Sync {
    /// The stored session, if one exists and parses
    fn load(&self) -> Option<Session>;

    fn save(&self, session: &Session);

    fn clear(&self);
}

/// Persists the session as JSON in a single file
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable session file: {e}");
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), "Failed to create session directory: {e}");
                return;
            }
        }
        let result = serde_json::to_string_pretty(session)
            .map_err(std::io::Error::other)
            .and_then(|content| std::fs::write(&self.path, content));
        if let Err(e) = result {
            warn!(path = %self.path.display(), "Failed to persist session: {e}");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove session file: {e}"),
        }
    }
}

/// Shared handle to the session
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl SessionStore {
    /// An empty, in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `session`
    pub fn with_session(session: Session) -> Self {
        Self {
            state: Arc::new(RwLock::new(session)),
            persistence: None,
        }
    }

    /// A store that restores from and writes through to `persistence`
    pub fn persistent(persistence: Arc<dyn SessionPersistence>) -> Self {
        let session = persistence.load().unwrap_or_default();
        if session.is_authenticated() {
            debug!("Restored persisted session");
        }
        Self {
            state: Arc::new(RwLock::new(session)),
            persistence: Some(persistence),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `action` and return the resulting state
    ///
    /// The write lock is held until the change is persisted, so the stored
    /// file always ends in the same state as memory.
    pub fn dispatch(&self, action: SessionAction) -> Session {
        let clearing = matches!(action, SessionAction::Clear);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = state.reduce(action);

        if let Some(persistence) = &self.persistence {
            if clearing {
                persistence.clear();
            } else {
                persistence.save(&state);
            }
        }
        state.clone()
    }

    pub fn clear(&self) {
        self.dispatch(SessionAction::Clear);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.snapshot();
        f.debug_struct("SessionStore")
            .field("authenticated", &session.is_authenticated())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}
