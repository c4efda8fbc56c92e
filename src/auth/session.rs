use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tomlfile::{self, Visibility};
use crate::types::User;

const SESSION_FILE_NAME: &str = "session.toml";

/// The one place the bearer token and cached user live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

impl Session {
    pub fn state(&self) -> SessionState {
        match (&self.token, &self.user) {
            (Some(_), Some(user)) => SessionState::Authenticated(user.clone()),
            _ => SessionState::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated(_))
    }
}

/// Shared, optionally persisted session. Every mutation is written through
/// to the session file when one is attached.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
    store: Option<SessionStore>,
}

impl SessionHandle {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Session::default())),
            store: None,
        }
    }

    pub fn persistent(store: SessionStore) -> Self {
        let session = store.load();
        Self {
            inner: Arc::new(Mutex::new(session)),
            store: Some(store),
        }
    }

    pub fn store(&self) -> Option<&SessionStore> {
        self.store.as_ref()
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn set_token(&self, token: String) {
        self.update(|session| session.token = Some(token));
    }

    pub fn set_user(&self, user: User) {
        self.update(|session| session.user = Some(user));
    }

    pub fn establish(&self, token: String, user: User) {
        self.update(|session| {
            session.token = Some(token);
            session.user = Some(user);
        });
    }

    pub fn clear(&self) {
        {
            let mut session = self.lock();
            *session = Session::default();
        }
        if let Some(store) = &self.store
            && let Err(err) = store.clear()
        {
            warn!(error = %err, "failed to remove session file");
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Session)) {
        let snapshot = {
            let mut session = self.lock();
            apply(&mut session);
            session.clone()
        };
        if let Some(store) = &self.store
            && let Err(err) = store.save(&snapshot)
        {
            warn!(error = %err, "failed to persist session");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// TOML file holding the persisted [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::data_local_dir()?;
        path.push("taskdeck");
        path.push(SESSION_FILE_NAME);
        Some(path)
    }

    pub fn at_default_location() -> anyhow::Result<Self> {
        Self::default_path()
            .map(Self::new)
            .ok_or_else(|| anyhow!("unable to determine session file location"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, or an anonymous one when the file is missing or
    /// unreadable.
    pub fn load(&self) -> Session {
        tomlfile::read(&self.path).unwrap_or_default()
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        tomlfile::write(&self.path, session, Visibility::Private)
            .with_context(|| format!("failed to save session to '{}'", self.path.display()))
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        tomlfile::remove(&self.path)
    }
}
