//! Local persistence of the session, the bearer token and a couple of UI markers.
//!
//! The layout mirrors a flat key-value store:
//!
//! | key            | value                                  |
//! |----------------|----------------------------------------|
//! | `user`         | serialized [`Session`]                 |
//! | `token`        | raw bearer token                       |
//! | `subscription` | last selected plan identifier          |
//! | `role`         | `guest` while browsing without account |
//!
//! Backends only need `get` and an atomic batch `apply`, so that clearing the
//! session removes `user` and `token` together or not at all.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::errors::{ExplorerError, Result};
use crate::structs::session::Session;
use crate::structs::PlanType;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";
pub const SUBSCRIPTION_KEY: &str = "subscription";
pub const ROLE_KEY: &str = "role";

const GUEST_ROLE: &str = "guest";

/// One entry of an atomic batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write<'a> {
    Set(&'a str, &'a str),
    Remove(&'a str),
}

/// Minimal get/set/remove capability. Implementations must apply a batch all-or-nothing.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn apply(&self, batch: &[Write<'_>]) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.apply(&[Write::Set(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.apply(&[Write::Remove(key)])
    }
}

fn apply_to_map(map: &mut BTreeMap<String, String>, batch: &[Write<'_>]) {
    for write in batch {
        match *write {
            Write::Set(key, value) => {
                map.insert(key.to_string(), value.to_string());
            }
            Write::Remove(key) => {
                map.remove(key);
            }
        }
    }
}

/// In-process store. Used by tests and by callers that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ExplorerError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, batch: &[Write<'_>]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ExplorerError::Storage("memory store lock poisoned".into()))?;
        apply_to_map(&mut entries, batch);
        Ok(())
    }
}

/// JSON file store. Every batch rewrites the file through a temporary sibling and a rename,
/// so a reader sees either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                ExplorerError::Storage(format!("{} is corrupt: {}", self.path.display(), err))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ExplorerError::Storage("file store lock poisoned".into()))?;
        Ok(self.read_map()?.remove(key))
    }

    fn apply(&self, batch: &[Write<'_>]) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ExplorerError::Storage("file store lock poisoned".into()))?;

        let mut map = self.read_map()?;
        apply_to_map(&mut map, batch);
        self.write_map(&map)
    }
}

/// Session repository injected into controllers. `save`, `load` and `clear` are its contract;
/// the remaining helpers cover the `subscription` and `role` markers.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Persists the session and its token in one batch. Drops any guest marker.
    pub fn save(&self, session: &Session) -> Result<()> {
        let serialized = serde_json::to_string(session)?;
        self.backend.apply(&[
            Write::Set(USER_KEY, &serialized),
            Write::Set(TOKEN_KEY, &session.auth_token),
            Write::Remove(ROLE_KEY),
        ])?;

        debug!(user_id = session.user_id, "session saved");
        Ok(())
    }

    /// Returns the session only when both the record and the token are present.
    pub fn load(&self) -> Result<Option<Session>> {
        let user = self.backend.get(USER_KEY)?;
        let token = self.backend.get(TOKEN_KEY)?;

        match (user, token) {
            (Some(user), Some(token)) => {
                let mut session: Session = serde_json::from_str(&user).map_err(|err| {
                    ExplorerError::Storage(format!("stored session is unreadable: {}", err))
                })?;
                // The standalone token entry wins if the two ever disagree
                session.auth_token = token;
                Ok(Some(session))
            }
            (None, None) => Ok(None),
            (user, _) => {
                warn!(
                    has_user = user.is_some(),
                    "session store holds only half a session, treating as signed out"
                );
                Ok(None)
            }
        }
    }

    /// Removes the session and the token together.
    pub fn clear(&self) -> Result<()> {
        self.backend
            .apply(&[Write::Remove(USER_KEY), Write::Remove(TOKEN_KEY)])?;
        info!("session cleared");
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|session| session.auth_token))
    }

    pub fn selected_plan(&self) -> Result<Option<PlanType>> {
        Ok(self
            .backend
            .get(SUBSCRIPTION_KEY)?
            .and_then(|plan| plan.parse().ok()))
    }

    pub fn set_selected_plan(&self, plan: PlanType) -> Result<()> {
        self.backend.set(SUBSCRIPTION_KEY, plan.as_str())
    }

    /// Signs out and marks the device as browsing as a guest.
    pub fn start_guest(&self) -> Result<()> {
        self.backend.apply(&[
            Write::Remove(USER_KEY),
            Write::Remove(TOKEN_KEY),
            Write::Set(ROLE_KEY, GUEST_ROLE),
        ])
    }

    pub fn is_guest(&self) -> Result<bool> {
        Ok(self.load()?.is_none())
    }

    pub fn role_marker(&self) -> Result<Option<String>> {
        self.backend.get(ROLE_KEY)
    }
}
