use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};
use crate::models::User;

/// Bearer token plus the user it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Durable home of the current session, shared by every request
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;

    fn token(&self) -> Option<String> {
        self.load().ok().flatten().map(|s| s.token)
    }
}

/// On-disk layout, one key per persisted value
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_user: Option<User>,
}

/// JSON file backed session store
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&raw).map_err(|e| {
            PortalError::session(format!("corrupt session file {}: {}", self.path.display(), e))
        })?;

        // A token without its user (or the reverse) is not a session
        Ok(match (stored.patient_token, stored.patient_user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Session { token, user }),
            _ => None,
        })
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let stored = StoredSession {
            patient_token: Some(session.token.clone()),
            patient_user: Some(session.user.clone()),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        tracing::debug!("session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        self.session
            .read()
            .map(|s| s.clone())
            .map_err(|_| PortalError::session("session lock poisoned"))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| PortalError::session("session lock poisoned"))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| PortalError::session("session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            token: "jwt-123".to_string(),
            user: User {
                id: "p1".to_string(),
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: Some("9876543210".to_string()),
                gender: None,
                date_of_birth: None,
            },
        }
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
        store.save(&session()).unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(session()));
        assert_eq!(reopened.token().as_deref(), Some("jwt-123"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("patientToken"));
        assert!(raw.contains("patientUser"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_token_without_user_is_not_restored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"patientToken":"orphan"}"#).unwrap();
        assert!(FileSessionStore::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PortalError::Session(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.token().is_none());
        store.save(&session()).unwrap();
        assert_eq!(store.token().as_deref(), Some("jwt-123"));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
