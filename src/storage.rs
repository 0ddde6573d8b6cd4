use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::data::{Category, Session};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no questionnaire answers stored")]
    Missing,
    #[error("stored {0} session has no answers")]
    Empty(Category),
    #[error("stored answers belong to the {stored} questionnaire, not {requested}")]
    CategoryMismatch {
        stored: Category,
        requested: Category,
    },
    #[error("session file {path:?} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access session store at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// The results stage was entered without usable answers; the user
    /// belongs back in the questionnaire.
    pub fn is_malformed_state(&self) -> bool {
        !matches!(self, SessionError::Io { .. })
    }
}

/// Holds the answers between the questionnaire and the results stage.
pub trait SessionStore: Send + Sync {
    /// Replace any stored session.
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn load(&self) -> Result<Option<Session>, SessionError>;
    /// Returns whether a session was removed.
    fn clear(&self) -> Result<bool, SessionError>;

    /// Load the session for the results stage, rejecting anything that
    /// cannot be scored.
    fn load_for_results(&self, requested: Option<Category>) -> Result<Session, SessionError> {
        let session = self.load()?.ok_or(SessionError::Missing)?;
        if let Some(requested) = requested {
            if requested != session.category {
                return Err(SessionError::CategoryMismatch {
                    stored: session.category,
                    requested,
                });
            }
        }
        if session.answers.is_empty() {
            return Err(SessionError::Empty(session.category));
        }
        Ok(session)
    }
}

pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SessionError + '_ {
        move |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<(), SessionError> {
        fs::create_dir_all(&self.base_dir).map_err(Self::io_error(&self.base_dir))?;

        let path = self.session_path();
        let json = serde_json::to_string_pretty(session).map_err(|source| {
            SessionError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(Self::io_error(&path))?;

        tracing::info!(
            session_id = %session.session_id,
            category = %session.category,
            answers = session.answers.len(),
            "Session saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, SessionError> {
        let path = self.session_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Self::io_error(&path)(err)),
        };
        let session: Session = serde_json::from_str(&content)
            .map_err(|source| SessionError::Corrupt { path, source })?;
        tracing::debug!(session_id = %session.session_id, "Session loaded");
        Ok(Some(session))
    }

    fn clear(&self) -> Result<bool, SessionError> {
        let path = self.session_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Session cleared");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Self::io_error(&path)(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnswerSet;
    use tempfile::TempDir;

    fn vehicle_session() -> Session {
        let answers: AnswerSet = [("vehicleValue", "800000"), ("vehicleAge", "2")]
            .into_iter()
            .collect();
        Session::new(Category::Vehicle, answers)
    }

    #[test]
    fn test_save_creates_directory_and_roundtrips() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("nested"));

        let session = vehicle_session();
        store.save(&session).unwrap();

        assert!(temp_dir.path().join("nested").join("session.json").exists());
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[test]
    fn test_load_without_session_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_replaces_previous_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());

        store.save(&vehicle_session()).unwrap();
        let replacement = Session::new(
            Category::Term,
            [("age", "30")].into_iter().collect(),
        );
        store.save(&replacement).unwrap();

        assert_eq!(store.load().unwrap(), Some(replacement));
    }

    #[test]
    fn test_clear_removes_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());

        store.save(&vehicle_session()).unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_load_for_results_rejects_missing_and_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());

        let err = store.load_for_results(Some(Category::Health)).unwrap_err();
        assert!(matches!(err, SessionError::Missing));
        assert!(err.is_malformed_state());

        store
            .save(&Session::new(Category::Health, AnswerSet::new()))
            .unwrap();
        let err = store.load_for_results(Some(Category::Health)).unwrap_err();
        assert!(matches!(err, SessionError::Empty(Category::Health)));
        assert!(err.is_malformed_state());
    }

    #[test]
    fn test_load_for_results_checks_category() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        store.save(&vehicle_session()).unwrap();

        let err = store.load_for_results(Some(Category::Term)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::CategoryMismatch {
                stored: Category::Vehicle,
                requested: Category::Term
            }
        ));

        let session = store.load_for_results(None).unwrap();
        assert_eq!(session.category, Category::Vehicle);
        assert!(store.load_for_results(Some(Category::Vehicle)).is_ok());
    }

    #[test]
    fn test_corrupt_session_is_malformed_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        fs::write(temp_dir.path().join("session.json"), "{not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
        assert!(err.is_malformed_state());
    }
}
