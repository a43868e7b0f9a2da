use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::game::config::GameConfig;
use crate::game::types::GameOutcome;
use crate::stats::{leaderboard, LeaderboardRow, StatsRecorder, UserStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameConfig,
    /// Pause before the computer replies, in milliseconds.
    pub computer_delay_ms: u64,
    /// Preferred UI language; `None` follows the system locale.
    pub language: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            computer_delay_ms: 1000,
            language: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io.github", "bricks", "Bricks")
}

fn ensure_dir(dir: Option<PathBuf>) -> io::Result<PathBuf> {
    match dir {
        Some(dir) => {
            fs::create_dir_all(&dir)?;
            Ok(dir)
        }
        // no home directory: fall back to the working directory
        None => std::env::current_dir(),
    }
}

pub fn settings_path() -> io::Result<PathBuf> {
    let mut p = ensure_dir(project_dirs().map(|d| d.config_dir().to_path_buf()))?;
    p.push("settings.json");
    Ok(p)
}

pub fn users_path() -> io::Result<PathBuf> {
    let mut p = ensure_dir(project_dirs().map(|d| d.data_dir().to_path_buf()))?;
    p.push("users.json");
    Ok(p)
}

/// Read settings from `path`. A missing file gives the defaults.
pub fn read_settings(path: &Path) -> Result<Settings, PersistenceError> {
    let settings: Settings = match read_json(path)? {
        Some(s) => s,
        None => return Ok(Settings::default()),
    };
    if let Err(e) = settings.game.validate() {
        warn!(path = %path.display(), error = %e, "invalid game bounds in settings, using defaults");
        return Ok(Settings {
            game: GameConfig::default(),
            ..settings
        });
    }
    Ok(settings)
}

pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), PersistenceError> {
    write_json(path, settings)
}

/// Settings from the platform config directory, defaults on any failure.
pub fn load_settings() -> Settings {
    let loaded = settings_path()
        .map_err(|source| PersistenceError::Read {
            path: PathBuf::from("settings.json"),
            source,
        })
        .and_then(|p| read_settings(&p));
    match loaded {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "could not load settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<(), PersistenceError> {
    let path = settings_path().map_err(|source| PersistenceError::Write {
        path: PathBuf::from("settings.json"),
        source,
    })?;
    write_settings(&path, settings)
}

/// Parse the JSON file at `path`; `Ok(None)` when it does not exist.
fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace `path` with the pretty-printed JSON of `value`.
///
/// The data goes to a temporary file next to `path` which is then renamed
/// over it, so readers see either the old or the new contents.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let write_err = |source: io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    let data = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Serialize { source })?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(data.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// An account as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    pub email: String,
    pub gender: String,
    pub age_category: String,
    pub stats: UserStats,
    pub created_at: String,
}

type Users = BTreeMap<String, UserRecord>;

/// JSON-backed collection of accounts, keyed by login.
///
/// Every mutation is applied to a copy, written to disk, and only then made
/// visible, so memory never runs ahead of the file.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: Mutex<Users>,
}

impl UserStore {
    /// Load the store at `path`. A missing file is an empty store.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let users: Users = read_json(&path)?.unwrap_or_default();
        info!(users = users.len(), "user store loaded");
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    /// Like [`UserStore::open`] but falls back to an empty store, handing the
    /// load error back to the caller instead of failing.
    pub fn open_or_default(path: impl AsRef<Path>) -> (Self, Option<PersistenceError>) {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => (store, None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "user store unreadable, starting empty");
                let store = Self {
                    path: path.to_path_buf(),
                    users: Mutex::new(Users::new()),
                };
                (store, Some(e))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Users> {
        // Updates swap in a fully built map, so a poisoned lock still guards
        // consistent data.
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, login: &str) -> bool {
        self.lock().contains_key(login)
    }

    pub fn get(&self, login: &str) -> Option<UserRecord> {
        self.lock().get(login).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply `f` to a copy of the accounts, persist the copy, then commit it.
    ///
    /// The lock is held throughout, which serializes concurrent updates.
    pub fn update<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Users) -> Result<T, PersistenceError>,
    {
        let mut users = self.lock();
        let mut next = users.clone();
        let out = f(&mut next)?;
        write_json(&self.path, &next)?;
        *users = next;
        debug!(path = %self.path.display(), "user store saved");
        Ok(out)
    }

    #[cfg(test)]
    fn insert(&self, login: &str, record: UserRecord) -> Result<(), PersistenceError> {
        self.update(|users| {
            users.insert(login.to_string(), record);
            Ok(())
        })
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let users = self.lock();
        leaderboard(users.iter().map(|(login, r)| (login.as_str(), r.stats)))
    }
}

impl StatsRecorder for UserStore {
    #[instrument(skip(self))]
    fn record_outcome(&self, user: &str, outcome: GameOutcome) -> Result<UserStats, PersistenceError> {
        let stats = self.update(|users| {
            let record = users.get_mut(user).ok_or_else(|| PersistenceError::UnknownUser {
                login: user.to_string(),
            })?;
            record.stats.record(outcome);
            Ok(record.stats)
        })?;
        info!(games = stats.games_played, wins = stats.wins, losses = stats.losses, "outcome recorded");
        Ok(stats)
    }

    fn stats(&self, user: &str) -> Option<UserStats> {
        self.lock().get(user).map(|r| r.stats)
    }
}

/// Failure to read or write persisted data. Retrying is safe.
#[derive(Debug, derive_more::Display)]
pub enum PersistenceError {
    #[display("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[display("{} is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[display("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[display("failed to encode data: {source}")]
    Serialize { source: serde_json::Error },

    #[display("no stored account for {login:?}")]
    UnknownUser { login: String },
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Read { source, .. } | PersistenceError::Write { source, .. } => Some(source),
            PersistenceError::Parse { source, .. } | PersistenceError::Serialize { source } => Some(source),
            PersistenceError::UnknownUser { .. } => None,
        }
    }
}
