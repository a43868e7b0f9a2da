//! Account registration and login.
//!
//! A successful login yields a [`Session`], the explicit context passed to
//! whatever records the player's games. There is no global "current user".

use chrono::Local;
use tracing::{info, instrument};

use crate::stats::UserStats;
use crate::storage::{PersistenceError, UserRecord, UserStore};

pub const MIN_LOGIN_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 4;

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A logged-in player. Logging out is dropping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    login: String,
}

impl Session {
    pub(crate) fn new(login: impl Into<String>) -> Self {
        Self { login: login.into() }
    }

    pub fn login(&self) -> &str {
        &self.login
    }
}

/// Profile fields collected at registration.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub login: String,
    pub password: String,
    pub email: String,
    pub gender: String,
    pub age_category: String,
}

pub struct AuthManager<'a> {
    store: &'a UserStore,
}

impl<'a> AuthManager<'a> {
    pub fn new(store: &'a UserStore) -> Self {
        Self { store }
    }

    /// Validate and store a new account.
    ///
    /// Checks run login, uniqueness, password, email; the first failure is
    /// returned and nothing is stored.
    #[instrument(skip_all, fields(login = %form.login))]
    pub fn register(&self, form: Registration) -> Result<Session, AuthError> {
        if !validate_login(&form.login) {
            return Err(AuthError::InvalidLogin);
        }
        if self.store.contains(&form.login) {
            return Err(AuthError::LoginTaken);
        }
        if !validate_password(&form.password) {
            return Err(AuthError::InvalidPassword);
        }
        if !validate_email(&form.email) {
            return Err(AuthError::InvalidEmail);
        }

        let login = form.login;
        let record = UserRecord {
            password: form.password,
            email: form.email,
            gender: form.gender,
            age_category: form.age_category,
            stats: UserStats::default(),
            created_at: Local::now().format(CREATED_AT_FORMAT).to_string(),
        };
        let inserted = self.store.update(|users| {
            // re-checked under the store lock
            if users.contains_key(&login) {
                return Ok(false);
            }
            users.insert(login.clone(), record);
            Ok(true)
        })?;
        if !inserted {
            return Err(AuthError::LoginTaken);
        }

        info!("account registered");
        Ok(Session::new(login))
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, login: &str, password: &str) -> Result<Session, AuthError> {
        let record = self.store.get(login).ok_or(AuthError::UnknownUser)?;
        if record.password != password {
            return Err(AuthError::WrongPassword);
        }
        info!("logged in");
        Ok(Session::new(login))
    }
}

/// At least three characters, letters and digits only.
pub fn validate_login(login: &str) -> bool {
    login.chars().count() >= MIN_LOGIN_LEN && login.chars().all(char::is_alphanumeric)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// `local@domain.tld` with a purely alphabetic TLD of two or more letters.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));

    // the domain part cannot hold another '@', so the last dot splits off the TLD
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

#[derive(Debug, derive_more::Display)]
pub enum AuthError {
    #[display("login must be at least {} letters or digits", MIN_LOGIN_LEN)]
    InvalidLogin,

    #[display("login is already taken")]
    LoginTaken,

    #[display("password must be at least {} characters", MIN_PASSWORD_LEN)]
    InvalidPassword,

    #[display("email must look like name@domain.tld")]
    InvalidEmail,

    #[display("no such user")]
    UnknownUser,

    #[display("wrong password")]
    WrongPassword,

    #[display("{_0}")]
    Persistence(PersistenceError),
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for AuthError {
    fn from(err: PersistenceError) -> Self {
        AuthError::Persistence(err)
    }
}
