//! Local account gate for the app shell.
//!
//! A single account is kept in an injected [`SessionStore`]. Passwords are
//! never stored; only a keyed blake3 digest of email and password is.

use std::collections::HashMap;

use decor_core::{DecorError, Result};

const EMAIL_KEY: &str = "userEmail";
const PASSWORD_KEY: &str = "userPassword";
const LOGGED_IN_KEY: &str = "isUserLoggedIn";

const DIGEST_CONTEXT: &str = "decor-rs 2024 account password v1";

/// String key-value storage for session data.
pub trait SessionStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Deletes `key`.
    fn remove(&mut self, key: &str);

    /// Deletes every key.
    fn clear(&mut self);
}

/// A [`SessionStore`] that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Registration and login against a [`SessionStore`].
#[derive(Debug, Default)]
pub struct Accounts<S> {
    store: S,
}

impl<S: SessionStore> Accounts<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers the single local account, replacing any previous one.
    ///
    /// Registering does not log in.
    pub fn register(&mut self, email: &str, password: &str) -> Result<()> {
        if email.is_empty() || password.is_empty() {
            return Err(DecorError::MissingCredentials);
        }
        self.store.set(EMAIL_KEY, email.to_string());
        self.store.set(PASSWORD_KEY, password_digest(email, password));
        log::info!("registered account {email}");
        Ok(())
    }

    /// Logs in if `email` and `password` match the registered account.
    pub fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let registered = self.store.get(EMAIL_KEY);
        let digest = self.store.get(PASSWORD_KEY);
        match (registered, digest) {
            (Some(registered), Some(digest))
                if registered == email && digest == password_digest(email, password) =>
            {
                self.store.set(LOGGED_IN_KEY, true.to_string());
                log::info!("{email} logged in");
                Ok(())
            }
            _ => {
                log::debug!("login rejected for {email}");
                Err(DecorError::InvalidCredentials)
            }
        }
    }

    /// Clears the logged-in flag. The account stays registered.
    pub fn logout(&mut self) {
        self.store.remove(LOGGED_IN_KEY);
    }

    /// Returns whether a user is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.store
            .get(LOGGED_IN_KEY)
            .is_some_and(|flag| flag == "true")
    }

    /// Returns the registered email.
    pub fn registered_email(&self) -> Option<String> {
        self.store.get(EMAIL_KEY)
    }

    /// Gives back the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

fn password_digest(email: &str, password: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(DIGEST_CONTEXT);
    hasher.update(email.as_bytes());
    hasher.update(&[0]);
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}
