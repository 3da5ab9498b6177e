use std::sync::RwLock;

use tracing::info;

/// Answers "who is signed in right now".
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Local session holder. Verifying credentials is left to the caller.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user: RwLock<Option<String>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user.into())),
        }
    }

    /// Starts a session for `user`. Blank names are ignored and return `false`.
    pub fn login(&self, user: &str) -> bool {
        let user = user.trim();
        if user.is_empty() {
            return false;
        }
        if let Ok(mut guard) = self.user.write() {
            *guard = Some(user.to_string());
            info!(user, "session started");
            return true;
        }
        false
    }

    /// Ends the session, returning the user that was signed in.
    pub fn logout(&self) -> Option<String> {
        let previous = self.user.write().ok().and_then(|mut guard| guard.take());
        if let Some(user) = previous.as_deref() {
            info!(user, "session ended");
        }
        previous
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user(&self) -> Option<String> {
        self.user.read().ok().and_then(|guard| guard.clone())
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    fn current_user(&self) -> Option<String> {
        (**self).current_user()
    }
}
