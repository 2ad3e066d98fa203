use tracing::warn;

use crate::navigation::{Navigation, Route};
use crate::notice::{Notice, Outcome};
use crate::store::SessionStore;
use crate::structs::Role;

/// What the profile screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub premium_subscribed: bool,
}

impl ProfileView {
    /// Whether to offer the "Upgrade to Premium" action.
    pub fn can_upgrade(&self) -> bool {
        !self.premium_subscribed && self.role != Role::Supervisor
    }
}

pub struct ProfileController<'a> {
    store: &'a SessionStore,
}

impl<'a> ProfileController<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        Self { store }
    }

    /// Reads the stored session. Called on mount and again whenever the screen regains focus,
    /// so a finished checkout shows up without a restart.
    pub fn load(&self) -> Result<Option<ProfileView>, Outcome> {
        let session = self.store.load().map_err(|err| {
            warn!(error = %err, "error fetching user data");
            Outcome::notice(Notice::error("Error", "Unable to load user profile"))
        })?;

        Ok(session.map(|session| ProfileView {
            name: session
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "User Name".to_string()),
            phone: session
                .phone
                .clone()
                .filter(|phone| !phone.trim().is_empty())
                .unwrap_or_else(|| "Not provided".to_string()),
            email: session.email,
            role: session.role,
            premium_subscribed: session.premium_subscribed,
        }))
    }

    pub fn upgrade(&self) -> Outcome {
        Outcome::navigate(Navigation::Push(Route::Premium))
    }

    /// Clears the session and restarts navigation at the login screen.
    pub fn logout(&self) -> Outcome {
        match self.store.clear() {
            Ok(()) => Outcome::navigate(Navigation::Reset(Route::Login)),
            Err(err) => {
                warn!(error = %err, "error logging out");
                Outcome::notice(Notice::error("Error", "Failed to log out"))
            }
        }
    }
}
