use serde::{Deserialize, Serialize};

use super::{lenient_opt_string, Movie, Role, SubscriptionStatus};

/// The locally persisted record of the signed-in user.
///
/// The sign-in endpoint returns exactly this shape minus `premiumSubscribed`,
/// which is derived from the subscription status fetched right after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    pub user_id: u64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,

    /// Bearer token for privileged calls. Also stored on its own under the `token` key.
    #[serde(rename = "token")]
    pub auth_token: String,

    /// Mirrors the last server-confirmed subscription status.
    #[serde(rename = "premiumSubscribed", default)]
    pub premium_subscribed: bool,
}

impl Session {
    /// Applies a server-confirmed status to the premium flag.
    pub fn with_status(mut self, status: &SubscriptionStatus) -> Self {
        self.premium_subscribed = status.is_premium();
        self
    }

    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }

    /// Whether this user may open `movie` without being sent to the premium offer.
    pub fn can_watch(&self, movie: &Movie) -> bool {
        !movie.premium || self.premium_subscribed || self.is_supervisor()
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }
}
