use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub mod client;
pub mod session;

/// Movie object returned by the catalog endpoints.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub release_year: i32,
    /// Rating out of 10.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: f64,
    #[serde(default)]
    pub director: String,
    /// Running time in minutes.
    #[serde(rename = "duration", default, deserialize_with = "lenient_u32")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub description: String,
    /// Whether the movie is locked behind a premium subscription.
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub main_lead: String,
    #[serde(default)]
    pub streaming_platform: String,
    pub poster_url: Option<String>,
    pub banner_url: Option<String>,
}

/// Editable movie fields sent on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDraft {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub director: String,
    pub duration_minutes: u32,
    pub description: String,
    pub main_lead: String,
    pub streaming_platform: String,
    pub rating: f64,
    pub premium: bool,
}

impl MovieDraft {
    /// Multipart field pairs, keyed the way the catalog service expects them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("movie[title]", self.title.clone()),
            ("movie[genre]", self.genre.clone()),
            ("movie[release_year]", self.release_year.to_string()),
            ("movie[director]", self.director.clone()),
            ("movie[duration]", self.duration_minutes.to_string()),
            ("movie[description]", self.description.clone()),
            ("movie[main_lead]", self.main_lead.clone()),
            ("movie[streaming_platform]", self.streaming_platform.clone()),
            ("movie[rating]", self.rating.to_string()),
            ("movie[premium]", self.premium.to_string()),
        ]
    }
}

/// An image file attached to a movie (poster or banner).
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Reads an image from disk, guessing its mime type from the extension.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "poster".to_string());

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let mime = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        };

        Ok(Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        })
    }
}

/// Account role as reported by the sign-in endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    /// Administrator. May create, update and delete movies and sees premium content.
    Supervisor,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "supervisor" => Role::Supervisor,
            _ => Role::User,
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Supervisor => write!(f, "supervisor"),
        }
    }
}

/// Purchasable subscription plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "1_day")]
    OneDay,
    #[serde(rename = "7_days")]
    SevenDays,
    #[serde(rename = "1_month")]
    OneMonth,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::OneDay, PlanType::SevenDays, PlanType::OneMonth];

    /// Identifier sent to the subscription endpoint and kept in local storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::OneDay => "1_day",
            PlanType::SevenDays => "7_days",
            PlanType::OneMonth => "1_month",
        }
    }

    /// Advertised price in US dollars.
    pub fn price(&self) -> &'static str {
        match self {
            PlanType::OneDay => "9.99",
            PlanType::SevenDays | PlanType::OneMonth => "19.99",
        }
    }

    pub fn is_popular(&self) -> bool {
        !matches!(self, PlanType::OneDay)
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PlanType::ALL
            .into_iter()
            .find(|plan| plan.as_str() == normalized)
            .ok_or_else(|| format!("unknown plan '{}', expected one of 1_day, 7_days, 1_month", s))
    }
}

/// Short-lived checkout tuple produced when a purchase starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionIntent {
    pub plan_type: PlanType,
    pub checkout_url: String,
    /// Opaque checkout session identifier issued by the payment provider.
    pub session_id: String,
}

/// Subscription tier reported by the status endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanTier {
    Premium,
    #[default]
    None,
}

impl From<String> for PlanTier {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("premium") {
            PlanTier::Premium
        } else {
            PlanTier::None
        }
    }
}

impl From<PlanTier> for String {
    fn from(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Premium => "premium".to_string(),
            PlanTier::None => "none".to_string(),
        }
    }
}

/// Subscription status fetched after login and after checkout. Never persisted.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub plan_type: PlanTier,
    pub created_at: Option<String>,
    pub expires_at: Option<String>,
}

impl SubscriptionStatus {
    pub fn premium() -> Self {
        Self {
            plan_type: PlanTier::Premium,
            ..Self::default()
        }
    }

    pub fn is_premium(&self) -> bool {
        self.plan_type == PlanTier::Premium
    }
}

/// Fields posted to the sign-up endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
    pub mobile_number: String,
}

/// User record echoed back by the sign-up endpoint.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupUser {
    pub id: Option<u64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub mobile_number: Option<String>,
}

/// Data returned by the server after a successful sign-up.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupResult {
    pub token: Option<String>,
    pub user: Option<SignupUser>,
}

// The catalog service serializes decimals as strings, so numeric fields accept both.
fn number_from<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    number_from(deserializer)
}

fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let n = number_from(deserializer)?;
    if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
        return Err(de::Error::custom(format!("expected a whole number, got {}", n)));
    }
    Ok(n as i32)
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = number_from(deserializer)?;
    if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
        return Err(de::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            n
        )));
    }
    Ok(n as u32)
}

pub(crate) fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string, got {}",
            other
        ))),
    }
}
