use super::session::Session;
use super::{
    Movie, MovieDraft, NewAccount, PlanType, SignupResult, SubscriptionIntent, SubscriptionStatus,
    Upload,
};
use crate::errors::{ExplorerError, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Default host of the Movie Explorer REST API.
pub const DEFAULT_BASE_URL: &str = "https://movie-explorer-ror-agrim.onrender.com";

/// Movie Explorer client. Used to interact with the catalog, account and subscription endpoints.
///
/// Every call is fire-once: no retries, no backoff. Callers surface failures and let the user retry.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::blocking::Client,
}

/// Client options. Pass this into the `new()` function of the client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the API, e.g. "https://movie-explorer-ror-agrim.onrender.com".
    pub base_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// How a subscription status lookup identifies the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusQuery<'a> {
    /// Status of a finished checkout, identified by the provider's session id.
    CheckoutSession(&'a str),
    /// Status of the account owning the bearer token.
    Account(&'a str),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MovieListBody {
    Bare(Vec<Movie>),
    Envelope {
        #[serde(default)]
        movies: Vec<Movie>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MovieBody {
    Wrapped { movie: Movie },
    Bare(Movie),
}

impl Client {
    /// Creates a new client.
    pub fn new(options: ClientOptions) -> Result<Self> {
        // Verify that the base URL is usable before any request goes out
        let base_url = Url::parse(options.base_url.trim())
            .map_err(|err| ExplorerError::InvalidBaseUrl(format!("{}: {}", options.base_url, err)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ExplorerError::InvalidBaseUrl(options.base_url));
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("movie-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ExplorerError::Config(err.to_string()))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Signs in and returns the account record. The premium flag is left unset.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let body = json!({ "user": { "email": email, "password": password } });
        let request = self.request(Method::POST, "/api/v1/users/sign_in")?.json(&body);

        self.send_json::<Session>(request)
    }

    /// Signs in, then fetches the subscription status to populate `premium_subscribed`.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.sign_in(email, password)?;

        let status = self.get_subscription_status(StatusQuery::Account(&session.auth_token))?;
        let session = session.with_status(&status);

        info!(
            user_id = session.user_id,
            role = %session.role,
            premium = session.premium_subscribed,
            "signed in"
        );

        Ok(session)
    }

    /// Creates an account. Server-side validation messages come back verbatim
    /// as `ExplorerError::Validation`.
    pub fn signup(&self, account: &NewAccount) -> Result<SignupResult> {
        let request = self
            .request(Method::POST, "/api/v1/users")?
            .json(&json!({ "user": account }));

        self.send_json(request)
    }

    pub fn get_all_movies(&self) -> Result<Vec<Movie>> {
        self.list_movies(&[])
    }

    pub fn get_movies_by_genre(&self, genre: &str) -> Result<Vec<Movie>> {
        self.list_movies(&[("genre", genre)])
    }

    /// Title search. Matching is done server-side on fragments of the title.
    pub fn search_movies(&self, title_fragment: &str) -> Result<Vec<Movie>> {
        self.list_movies(&[("title", title_fragment)])
    }

    /// Fetches one movie. A 404 is reported as `Ok(None)`.
    pub fn get_movie_by_id(&self, id: u64) -> Result<Option<Movie>> {
        let request = self.request(Method::GET, &format!("/api/v1/movies/{}", id))?;

        match self.send_json::<MovieBody>(request) {
            Ok(MovieBody::Wrapped { movie }) | Ok(MovieBody::Bare(movie)) => Ok(Some(movie)),
            Err(ExplorerError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Creates a movie with its poster. Fails closed: a missing token or any
    /// failure is logged and reported as `None`.
    pub fn create_movie(
        &self,
        token: Option<&str>,
        draft: &MovieDraft,
        poster: &Upload,
    ) -> Option<Movie> {
        let result = (|| -> Result<Movie> {
            let token = token.ok_or_else(ExplorerError::missing_token)?;

            let form = Self::movie_form(draft).part("movie[poster]", Self::file_part(poster)?);
            let request = self
                .request(Method::POST, "/api/v1/movies")?
                .bearer_auth(token)
                .multipart(form);

            match self.send_json::<MovieBody>(request)? {
                MovieBody::Wrapped { movie } | MovieBody::Bare(movie) => Ok(movie),
            }
        })();

        match result {
            Ok(movie) => {
                info!(movie_id = movie.id, title = %movie.title, "movie created");
                Some(movie)
            }
            Err(err) => {
                warn!(error = %err, "failed to create movie");
                None
            }
        }
    }

    /// Updates a movie, optionally replacing its poster and banner. Fails closed.
    pub fn update_movie(
        &self,
        token: Option<&str>,
        id: u64,
        draft: &MovieDraft,
        poster: Option<&Upload>,
        banner: Option<&Upload>,
    ) -> bool {
        let result = (|| -> Result<()> {
            let token = token.ok_or_else(ExplorerError::missing_token)?;

            let mut form = Self::movie_form(draft);
            if let Some(poster) = poster {
                form = form.part("movie[poster]", Self::file_part(poster)?);
            }
            if let Some(banner) = banner {
                form = form.part("movie[banner]", Self::file_part(banner)?);
            }

            let request = self
                .request(Method::PATCH, &format!("/api/v1/movies/{}", id))?
                .bearer_auth(token)
                .multipart(form);

            self.send_unit(request)
        })();

        match result {
            Ok(()) => {
                info!(movie_id = id, "movie updated");
                true
            }
            Err(err) => {
                warn!(movie_id = id, error = %err, "failed to update movie");
                false
            }
        }
    }

    /// Deletes a movie. Fails closed.
    pub fn delete_movie(&self, token: Option<&str>, id: u64) -> bool {
        let result = (|| -> Result<()> {
            let token = token.ok_or_else(ExplorerError::missing_token)?;
            let request = self
                .request(Method::DELETE, &format!("/api/v1/movies/{}", id))?
                .bearer_auth(token);

            self.send_unit(request)
        })();

        match result {
            Ok(()) => {
                info!(movie_id = id, "movie deleted");
                true
            }
            Err(err) => {
                warn!(movie_id = id, error = %err, "failed to delete movie");
                false
            }
        }
    }

    /// Requests a checkout URL and session id for `plan`.
    pub fn create_subscription(
        &self,
        plan: PlanType,
        token: Option<&str>,
    ) -> Result<SubscriptionIntent> {
        let token = token.ok_or_else(ExplorerError::missing_token)?;

        let request = self
            .request(Method::POST, "/api/v1/subscriptions")?
            .bearer_auth(token)
            .json(&json!({ "plan_type": plan }));

        let data = self.send_json::<Value>(request)?;
        Self::reject_error_body(&data)?;

        // The checkout URL has shipped under a few different keys
        let checkout_url = data
            .get("url")
            .or_else(|| data.get("checkoutUrl"))
            .or_else(|| data.pointer("/data/checkoutUrl"))
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExplorerError::Decode("No checkout URL returned from server.".into()))?;

        let session_id = data
            .get("session_id")
            .or_else(|| data.get("sessionId"))
            .or_else(|| data.pointer("/data/session_id"))
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ExplorerError::Decode("No checkout session returned from server.".into()))?;

        debug!(plan = %plan, session_id, "checkout session created");

        Ok(SubscriptionIntent {
            plan_type: plan,
            checkout_url: checkout_url.to_string(),
            session_id: session_id.to_string(),
        })
    }

    /// Fetches the subscription status, either for a finished checkout or for the token's account.
    pub fn get_subscription_status(&self, query: StatusQuery<'_>) -> Result<SubscriptionStatus> {
        let request = match query {
            StatusQuery::CheckoutSession(session_id) => {
                let mut url = self.endpoint("/api/v1/subscriptions/success")?;
                url.query_pairs_mut().append_pair("session_id", session_id);
                self.http.get(url).header(reqwest::header::ACCEPT, "application/json")
            }
            StatusQuery::Account(token) => {
                if token.is_empty() {
                    return Err(ExplorerError::missing_token());
                }
                self.request(Method::GET, "/api/v1/subscriptions/status")?
                    .bearer_auth(token)
            }
        };

        let data = self.send_json::<Value>(request)?;
        Self::reject_error_body(&data)?;

        let subscription = data.get("subscription").unwrap_or(&data);
        if subscription.get("plan_type").is_some() {
            return Ok(serde_json::from_value(subscription.clone())?);
        }

        match query {
            // A 2xx from the checkout endpoint is the server's confirmation
            StatusQuery::CheckoutSession(_) => Ok(SubscriptionStatus::premium()),
            StatusQuery::Account(_) => Err(ExplorerError::Decode(
                "subscription status is missing plan_type".into(),
            )),
        }
    }

    /// Registers a push-notification device token with the backend.
    pub fn register_device_token(&self, device_token: &str, auth_token: Option<&str>) -> Result<()> {
        let auth_token = auth_token
            .filter(|token| !token.is_empty())
            .ok_or_else(ExplorerError::missing_token)?;

        let request = self
            .request(Method::POST, "/api/v1/users/update_device_token")?
            .bearer_auth(auth_token)
            .json(&json!({ "device_token": device_token }));

        self.send_unit(request)
    }

    fn list_movies(&self, params: &[(&str, &str)]) -> Result<Vec<Movie>> {
        let mut url = self.endpoint("/api/v1/movies")?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");

        match self.send_json::<MovieListBody>(request)? {
            MovieListBody::Bare(movies) | MovieListBody::Envelope { movies } => Ok(movies),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Append a / to path if it does not start with one
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        self.base_url
            .join(&path)
            .map_err(|err| ExplorerError::InvalidBaseUrl(err.to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;

        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    fn movie_form(draft: &MovieDraft) -> Form {
        draft
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
    }

    fn file_part(upload: &Upload) -> Result<Part> {
        Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|err| ExplorerError::Validation(vec![format!("Invalid image type: {}", err)]))
    }

    /// Send the request and parse a successful body into `T`.
    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request)?;
        let body = response.text()?;

        serde_json::from_str::<T>(&body).map_err(|err| ExplorerError::Decode(err.to_string()))
    }

    /// Send the request and discard the body.
    fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        self.execute(request).map(|_| ())
    }

    fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        debug!(method = %request.method(), path = request.url().path(), "sending request");

        let response = self.http.execute(request)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let err = Self::status_error(status, &body);
        debug!(status = status.as_u16(), error = %err, "request rejected");

        Err(err)
    }

    fn status_error(status: StatusCode, body: &str) -> ExplorerError {
        let messages = error_messages(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExplorerError::Auth,
            StatusCode::NOT_FOUND => ExplorerError::NotFound(
                messages
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "Resource".to_string()),
            ),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                if messages.is_empty() {
                    ExplorerError::Validation(vec![status.to_string()])
                } else {
                    ExplorerError::Validation(messages)
                }
            }
            _ if messages.is_empty() => ExplorerError::Network(status.to_string()),
            _ => ExplorerError::Network(format!("{}: {}", status, messages.join(", "))),
        }
    }

    /// Some endpoints answer 2xx with `{"error": "..."}`.
    fn reject_error_body(data: &Value) -> Result<()> {
        match data.get("error").and_then(|v| v.as_str()) {
            Some(message) => Err(ExplorerError::Network(message.to_string())),
            None => Ok(()),
        }
    }
}

/// Pulls human-readable messages out of an error body.
/// Handles `errors` as a string, a list, or a field map, plus `error` and `message`.
fn error_messages(body: &str) -> Vec<String> {
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() || trimmed.starts_with('<') {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    };

    let mut messages = Vec::new();

    match data.get("errors") {
        Some(Value::String(message)) => messages.push(message.clone()),
        Some(Value::Array(items)) => {
            messages.extend(items.iter().filter_map(|v| v.as_str()).map(str::to_string))
        }
        Some(Value::Object(fields)) => {
            for (field, value) in fields {
                let field_messages: Vec<&str> = match value {
                    Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
                    Value::String(message) => vec![message.as_str()],
                    _ => Vec::new(),
                };
                messages.extend(
                    field_messages
                        .into_iter()
                        .map(|message| format!("{} {}", capitalize(field), message)),
                );
            }
        }
        _ => {}
    }

    for key in ["error", "message"] {
        if let Some(message) = data.get(key).and_then(|v| v.as_str()) {
            messages.push(message.to_string());
        }
    }

    messages
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}
