use tracing::{info, warn};

use crate::errors::ExplorerError;
use crate::forms::{FieldError, LoginForm, SignupForm};
use crate::navigation::{Navigation, Route};
use crate::notice::{Notice, Outcome};
use crate::store::SessionStore;
use crate::structs::client::Client;

/// Sign in, sign up, guest start and device registration.
pub struct AuthController<'a> {
    client: &'a Client,
    store: &'a SessionStore,
}

impl<'a> AuthController<'a> {
    pub fn new(client: &'a Client, store: &'a SessionStore) -> Self {
        Self { client, store }
    }

    /// Validates the form, signs in, persists the session with its confirmed premium flag
    /// and heads to the catalog.
    pub fn login(&self, form: &LoginForm) -> Result<Outcome, Vec<FieldError>> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let session = match self.client.login(form.email.trim(), &form.password) {
            Ok(session) => session,
            Err(ExplorerError::Auth) => {
                return Ok(Outcome::notice(Notice::error(
                    "Login Failed",
                    "Invalid email or password",
                )))
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                return Ok(Outcome::notice(Notice::error("Login Failed", err.to_string())));
            }
        };

        if let Err(err) = self.store.save(&session) {
            warn!(error = %err, "could not persist session");
            return Ok(Outcome::notice(Notice::error("Login Failed", err.to_string())));
        }

        let message = if session.is_supervisor() {
            "Admin login successful"
        } else if session.premium_subscribed {
            "Login successful - premium user"
        } else {
            "Login successful - Free user"
        };

        Ok(Outcome::notice(Notice::success(message, format!("Welcome, {}.", session.display_name())))
            .then(Navigation::Push(Route::Home)))
    }

    /// Creates the account and sends the user to the login screen. A server complaint about the
    /// email is attached to that field; anything else becomes a notice.
    pub fn signup(&self, form: &SignupForm) -> Result<Outcome, Vec<FieldError>> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        match self.client.signup(&form.to_account()) {
            Ok(_) => {
                info!(email = %form.email.trim(), "account created");
                Ok(Outcome::notice(Notice::success(
                    "Signup Successful",
                    "Your account has been created",
                ))
                .then(Navigation::Push(Route::Login)))
            }
            Err(err) => {
                let messages = err.messages();
                if let Some(email_message) = messages.iter().find(|m| m.contains("Email")) {
                    return Err(vec![FieldError::new("email", email_message.clone())]);
                }

                warn!(error = %err, "signup failed");
                Ok(Outcome::notice(Notice::error("Signup Failed", messages.join(", "))))
            }
        }
    }

    /// Splash "Let's Start": forget any session, browse as a guest.
    pub fn start_as_guest(&self) -> Outcome {
        if let Err(err) = self.store.start_guest() {
            warn!(error = %err, "failed to clear the storage");
        }
        Outcome::navigate(Navigation::Replace(Route::Home))
    }

    /// Registers a push device token for the signed-in user.
    pub fn register_device(&self, device_token: &str) -> Outcome {
        let token = match self.store.token() {
            Ok(token) => token,
            Err(err) => return Outcome::notice(Notice::error("Device Registration Failed", err.to_string())),
        };

        match self.client.register_device_token(device_token, token.as_deref()) {
            Ok(()) => Outcome::notice(Notice::success(
                "Notifications Enabled",
                "This device will receive notifications.",
            )),
            Err(err) => {
                warn!(error = %err, "device token registration failed");
                Outcome::notice(Notice::error("Device Registration Failed", err.to_string()))
            }
        }
    }
}
