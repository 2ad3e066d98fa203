//! Subscription checkout and reconciliation.
//!
//! ```text
//! Selecting ──select_plan──▶ AwaitingCheckout ──success redirect──▶ Reconciling ──▶ Confirmed
//!                                  │                                     │
//!                                  └──cancel redirect──▶ Cancelled        └──▶ Failed
//! ```
//!
//! The checkout page is hosted by the payment provider. The only signal it gives back is the
//! URL it navigates to, so every navigation observed in the embedded browser is fed to
//! [`PaymentFlow::observe`].

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::errors::{ExplorerError, Result};
use crate::navigation::{Navigation, Route};
use crate::notice::{Notice, Outcome};
use crate::store::SessionStore;
use crate::structs::client::{Client, StatusQuery};
use crate::structs::{PlanType, SubscriptionIntent, SubscriptionStatus};

/// The subscription half of the API, split out so the flow can run against a test double.
pub trait SubscriptionService {
    fn create_subscription(
        &self,
        plan: PlanType,
        token: Option<&str>,
    ) -> Result<SubscriptionIntent>;

    fn get_subscription_status(&self, query: StatusQuery<'_>) -> Result<SubscriptionStatus>;
}

impl SubscriptionService for Client {
    fn create_subscription(
        &self,
        plan: PlanType,
        token: Option<&str>,
    ) -> Result<SubscriptionIntent> {
        Client::create_subscription(self, plan, token)
    }

    fn get_subscription_status(&self, query: StatusQuery<'_>) -> Result<SubscriptionStatus> {
        Client::get_subscription_status(self, query)
    }
}

/// Classification of a URL reached inside the checkout view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Success,
    Cancel,
    Ignored,
}

/// Matches provider redirects on path segments rather than raw substrings.
///
/// A segment counts when the last word of its stem (extension dropped, words split on `-` and `_`)
/// is a success or cancel word. `https://shop.example/payment-success?session_id=cs_1`,
/// `/success.html` and `/checkout/cancelled` all match; `https://shop.example/success-stories`,
/// `/pay?next=cancel` or a success URL carrying another session id do not.
pub fn classify_redirect(url: &str, session_id: &str) -> Redirect {
    let Ok(parsed) = Url::parse(url) else {
        return Redirect::Ignored;
    };

    let has_segment = |words: &[&str]| {
        parsed
            .path_segments()
            .map(|mut segments| {
                segments.any(|segment| {
                    let word = last_word(segment).to_ascii_lowercase();
                    words.contains(&word.as_str())
                })
            })
            .unwrap_or(false)
    };

    if has_segment(&SUCCESS_WORDS) {
        let reported = parsed
            .query_pairs()
            .find(|(key, _)| key == "session_id")
            .map(|(_, value)| value.into_owned());

        return match reported {
            Some(reported) if reported != session_id => {
                warn!(expected = session_id, reported = %reported, "success redirect for another checkout session");
                Redirect::Ignored
            }
            _ => Redirect::Success,
        };
    }

    if has_segment(&CANCEL_WORDS) {
        return Redirect::Cancel;
    }

    Redirect::Ignored
}

const SUCCESS_WORDS: [&str; 3] = ["success", "succeeded", "successful"];
const CANCEL_WORDS: [&str; 3] = ["cancel", "cancelled", "canceled"];

fn last_word(segment: &str) -> &str {
    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };
    stem.rsplit(|c| c == '-' || c == '_').next().unwrap_or(stem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentFailure {
    /// No stored session to attach the subscription to. The user must log in again.
    SessionMissing,
    /// The status call failed or did not confirm a premium plan.
    Verification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Selecting,
    AwaitingCheckout,
    Reconciling,
    Confirmed,
    Cancelled,
    Failed(PaymentFailure),
}

impl PaymentState {
    /// Whether further redirects can still change the outcome.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            PaymentState::Confirmed
                | PaymentState::Cancelled
                | PaymentState::Failed(PaymentFailure::SessionMissing)
        )
    }
}

/// One purchase attempt, from plan selection to a settled state.
pub struct PaymentFlow<'a, S: SubscriptionService> {
    service: &'a S,
    store: &'a SessionStore,
    intent: Option<SubscriptionIntent>,
    state: PaymentState,
}

impl<'a, S: SubscriptionService> PaymentFlow<'a, S> {
    pub fn new(service: &'a S, store: &'a SessionStore) -> Self {
        Self {
            service,
            store,
            intent: None,
            state: PaymentState::Selecting,
        }
    }

    /// Picks up a checkout that was started elsewhere (the payment screen receives the intent
    /// as a route parameter).
    pub fn resume(service: &'a S, store: &'a SessionStore, intent: SubscriptionIntent) -> Self {
        Self {
            service,
            store,
            intent: Some(intent),
            state: PaymentState::AwaitingCheckout,
        }
    }

    pub fn state(&self) -> PaymentState {
        self.state
    }

    pub fn intent(&self) -> Option<&SubscriptionIntent> {
        self.intent.as_ref()
    }

    /// Requests a checkout for `plan`. Requires a stored token; the plan is remembered
    /// only once the server has handed out a checkout URL.
    pub fn select_plan(&mut self, plan: PlanType) -> Result<&SubscriptionIntent> {
        if self.state != PaymentState::Selecting {
            return Err(ExplorerError::State(format!(
                "A checkout is already {:?}.",
                self.state
            )));
        }

        let token = self.store.token()?.ok_or_else(ExplorerError::missing_token)?;
        let intent = self.service.create_subscription(plan, Some(&token))?;
        self.store.set_selected_plan(plan)?;

        info!(plan = %plan, session_id = %intent.session_id, "awaiting checkout");
        self.state = PaymentState::AwaitingCheckout;
        Ok(self.intent.insert(intent))
    }

    /// Feeds one navigation event from the checkout view. Returns an outcome when the
    /// state changed, `None` when the URL was ignored.
    pub fn observe(&mut self, url: &str) -> Option<Outcome> {
        let intent = self.intent.as_ref()?;
        let redirect = classify_redirect(url, &intent.session_id);

        match (self.state, redirect) {
            (_, Redirect::Ignored) => None,
            // The checkout view stays open after a failed verification
            (PaymentState::AwaitingCheckout, Redirect::Cancel)
            | (PaymentState::Failed(PaymentFailure::Verification), Redirect::Cancel) => {
                info!(session_id = %intent.session_id, "checkout cancelled");
                self.state = PaymentState::Cancelled;
                Some(
                    Outcome::notice(Notice::info("Payment Cancelled", "Your payment was cancelled."))
                        .then(Navigation::Push(Route::Home)),
                )
            }
            (PaymentState::AwaitingCheckout, Redirect::Success)
            | (PaymentState::Failed(PaymentFailure::Verification), Redirect::Success) => {
                Some(self.reconcile())
            }
            (state, redirect) => {
                debug!(?state, ?redirect, url, "redirect ignored in current state");
                None
            }
        }
    }

    fn reconcile(&mut self) -> Outcome {
        self.state = PaymentState::Reconciling;

        let Some(session_id) = self.intent.as_ref().map(|intent| intent.session_id.clone()) else {
            return self.fail(PaymentFailure::Verification, "Payment verification failed. Please try again.");
        };

        let status = match self
            .service
            .get_subscription_status(StatusQuery::CheckoutSession(&session_id))
        {
            Ok(status) => status,
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "subscription verification failed");
                return self.fail(
                    PaymentFailure::Verification,
                    "An error occurred while verifying your payment.",
                );
            }
        };

        if !status.is_premium() {
            warn!(session_id = %session_id, "checkout did not confirm a premium plan");
            return self.fail(
                PaymentFailure::Verification,
                "Payment verification failed. Please try again.",
            );
        }

        let session = match self.store.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!("no stored session to attach the subscription to");
                return self
                    .fail(PaymentFailure::SessionMissing, "User data not found. Please log in again.")
                    .then(Navigation::Replace(Route::Login));
            }
            Err(err) => {
                warn!(error = %err, "could not read stored session");
                return self.fail(
                    PaymentFailure::Verification,
                    "An error occurred while verifying your payment.",
                );
            }
        };

        if !session.premium_subscribed {
            let mut session = session;
            session.premium_subscribed = true;
            if let Err(err) = self.store.save(&session) {
                warn!(error = %err, "could not persist premium flag");
                return self.fail(
                    PaymentFailure::Verification,
                    "An error occurred while verifying your payment.",
                );
            }
        }

        info!(session_id = %session_id, "premium subscription activated");
        self.state = PaymentState::Confirmed;

        Outcome::notice(Notice::success(
            "Premium Activated",
            "Your premium subscription is now active.",
        ))
        .then(Navigation::Replace(Route::Home))
    }

    fn fail(&mut self, failure: PaymentFailure, message: &str) -> Outcome {
        self.state = PaymentState::Failed(failure);
        Outcome::notice(Notice::error("Error", message))
    }
}
