use tracing::warn;

use crate::errors::ExplorerError;
use crate::navigation::{Navigation, Route};
use crate::notice::{Notice, Outcome};
use crate::payment::{PaymentFlow, SubscriptionService};
use crate::store::SessionStore;
use crate::structs::PlanType;

/// One card on the premium offer screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOption {
    pub plan: PlanType,
    pub price: &'static str,
    pub features: &'static [&'static str],
    pub popular: bool,
    /// The plan the user last checked out with on this device.
    pub current: bool,
}

const BASIC_FEATURES: &[&str] = &[
    "Basic Features Access",
    "Standard Quality",
    "Ad-free Experience",
    "Single Device Support",
];

const PREMIUM_FEATURES: &[&str] = &[
    "All Basic Features",
    "Premium Quality",
    "Multi-Device Support",
    "Priority Customer Service",
    "Exclusive Content Access",
];

pub struct PremiumController<'a, S: SubscriptionService> {
    service: &'a S,
    store: &'a SessionStore,
}

impl<'a, S: SubscriptionService> PremiumController<'a, S> {
    pub fn new(service: &'a S, store: &'a SessionStore) -> Self {
        Self { service, store }
    }

    pub fn plans(&self) -> Vec<PlanOption> {
        let current = self.store.selected_plan().unwrap_or_else(|err| {
            warn!(error = %err, "could not read selected plan");
            None
        });

        PlanType::ALL
            .into_iter()
            .map(|plan| PlanOption {
                plan,
                price: plan.price(),
                features: if plan.is_popular() {
                    PREMIUM_FEATURES
                } else {
                    BASIC_FEATURES
                },
                popular: plan.is_popular(),
                current: current == Some(plan),
            })
            .collect()
    }

    /// Starts a checkout for `plan` and routes to the payment screen with the intent.
    pub fn subscribe(&self, plan: PlanType) -> Outcome {
        let mut flow = PaymentFlow::new(self.service, self.store);

        match flow.select_plan(plan) {
            Ok(intent) => Outcome::navigate(Navigation::Push(Route::Payment(intent.clone()))),
            Err(err @ ExplorerError::State(_)) => {
                Outcome::notice(Notice::error("Sign In Required", err.to_string()))
                    .then(Navigation::Push(Route::Login))
            }
            Err(err) => {
                warn!(plan = %plan, error = %err, "error in handle payment");
                Outcome::notice(Notice::error("Subscription Failed", err.to_string()))
            }
        }
    }
}
