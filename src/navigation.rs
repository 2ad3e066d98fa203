use std::fmt;

use crate::structs::{Movie, SubscriptionIntent};

/// Named screens and the typed parameters they receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Splash,
    Login,
    Signup,
    Home,
    Profile,
    Movie(Box<Movie>),
    SeeAll { title: String, movies: Vec<Movie> },
    GenreMovies { genre: String },
    Edit,
    Premium,
    Payment(SubscriptionIntent),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Splash => "SplashScreen",
            Route::Login => "LoginPage",
            Route::Signup => "SignupPage",
            Route::Home => "HomePage",
            Route::Profile => "Profile",
            Route::Movie(_) => "Movie",
            Route::SeeAll { .. } => "SeeAll",
            Route::GenreMovies { .. } => "GenreMovies",
            Route::Edit => "Edit",
            Route::Premium => "Premium",
            Route::Payment(_) => "Payment",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Push(Route),
    /// Swap the current entry, so back navigation skips it.
    Replace(Route),
    /// Drop the whole history and start over at the route.
    Reset(Route),
    Back,
}

impl Navigation {
    pub fn target(&self) -> Option<&Route> {
        match self {
            Navigation::Push(route) | Navigation::Replace(route) | Navigation::Reset(route) => {
                Some(route)
            }
            Navigation::Back => None,
        }
    }
}

/// Navigation history.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Splash)
    }
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    pub fn current(&self) -> &Route {
        // never empty: `Back` keeps the root
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn apply(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::Push(route) => self.stack.push(route),
            Navigation::Replace(route) => {
                self.stack.pop();
                self.stack.push(route);
            }
            Navigation::Reset(route) => {
                self.stack.clear();
                self.stack.push(route);
            }
            Navigation::Back => {
                if self.can_go_back() {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::PlanType;

    #[test]
    fn replace_hides_checkout_from_history() {
        let mut nav = Navigator::new(Route::Home);
        nav.apply(Navigation::Push(Route::Premium));
        nav.apply(Navigation::Push(Route::Payment(SubscriptionIntent {
            plan_type: PlanType::SevenDays,
            checkout_url: "https://checkout.example/cs_1".into(),
            session_id: "cs_1".into(),
        })));

        nav.apply(Navigation::Replace(Route::Home));
        assert_eq!(nav.current(), &Route::Home);

        nav.apply(Navigation::Back);
        assert_eq!(nav.current(), &Route::Premium);
    }

    #[test]
    fn back_never_pops_the_root() {
        let mut nav = Navigator::default();
        nav.apply(Navigation::Back);
        assert_eq!(nav.current(), &Route::Splash);
        assert!(!nav.can_go_back());
    }

    #[test]
    fn reset_starts_over() {
        let mut nav = Navigator::new(Route::Home);
        nav.apply(Navigation::Push(Route::Profile));
        nav.apply(Navigation::Reset(Route::Login));
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.current().name(), "LoginPage");
    }
}
