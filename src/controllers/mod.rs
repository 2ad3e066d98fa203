//! Screen controllers. Each one loads what its screen needs, validates input locally and
//! makes exactly one API call per user action, answering with an [`Outcome`](crate::notice::Outcome).

mod auth;
mod catalog;
mod editor;
mod premium;
mod profile;

pub use auth::AuthController;
pub use catalog::{
    load_genre, CatalogSections, HomeController, SearchResults, SeeAllPager, Viewer, HOME_GENRES,
    SEE_ALL_PAGE_SIZE,
};
pub use editor::MovieEditor;
pub use premium::{PlanOption, PremiumController};
pub use profile::{ProfileController, ProfileView};
