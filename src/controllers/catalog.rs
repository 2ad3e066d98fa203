use tracing::warn;

use crate::navigation::{Navigation, Route};
use crate::notice::{Notice, Outcome};
use crate::store::SessionStore;
use crate::structs::client::Client;
use crate::structs::session::Session;
use crate::structs::Movie;

/// Genres shown as rows on the home screen.
pub const HOME_GENRES: [&str; 5] = ["action", "comedy", "horror", "romance", "sci-fi"];

/// Movies per page on the "see all" screen.
pub const SEE_ALL_PAGE_SIZE: usize = 2;

/// Who is looking at the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Guest,
    Member { premium: bool },
    Supervisor,
}

impl Viewer {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            None => Viewer::Guest,
            Some(session) if session.is_supervisor() => Viewer::Supervisor,
            Some(session) => Viewer::Member {
                premium: session.premium_subscribed,
            },
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Viewer::Supervisor)
    }

    /// Whether a premium lock badge should be drawn on `movie`.
    pub fn sees_lock(&self, movie: &Movie) -> bool {
        movie.premium && matches!(self, Viewer::Member { premium: false } | Viewer::Guest)
    }
}

/// Home screen rows, all cut from one catalog fetch plus one fetch per genre.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSections {
    pub all: Vec<Movie>,
    pub trending: Vec<Movie>,
    pub upcoming: Vec<Movie>,
    pub top_rated: Vec<Movie>,
    pub for_you: Vec<Movie>,
    pub by_genre: Vec<(String, Vec<Movie>)>,
}

impl CatalogSections {
    pub fn from_movies(all: Vec<Movie>) -> Self {
        let slice = |skip: usize, take: usize| -> Vec<Movie> {
            all.iter().skip(skip).take(take).cloned().collect()
        };

        Self {
            trending: slice(0, 5),
            upcoming: slice(5, 5),
            top_rated: slice(0, 10),
            for_you: slice(0, 5),
            by_genre: Vec::new(),
            all,
        }
    }

    /// Titled rows in display order.
    pub fn rows(&self) -> Vec<(&str, &[Movie])> {
        let mut rows: Vec<(&str, &[Movie])> = vec![
            ("Trending", self.trending.as_slice()),
            ("Upcoming", self.upcoming.as_slice()),
            ("Top Rated", self.top_rated.as_slice()),
            ("For You", self.for_you.as_slice()),
        ];
        rows.extend(
            self.by_genre
                .iter()
                .map(|(genre, movies)| (genre.as_str(), movies.as_slice())),
        );
        rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub movies: Vec<Movie>,
}

/// Home screen controller.
pub struct HomeController<'a> {
    client: &'a Client,
    store: &'a SessionStore,
    viewer: Viewer,
    sections: CatalogSections,
    search: Option<SearchResults>,
}

impl<'a> HomeController<'a> {
    pub fn new(client: &'a Client, store: &'a SessionStore) -> Self {
        Self {
            client,
            store,
            viewer: Viewer::Guest,
            sections: CatalogSections::default(),
            search: None,
        }
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn sections(&self) -> &CatalogSections {
        &self.sections
    }

    pub fn search_results(&self) -> Option<&SearchResults> {
        self.search.as_ref()
    }

    /// Reads the viewer from the store and fetches the catalog.
    pub fn load(&mut self) -> Outcome {
        self.identify();
        self.refresh()
    }

    /// Reads the viewer from the store without touching the network.
    pub fn identify(&mut self) -> Viewer {
        self.viewer = match self.store.load() {
            Ok(session) => Viewer::from_session(session.as_ref()),
            Err(err) => {
                warn!(error = %err, "error reading stored session, browsing as guest");
                Viewer::Guest
            }
        };
        self.viewer
    }

    /// Refetches every section from the server.
    pub fn refresh(&mut self) -> Outcome {
        let mut outcome = Outcome::none();

        let all = match self.client.get_all_movies() {
            Ok(movies) => movies,
            Err(err) => {
                warn!(error = %err, "failed to fetch catalog");
                outcome = Outcome::notice(Notice::error("Oops!", "Failed to load movies."));
                Vec::new()
            }
        };

        let mut sections = CatalogSections::from_movies(all);
        sections.by_genre = HOME_GENRES
            .iter()
            .map(|genre| (genre.to_string(), load_genre(self.client, genre)))
            .collect();

        self.sections = sections;
        outcome
    }

    /// Search-as-you-type. One character or less clears the results without a request.
    pub fn search(&mut self, text: &str) -> Outcome {
        let query = text.trim();
        if query.chars().count() <= 1 {
            self.search = None;
            return Outcome::none();
        }

        match self.client.search_movies(query) {
            Ok(movies) if movies.is_empty() => {
                self.search = Some(SearchResults {
                    query: query.to_string(),
                    movies,
                });
                Outcome::notice(Notice::info(
                    "No results",
                    format!("No movies match \"{}\".", query),
                ))
            }
            Ok(movies) => {
                self.search = Some(SearchResults {
                    query: query.to_string(),
                    movies,
                });
                Outcome::none()
            }
            Err(err) => {
                warn!(error = %err, query, "search failed");
                Outcome::notice(Notice::error("Search Failed", err.to_string()))
            }
        }
    }

    /// Opens a movie from a row, gating guests and premium content before the detail fetch.
    pub fn open_movie(&self, movie: &Movie) -> Outcome {
        if let Some(gated) = self.gate(movie.premium) {
            return gated;
        }

        self.fetch_movie(movie.id, |movie| {
            Outcome::navigate(Navigation::Push(Route::Movie(Box::new(movie))))
        })
    }

    /// Opens a movie known only by id. The premium flag comes from the single detail fetch.
    pub fn open_movie_by_id(&self, id: u64) -> Outcome {
        if let Some(gated) = self.gate(false) {
            return gated;
        }

        self.fetch_movie(id, |movie| match self.gate(movie.premium) {
            Some(gated) => gated,
            None => Outcome::navigate(Navigation::Push(Route::Movie(Box::new(movie)))),
        })
    }

    fn gate(&self, premium: bool) -> Option<Outcome> {
        match self.viewer {
            Viewer::Guest => Some(
                Outcome::notice(Notice::info(
                    "Login Required",
                    "Please login to view this movie.",
                ))
                .then(Navigation::Push(Route::Login)),
            ),
            Viewer::Member { premium: false } if premium => Some(
                Outcome::notice(Notice::info(
                    "Premium Content",
                    "Subscribe to watch this movie.",
                ))
                .then(Navigation::Push(Route::Premium)),
            ),
            _ => None,
        }
    }

    fn fetch_movie(&self, id: u64, open: impl FnOnce(Movie) -> Outcome) -> Outcome {
        match self.client.get_movie_by_id(id) {
            Ok(Some(movie)) => open(movie),
            Ok(None) => Outcome::notice(Notice::error("Error", "Failed to fetch movie")),
            Err(err) => {
                warn!(movie_id = id, error = %err, "failed to fetch movie");
                Outcome::notice(Notice::error(
                    "Oops!",
                    "Something went wrong while fetching movie details.",
                ))
            }
        }
    }

    pub fn open_genre(&self, genre: &str) -> Outcome {
        Outcome::navigate(Navigation::Push(Route::GenreMovies {
            genre: genre.to_string(),
        }))
    }

    pub fn see_all(&self, title: &str, movies: &[Movie]) -> Outcome {
        Outcome::navigate(Navigation::Push(Route::SeeAll {
            title: title.to_string(),
            movies: movies.to_vec(),
        }))
    }

    /// Supervisor-only delete. The catalog is refetched afterwards rather than patched locally.
    pub fn delete_movie(&mut self, id: u64) -> Outcome {
        if !self.viewer.is_admin() {
            return Outcome::notice(Notice::error(
                "Not Allowed",
                "Only administrators can delete movies.",
            ));
        }

        let token = self.store.token().unwrap_or_else(|err| {
            warn!(error = %err, "could not read token");
            None
        });

        if !self.client.delete_movie(token.as_deref(), id) {
            return Outcome::notice(Notice::error("Error", "Failed to delete movie"));
        }

        let refreshed = self.refresh();
        if refreshed.is_error() {
            return refreshed;
        }

        // Search results are not refetched; drop the deleted entry so they cannot link to it
        if let Some(results) = self.search.as_mut() {
            results.movies.retain(|movie| movie.id != id);
        }

        Outcome::notice(Notice::success("Deleted", "Movie Deleted Successfully"))
    }
}

/// Genre screen and home rows. A failed fetch yields an empty row.
pub fn load_genre(client: &Client, genre: &str) -> Vec<Movie> {
    client.get_movies_by_genre(genre).unwrap_or_else(|err| {
        warn!(genre, error = %err, "error fetching movies for genre");
        Vec::new()
    })
}

/// Client-side pager for the "see all" screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SeeAllPager {
    movies: Vec<Movie>,
    page: usize,
}

impl SeeAllPager {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies, page: 1 }
    }

    /// 1-based.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.movies.len().div_ceil(SEE_ALL_PAGE_SIZE)
    }

    pub fn current(&self) -> &[Movie] {
        let start = (self.page - 1) * SEE_ALL_PAGE_SIZE;
        let end = (start + SEE_ALL_PAGE_SIZE).min(self.movies.len());
        self.movies.get(start..end).unwrap_or(&[])
    }

    pub fn next(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }
}
