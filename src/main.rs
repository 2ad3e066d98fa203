//! Movie Explorer terminal front end.
//!
//! Each subcommand stands in for one screen action: it builds the matching controller,
//! runs the action and prints the resulting notice and navigation.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colorful::{Color, Colorful};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_explorer::config::{Config, Overrides};
use movie_explorer::controllers::{
    load_genre, AuthController, HomeController, MovieEditor, PremiumController, ProfileController,
    SeeAllPager, Viewer,
};
use movie_explorer::forms::{FieldError, LoginForm, MovieForm, SignupForm};
use movie_explorer::navigation::{Navigation, Navigator, Route};
use movie_explorer::notice::{Notice, NoticeKind, Outcome};
use movie_explorer::payment::PaymentFlow;
use movie_explorer::store::SessionStore;
use movie_explorer::{Client, Movie, PlanType};

#[derive(Parser)]
#[command(name = "movie-explorer", version, about = "Browse the Movie Explorer catalog")]
struct Cli {
    /// API base URL (overrides MOVIE_EXPLORER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides MOVIE_EXPLORER_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log requests and state changes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forget any session and browse as a guest
    Start,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        /// Full name, split into first and last name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
    },
    Logout,
    Profile,
    /// Show the home screen rows
    Home,
    Genre {
        genre: String,
    },
    Search {
        query: String,
    },
    /// Open one movie
    Movie {
        id: u64,
    },
    /// Page through one home row, two movies at a time
    SeeAll {
        /// Row title, e.g. "Trending" or "action"
        row: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Add a movie (supervisors only)
    Add(MovieFields),
    /// Edit a movie (supervisors only). Omitted fields keep their current value.
    Update {
        id: u64,
        #[command(flatten)]
        fields: MovieFields,
    },
    /// Delete a movie (supervisors only)
    Delete {
        id: u64,
    },
    Plans,
    /// Start a checkout and follow the redirects pasted on stdin
    Subscribe {
        /// 1_day, 7_days or 1_month
        plan: PlanType,
        /// Print the checkout URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    RegisterDevice {
        token: String,
    },
}

#[derive(Args, Default)]
struct MovieFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    release_year: Option<String>,
    #[arg(long)]
    director: Option<String>,
    /// Minutes
    #[arg(long)]
    duration: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    main_lead: Option<String>,
    #[arg(long)]
    streaming_platform: Option<String>,
    #[arg(long)]
    rating: Option<String>,
    #[arg(long)]
    premium: Option<bool>,
    #[arg(long)]
    poster: Option<PathBuf>,
    #[arg(long)]
    banner: Option<PathBuf>,
}

impl MovieFields {
    fn apply(self, form: &mut MovieForm) {
        let texts = [
            (self.title, &mut form.title),
            (self.genre, &mut form.genre),
            (self.release_year, &mut form.release_year),
            (self.director, &mut form.director),
            (self.duration, &mut form.duration),
            (self.description, &mut form.description),
            (self.main_lead, &mut form.main_lead),
            (self.streaming_platform, &mut form.streaming_platform),
            (self.rating, &mut form.rating),
        ];
        for (value, slot) in texts {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(premium) = self.premium {
            form.premium = premium;
        }
        if self.poster.is_some() {
            form.poster = self.poster;
        }
        if self.banner.is_some() {
            form.banner = self.banner;
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Quiet by default, RUST_LOG refines it
    let default_filter = if cli.verbose { "debug" } else { "error" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(Overrides {
        api_url: cli.api_url,
        store_path: cli.store,
    })?;

    let client = Client::new(config.client_options())?;
    let store = SessionStore::file(&config.store_path);

    let ok = run(cli.command, &client, &store)?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs one command. Returns `false` when the action ended in an error notice or invalid input.
fn run(command: Commands, client: &Client, store: &SessionStore) -> anyhow::Result<bool> {
    let mut nav = navigator_for(&command);

    let ok = match command {
        Commands::Start => render(&mut nav, AuthController::new(client, store).start_as_guest()),
        Commands::Login { email, password } => {
            match AuthController::new(client, store).login(&LoginForm { email, password }) {
                Ok(outcome) => render(&mut nav, outcome),
                Err(errors) => render_field_errors(&errors),
            }
        }
        Commands::Signup {
            name,
            email,
            password,
            phone,
        } => {
            let form = SignupForm {
                full_name: name,
                email,
                password,
                phone,
            };
            match AuthController::new(client, store).signup(&form) {
                Ok(outcome) => render(&mut nav, outcome),
                Err(errors) => render_field_errors(&errors),
            }
        }
        Commands::Logout => render(&mut nav, ProfileController::new(store).logout()),
        Commands::Profile => match ProfileController::new(store).load() {
            Ok(Some(view)) => {
                println!(
                    "{}",
                    view.name.as_str().gradient_with_color(Color::Cyan, Color::SpringGreen4)
                );
                println!("  email    {}", view.email);
                println!("  phone    {}", view.phone);
                println!("  role     {}", view.role);
                println!(
                    "  plan     {}",
                    if view.premium_subscribed { "Premium" } else { "Free" }
                );
                if view.can_upgrade() {
                    println!("  {}", "Run `subscribe <plan>` to upgrade".color(Color::Yellow));
                }
                true
            }
            Ok(None) => render(
                &mut nav,
                Outcome::notice(Notice::info("Not signed in", "Log in to see your profile."))
                    .then(Navigation::Push(Route::Login)),
            ),
            Err(outcome) => render(&mut nav, outcome),
        },
        Commands::Home => {
            let mut home = HomeController::new(client, store);
            let outcome = home.load();
            let viewer = home.viewer();
            for (title, movies) in home.sections().rows() {
                print_row(title, movies, viewer);
            }
            render(&mut nav, outcome)
        }
        Commands::Genre { genre } => {
            let viewer = HomeController::new(client, store).identify();
            print_row(&genre, &load_genre(client, &genre), viewer);
            true
        }
        Commands::Search { query } => {
            let mut home = HomeController::new(client, store);
            let viewer = home.identify();
            let outcome = home.search(&query);
            if let Some(results) = home.search_results() {
                print_row(&format!("Results for \"{}\"", results.query), &results.movies, viewer);
            }
            render(&mut nav, outcome)
        }
        Commands::Movie { id } => {
            let mut home = HomeController::new(client, store);
            home.identify();
            let outcome = home.open_movie_by_id(id);
            if let Some(Navigation::Push(Route::Movie(movie))) = &outcome.navigation {
                print_movie_details(movie);
            }
            render(&mut nav, outcome)
        }
        Commands::SeeAll { row, page } => {
            let mut home = HomeController::new(client, store);
            let outcome = home.load();
            let viewer = home.viewer();

            let movies = home
                .sections()
                .rows()
                .into_iter()
                .find(|(title, _)| title.eq_ignore_ascii_case(&row))
                .map(|(_, movies)| movies.to_vec());

            match movies {
                Some(movies) => {
                    let mut pager = SeeAllPager::new(movies);
                    while pager.page() < page && pager.next() {}
                    print_row(
                        &format!("{} (page {} of {})", row, pager.page(), pager.total_pages()),
                        pager.current(),
                        viewer,
                    );
                    render(&mut nav, outcome)
                }
                None => render(
                    &mut nav,
                    Outcome::notice(Notice::error(
                        "Unknown row",
                        format!("No home row is called \"{}\".", row),
                    )),
                ),
            }
        }
        Commands::Add(fields) => {
            let mut form = MovieForm::default();
            fields.apply(&mut form);
            match MovieEditor::new(client, store).create(&form) {
                Ok(outcome) => render(&mut nav, outcome),
                Err(errors) => render_field_errors(&errors),
            }
        }
        Commands::Update { id, fields } => {
            let editor = MovieEditor::new(client, store);
            match editor.load_for_update(id) {
                Ok(mut form) => {
                    fields.apply(&mut form);
                    match editor.update(id, &form) {
                        Ok(outcome) => render(&mut nav, outcome),
                        Err(errors) => render_field_errors(&errors),
                    }
                }
                Err(outcome) => render(&mut nav, outcome),
            }
        }
        Commands::Delete { id } => {
            let mut home = HomeController::new(client, store);
            home.identify();
            render(&mut nav, home.delete_movie(id))
        }
        Commands::Plans => {
            for option in PremiumController::new(client, store).plans() {
                let mut heading = format!("{:<8} {}", option.plan, option.price);
                if option.popular {
                    heading.push_str("  most popular");
                }
                if option.current {
                    heading.push_str("  (current)");
                }
                println!("{}", heading.as_str().gradient_with_color(Color::Cyan, Color::SpringGreen4));
                for feature in option.features {
                    println!("    - {}", feature);
                }
            }
            true
        }
        Commands::Subscribe { plan, no_browser } => {
            let outcome = PremiumController::new(client, store).subscribe(plan);
            let intent = match &outcome.navigation {
                Some(Navigation::Push(Route::Payment(intent))) => Some(intent.clone()),
                _ => None,
            };
            let Some(intent) = intent else {
                return Ok(render(&mut nav, outcome));
            };
            render(&mut nav, outcome);

            println!("Checkout: {}", intent.checkout_url.as_str().color(Color::Blue));
            if !no_browser {
                if let Err(err) = open::that(&intent.checkout_url) {
                    warn!(error = %err, "could not open a browser");
                }
            }
            println!("Paste each URL the checkout page lands on. Ctrl-D to stop.");

            follow_checkout(PaymentFlow::resume(client, store, intent), &mut nav)?
        }
        Commands::RegisterDevice { token } => {
            render(&mut nav, AuthController::new(client, store).register_device(&token))
        }
    };

    Ok(ok)
}

fn follow_checkout(mut flow: PaymentFlow<'_, Client>, nav: &mut Navigator) -> anyhow::Result<bool> {
    let mut ok = false;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }

        if let Some(outcome) = flow.observe(url) {
            ok = render(nav, outcome);
        }
        if flow.state().is_settled() {
            return Ok(ok);
        }
    }

    println!("Checkout left in state {:?}.", flow.state());
    Ok(ok)
}

/// The history a command starts from: the screen it stands in for, above Home.
fn navigator_for(command: &Commands) -> Navigator {
    let screen = match command {
        Commands::Start => return Navigator::new(Route::Splash),
        Commands::Login { .. } => Route::Login,
        Commands::Signup { .. } => Route::Signup,
        Commands::Logout | Commands::Profile => Route::Profile,
        Commands::Genre { genre } => Route::GenreMovies {
            genre: genre.clone(),
        },
        Commands::Add(_) | Commands::Update { .. } => Route::Edit,
        Commands::Plans | Commands::Subscribe { .. } => Route::Premium,
        _ => return Navigator::new(Route::Home),
    };

    let mut nav = Navigator::new(Route::Home);
    nav.apply(Navigation::Push(screen));
    nav
}

/// Prints a notice, applies the navigation and prints where it landed.
/// Returns `false` for error notices.
fn render(nav: &mut Navigator, outcome: Outcome) -> bool {
    if let Some(notice) = &outcome.notice {
        print_notice(notice);
    }

    let ok = !outcome.is_error();
    if let Some(navigation) = outcome.navigation {
        let arrow = if navigation == Navigation::Back { "<-" } else { "->" };
        nav.apply(navigation);
        println!("{} {}", arrow.color(Color::Blue), nav.current());
    }

    ok
}

fn render_field_errors(errors: &[FieldError]) -> bool {
    for error in errors {
        let label = format!("{}:", error.field);
        println!("{} {}", label.as_str().color(Color::Red), error.message);
    }
    false
}

fn print_notice(notice: &Notice) {
    let title = notice.title.as_str();
    let title = match notice.kind {
        NoticeKind::Success => title.gradient_with_color(Color::SpringGreen4, Color::Cyan).to_string(),
        NoticeKind::Info => title.color(Color::Cyan).to_string(),
        NoticeKind::Error => title.color(Color::Red).bold().to_string(),
    };

    if notice.message.is_empty() {
        println!("{}", title);
    } else {
        println!("{} {}", title, notice.message);
    }
}

fn print_row(title: &str, movies: &[Movie], viewer: Viewer) {
    println!("{}", title.gradient_with_color(Color::Cyan, Color::SpringGreen4));
    if movies.is_empty() {
        println!("    (nothing here)");
    }
    for movie in movies {
        let lock = if viewer.sees_lock(movie) { " [premium]" } else { "" };
        println!(
            "  {:>5}  {} ({})  {:.1}{}",
            movie.id, movie.title, movie.release_year, movie.rating, lock
        );
    }
}

fn print_movie_details(movie: &Movie) {
    println!("{}", movie.title.as_str().gradient_with_color(Color::Cyan, Color::SpringGreen4));
    println!(
        "  {} | {} | {} min | {:.1}/10",
        movie.genre, movie.release_year, movie.duration_minutes, movie.rating
    );
    println!("  Directed by {}, starring {}", movie.director, movie.main_lead);
    println!("  Streaming on {}", movie.streaming_platform);
    if !movie.description.is_empty() {
        println!("\n  {}", movie.description);
    }
}
