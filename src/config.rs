use std::env;
use std::path::PathBuf;

use crate::errors::{ExplorerError, Result};
use crate::structs::client::{ClientOptions, DEFAULT_BASE_URL};

pub const API_URL_VAR: &str = "MOVIE_EXPLORER_API_URL";
pub const STORE_PATH_VAR: &str = "MOVIE_EXPLORER_STORE";

/// Runtime settings for the terminal front end.
///
/// Resolved in order: built-in defaults, a `.env` file, process environment, then command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub store_path: PathBuf,
}

/// Values given on the command line. `None` keeps whatever the environment said.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::resolve(
            env::var(API_URL_VAR).ok(),
            env::var(STORE_PATH_VAR).ok().map(PathBuf::from),
            env::var_os("HOME").map(PathBuf::from),
        )
    }

    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(api_url) = overrides.api_url {
            config.api_url = api_url;
        }
        if let Some(store_path) = overrides.store_path {
            config.store_path = store_path;
        }

        Ok(config)
    }

    fn resolve(
        api_url: Option<String>,
        store_path: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        let api_url = api_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if api_url.contains(char::is_whitespace) {
            return Err(ExplorerError::Config(format!("{} must not contain spaces", API_URL_VAR)));
        }

        let store_path = store_path
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| {
                // Without a home directory the session lives next to the working directory
                home.unwrap_or_default()
                    .join(".movie-explorer")
                    .join("session.json")
            });

        Ok(Self { api_url, store_path })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_home() {
        let config = Config::resolve(None, None, Some(PathBuf::from("/home/kim"))).unwrap();
        assert_eq!(config.api_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.store_path,
            PathBuf::from("/home/kim/.movie-explorer/session.json")
        );
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::resolve(
            Some(" http://localhost:3000 ".into()),
            Some(PathBuf::from("/tmp/s.json")),
            None,
        )
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.store_path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn no_home_falls_back_to_working_directory() {
        let config = Config::resolve(None, None, None).unwrap();
        assert_eq!(config.store_path, PathBuf::from(".movie-explorer/session.json"));
    }

    #[test]
    fn api_url_with_inner_spaces_is_rejected() {
        assert!(matches!(
            Config::resolve(Some("http://local host".into()), None, None),
            Err(ExplorerError::Config(_))
        ));
    }
}
