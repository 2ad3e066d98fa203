use std::path::Path;

use tracing::warn;

use crate::forms::{FieldError, MovieForm};
use crate::navigation::Navigation;
use crate::notice::{Notice, Outcome};
use crate::store::SessionStore;
use crate::structs::client::Client;
use crate::structs::Upload;

/// Add and update screens for supervisors.
pub struct MovieEditor<'a> {
    client: &'a Client,
    store: &'a SessionStore,
}

impl<'a> MovieEditor<'a> {
    pub fn new(client: &'a Client, store: &'a SessionStore) -> Self {
        Self { client, store }
    }

    /// Loads an existing movie into a form for editing.
    pub fn load_for_update(&self, id: u64) -> Result<MovieForm, Outcome> {
        match self.client.get_movie_by_id(id) {
            Ok(Some(movie)) => Ok(MovieForm::from_movie(&movie)),
            Ok(None) => Err(Outcome::notice(Notice::error(
                "Error",
                format!("Movie {} does not exist", id),
            ))),
            Err(err) => {
                warn!(movie_id = id, error = %err, "failed to load movie data");
                Err(Outcome::notice(Notice::error("Error", "Failed to load movie data")))
            }
        }
    }

    pub fn create(&self, form: &MovieForm) -> Result<Outcome, Vec<FieldError>> {
        let draft = form.validate_for_create()?;

        let poster = match form.poster.as_deref().map(|path| read_upload("poster", path)) {
            Some(Ok(poster)) => poster,
            Some(Err(errors)) => return Err(errors),
            None => return Err(vec![FieldError::new("poster", "Poster is required")]),
        };

        let token = self.token();
        match self.client.create_movie(token.as_deref(), &draft, &poster) {
            Some(movie) => Ok(Outcome::notice(Notice::success(
                "Success",
                format!("\"{}\" added successfully", movie.title),
            ))
            .then(Navigation::Back)),
            None => Ok(Outcome::notice(Notice::error("Error", "Failed to add movie"))),
        }
    }

    pub fn update(&self, id: u64, form: &MovieForm) -> Result<Outcome, Vec<FieldError>> {
        let draft = form.validate_for_update()?;

        let poster = form
            .poster
            .as_deref()
            .map(|path| read_upload("poster", path))
            .transpose()?;
        let banner = form
            .banner
            .as_deref()
            .map(|path| read_upload("banner", path))
            .transpose()?;

        let token = self.token();
        if self
            .client
            .update_movie(token.as_deref(), id, &draft, poster.as_ref(), banner.as_ref())
        {
            Ok(Outcome::notice(Notice::success("Success", "Movie updated successfully"))
                .then(Navigation::Back))
        } else {
            Ok(Outcome::notice(Notice::error("Error", "Failed to update movie")))
        }
    }

    fn token(&self) -> Option<String> {
        self.store.token().unwrap_or_else(|err| {
            warn!(error = %err, "could not read token");
            None
        })
    }
}

fn read_upload(field: &'static str, path: &Path) -> Result<Upload, Vec<FieldError>> {
    Upload::from_path(path).map_err(|err| {
        vec![FieldError::new(
            field,
            format!("Cannot read {}: {}", path.display(), err),
        )]
    })
}
