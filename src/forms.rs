//! Typed form state and pure field validation.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::structs::{Movie, MovieDraft, NewAccount};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_PHONE_LEN: usize = 10;

/// A violation attached to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn message_for<'a>(errors: &'a [FieldError], field: &str) -> Option<&'a str> {
    errors
        .iter()
        .find(|error| error.field == field)
        .map(|error| error.message.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !email.contains('@') {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }

        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl SignupForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.full_name.trim().is_empty() {
            errors.push(FieldError::new("full_name", "Full Name is required"));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !EMAIL_RE.is_match(email) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters long",
            ));
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.push(FieldError::new("phone", "Phone Number is required"));
        } else if phone.chars().count() < MIN_PHONE_LEN {
            errors.push(FieldError::new(
                "phone",
                "Phone Number must be at least 10 characters long",
            ));
        }

        errors
    }

    /// Splits the full name into first and last name for the sign-up payload.
    pub fn to_account(&self) -> NewAccount {
        let mut parts = self.full_name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");

        NewAccount {
            first_name,
            last_name: (!last_name.is_empty()).then_some(last_name),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            mobile_number: self.phone.trim().to_string(),
        }
    }
}

/// Movie editor state. Numeric inputs stay as text until validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieForm {
    pub title: String,
    pub genre: String,
    pub release_year: String,
    pub director: String,
    pub duration: String,
    pub description: String,
    pub main_lead: String,
    pub streaming_platform: String,
    pub rating: String,
    pub premium: bool,
    pub poster: Option<PathBuf>,
    pub banner: Option<PathBuf>,
}

impl MovieForm {
    /// Prefills the editor from an existing movie.
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            release_year: movie.release_year.to_string(),
            director: movie.director.clone(),
            duration: movie.duration_minutes.to_string(),
            description: movie.description.clone(),
            main_lead: movie.main_lead.clone(),
            streaming_platform: movie.streaming_platform.clone(),
            rating: movie.rating.to_string(),
            premium: movie.premium,
            poster: None,
            banner: None,
        }
    }

    /// Validation for a new movie: every field plus a poster.
    pub fn validate_for_create(&self) -> Result<MovieDraft, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.poster.is_none() {
            errors.push(FieldError::new("poster", "Poster is required"));
        }
        self.draft(errors)
    }

    /// Validation for an edit: same rules, poster optional.
    pub fn validate_for_update(&self) -> Result<MovieDraft, Vec<FieldError>> {
        self.draft(Vec::new())
    }

    fn draft(&self, mut errors: Vec<FieldError>) -> Result<MovieDraft, Vec<FieldError>> {
        let text_fields = [
            ("title", &self.title),
            ("genre", &self.genre),
            ("director", &self.director),
            ("description", &self.description),
            ("main_lead", &self.main_lead),
            ("streaming_platform", &self.streaming_platform),
        ];
        for (field, value) in text_fields {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "This field is required"));
            }
        }

        let release_year = parse_in_range::<i32>(&self.release_year, 1888..=2100)
            .map_err(|message| errors.push(FieldError::new("release_year", message)))
            .ok();
        let duration = parse_in_range::<u32>(&self.duration, 1..=u32::MAX)
            .map_err(|message| errors.push(FieldError::new("duration", message)))
            .ok();
        let rating = parse_rating(&self.rating)
            .map_err(|message| errors.push(FieldError::new("rating", message)))
            .ok();

        match (release_year, duration, rating) {
            (Some(release_year), Some(duration_minutes), Some(rating)) if errors.is_empty() => {
                Ok(MovieDraft {
                    title: self.title.trim().to_string(),
                    genre: self.genre.trim().to_string(),
                    release_year,
                    director: self.director.trim().to_string(),
                    duration_minutes,
                    description: self.description.trim().to_string(),
                    main_lead: self.main_lead.trim().to_string(),
                    streaming_platform: self.streaming_platform.trim().to_string(),
                    rating,
                    premium: self.premium,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_in_range<T>(raw: &str, range: std::ops::RangeInclusive<T>) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("This field is required".to_string());
    }

    let value = raw
        .parse::<T>()
        .map_err(|_| "Must be a whole number".to_string())?;

    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "Must be between {} and {}",
            range.start(),
            range.end()
        ))
    }
}

fn parse_rating(raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("This field is required".to_string());
    }

    match raw.parse::<f64>() {
        Ok(value) if (0.0..=10.0).contains(&value) => Ok(value),
        Ok(_) => Err("Must be between 0 and 10".to_string()),
        Err(_) => Err("Must be a number".to_string()),
    }
}
