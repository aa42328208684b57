//! Game catalog record
//!
//! Mirrors the documents stored in the `games` collection. Backups never
//! rewrite these records; the model exists so restored data can be checked
//! and listed.

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A game in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub genre: String,

    /// Text language(s)
    #[serde(default)]
    pub lang_text: String,

    /// Voice language(s)
    #[serde(default)]
    pub lang_voices: String,

    /// Human-readable download size, e.g. "12 GB"
    #[serde(default)]
    pub file_size: String,

    #[serde(default)]
    pub min_requirements: String,

    #[serde(default)]
    pub rec_requirements: String,

    #[serde(default)]
    pub download_link: String,

    /// Cover image URL in the object store
    #[serde(default)]
    pub image_url: String,

    /// Screenshot URLs in the object store
    #[serde(default)]
    pub captures: Vec<String>,

    #[serde(default)]
    pub release_date: String,

    #[serde(default)]
    pub last_update: String,

    #[serde(default)]
    pub details: String,

    #[serde(default)]
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Game {
    /// Create a new game with the mandatory fields; the slug is derived from the title
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        platform: impl Into<String>,
        genre: impl Into<String>,
        download_link: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: Some(ObjectId::new()),
            slug: slugify(&title),
            title,
            description: description.into(),
            platform: platform.into(),
            genre: genre.into(),
            lang_text: String::new(),
            lang_voices: String::new(),
            file_size: String::new(),
            min_requirements: String::new(),
            rec_requirements: String::new(),
            download_link: download_link.into(),
            image_url: image_url.into(),
            captures: Vec::new(),
            release_date: String::new(),
            last_update: String::new(),
            details: String::new(),
            created_at: Some(DateTime::now()),
        }
    }

    /// Validate mandatory fields and the slug
    pub fn validate(&self) -> Result<(), GameValidationError> {
        if let Some(field) = self.missing_fields().first().copied() {
            return Err(GameValidationError::MissingField(field));
        }
        self.check_slug()
    }

    /// Every validation problem, not just the first
    pub fn issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .missing_fields()
            .into_iter()
            .map(|field| GameValidationError::MissingField(field).to_string())
            .collect();
        if let Err(e) = self.check_slug() {
            issues.push(e.to_string());
        }
        issues
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("platform", &self.platform),
            ("genre", &self.genre),
            ("downloadLink", &self.download_link),
            ("imageUrl", &self.image_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// The slug is fixed at creation, so it is checked for shape only
    fn check_slug(&self) -> Result<(), GameValidationError> {
        if self.slug.is_empty() {
            return Err(GameValidationError::EmptySlug);
        }
        if slugify(&self.slug) != self.slug {
            return Err(GameValidationError::MalformedSlug(self.slug.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.platform)
    }
}

/// Derive a URL slug from a title
///
/// Lowercase ASCII letters and digits are kept; every other run of
/// characters collapses to a single `-`, trimmed at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Validation errors for games
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameValidationError {
    MissingField(&'static str),
    MalformedSlug(String),
    EmptySlug,
}

impl fmt::Display for GameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing required field '{}'", field),
            Self::MalformedSlug(slug) => {
                write!(f, "Slug '{}' is not lowercase words joined by '-'", slug)
            }
            Self::EmptySlug => write!(f, "Slug is empty"),
        }
    }
}

impl std::error::Error for GameValidationError {}
