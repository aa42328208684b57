//! Catalog data models
//!
//! The backup tool treats documents as opaque; these types are used to
//! inspect `games` records after a restore and in the debug listing.

pub mod game;
pub mod summary;

pub use game::{slugify, Game, GameValidationError};
pub use summary::{bson_type_name, GameSummary};
