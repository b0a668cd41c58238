//! The book record and the user-editable draft it is built from.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque identifier generated locally for every [`Book`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single record of the working set.
///
/// The field names are part of the export format so they must not be renamed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Locally generated identifier, never supplied by the catalog.
    pub id: BookId,
    /// Title of the book.
    pub title: String,
    /// Contributors joined into a single display string.
    pub author: String,
    /// Subject tag the book was fetched under, or what the user typed in.
    pub genre: String,
    /// First publication year when known.
    pub year: Option<i32>,
    /// Score between 3.0 and 5.0 for fetched books, may be absent for manual ones.
    pub rating: Option<f64>,
}

impl Book {
    /// Create a [`Book`] from a draft with a freshly generated id.
    #[must_use]
    pub fn from_draft(draft: BookDraft) -> Self {
        Self::with_id(BookId::new(), draft)
    }

    /// Create a [`Book`] from a draft keeping a known id.
    #[must_use]
    pub fn with_id(id: BookId, draft: BookDraft) -> Self {
        let BookDraft {
            title,
            author,
            genre,
            year,
            rating,
        } = draft;

        Self {
            id,
            title,
            author,
            genre,
            year,
            rating,
        }
    }

    /// Overwrite every field except the id.
    pub fn apply(&mut self, draft: BookDraft) {
        let id = self.id;
        *self = Self::with_id(id, draft);
    }

    /// The editable fields of this book.
    #[must_use]
    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            year: self.year,
            rating: self.rating,
        }
    }
}

/// The fields of a [`Book`] a user can type in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookDraft {
    /// Title of the book.
    pub title: String,
    /// Contributors as a display string.
    pub author: String,
    /// Free text genre.
    pub genre: String,
    /// First publication year.
    pub year: Option<i32>,
    /// Score of the book.
    pub rating: Option<f64>,
}

/// Lowest rating that can be synthesized.
pub const MIN_RATING: f64 = 3.0;
/// Highest rating that can be synthesized.
pub const MAX_RATING: f64 = 5.0;

/// Synthesize a rating in `[MIN_RATING, MAX_RATING]` rounded to one decimal place.
pub fn random_rating<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let raw: f64 = rng.gen_range(MIN_RATING..=MAX_RATING);
    ((raw * 10.0).round() / 10.0).clamp(MIN_RATING, MAX_RATING)
}
