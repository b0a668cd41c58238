#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

//! # shelf
//!
//! shelf is a library which fetches book metadata from a subject-indexed catalog and keeps it
//! in an in-memory working set that can be searched, edited and exported to a
//! [`format::Format`] such as [`format::Json`].
//!
//! Nothing is persisted: a working set lives as long as the [`Shelf`] holding it.

mod api;
mod book;
pub mod catalog;
mod error;
pub mod file;
pub mod format;
mod shelf;

pub use api::{http_client, Client};
pub use book::{random_rating, Book, BookDraft, BookId, MAX_RATING, MIN_RATING};
pub use catalog::{CancelToken, FetchConfig, Fetcher, DEFAULT_COUNT, SUBJECTS};
pub use error::{Error, ErrorKind};
pub use shelf::{search, Shelf, Store};

use log::trace;

/// Fetch up to `count` books from the default catalog.
///
/// Up to five rounds are attempted, each one asking the catalog for the works of a random subject.
/// The books of the first round yielding any qualifying work are returned.
///
/// # Errors
///
/// An `Err` is returned when `count` is zero.
/// An `Err` is returned when every round failed or returned no qualifying works.
///
/// # Examples
/// ```no_run
/// fn main() -> Result<(), shelf::Error> {
///     let books = shelf::fetch_books(shelf::DEFAULT_COUNT)?;
///     for book in &books {
///         println!("{} by {}", book.title, book.author);
///     }
///     Ok(())
/// }
/// ```
#[inline]
pub fn fetch_books(count: usize) -> Result<Vec<Book>, Error> {
    trace!("Fetch {count} books using the default catalog");
    Fetcher::new(FetchConfig::default())?.fetch(count, &CancelToken::new())
}
