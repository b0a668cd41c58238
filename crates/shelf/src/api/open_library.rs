use log::trace;
use rand::Rng;
use serde::Deserialize;

use crate::{
    book::{self, Book, BookId},
    Error,
};

use super::Client;

/// Separator used when a work lists more than one author.
pub(crate) const AUTHOR_SEPARATOR: &str = ", ";

/// Request the works listed at `url`.
pub(crate) fn get_subject_works<C: Client>(client: &C, url: &str) -> Result<Vec<Work>, Error> {
    trace!("Requesting subject works from '{url}'");
    let SubjectModel { works } = client.get_json(url)?;
    trace!("Request was successful - {} works listed", works.len());
    Ok(works)
}

/// Keep the qualifying works, in the order the service listed them, and turn the first
/// `count` into [`Book`]s tagged with `subject`.
pub(crate) fn normalize<R: Rng + ?Sized>(
    works: Vec<Work>,
    subject: &str,
    count: usize,
    rng: &mut R,
) -> Vec<Book> {
    works
        .into_iter()
        .filter_map(Work::qualify)
        .take(count)
        .map(|(title, author, year)| Book {
            id: BookId::new(),
            title,
            author,
            genre: subject.to_owned(),
            year,
            rating: Some(book::random_rating(&mut *rng)),
        })
        .collect()
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct SubjectModel {
    works: Vec<Work>,
}

/// A single work listed by a subject, every field may be missing.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct Work {
    title: Option<String>,
    authors: Option<Vec<Author>>,
    first_publish_year: Option<i32>,
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct Author {
    name: Option<String>,
}

impl Work {
    /// Title, joined authors and year when the work has a title and at least one named author.
    fn qualify(self) -> Option<(String, String, Option<i32>)> {
        let Self {
            title,
            authors,
            first_publish_year,
        } = self;

        let title = title.filter(|t| !t.trim().is_empty())?;
        let author = authors?
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|name| !name.trim().is_empty())
            .collect::<Vec<_>>()
            .join(AUTHOR_SEPARATOR);

        if author.is_empty() {
            None
        } else {
            Some((title, author, first_publish_year))
        }
    }
}
