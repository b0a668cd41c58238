use crate::{Book, Error, ErrorKind};

use super::Format;

/// A type wrapper around [`String`] to represent the JSON export of a working set.
///
/// The export is a pretty printed array (two space indentation) of books using the field
/// names of [`Book`].
#[derive(Debug)]
pub struct Json(String);

impl Format for Json {
    fn new(val: String) -> Self {
        Self(val)
    }

    fn parse(self) -> Result<Vec<Book>, Error> {
        if self.0.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&self.0).map_err(|e| {
            Error::wrap_with(
                ErrorKind::Deserialize,
                e,
                "Unable to parse string as a JSON book list",
            )
        })
    }

    fn compose(books: &[Book]) -> Result<Self, Error> {
        serde_json::to_string_pretty(books)
            .map(Self)
            .map_err(|e| Error::wrap(ErrorKind::Deserialize, e))
    }

    fn raw(self) -> String {
        self.0
    }

    fn name() -> &'static str {
        "JSON"
    }

    fn ext() -> &'static str {
        "json"
    }
}
