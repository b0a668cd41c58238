use std::path::{Path, PathBuf};

use eyre::{eyre, Context};
use log::{error, info, trace};
use shelf::{
    file::FormatFile,
    format::{Format, Json, Writer},
    Book, BookDraft, BookId, Store,
};

/// The state of an interactive session: the working set and the current search query.
pub struct Session<S: Store> {
    store: S,
    query: String,
}

impl<S: Store> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            query: String::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: String) {
        trace!("Search query set to '{query}'");
        self.query = query;
    }

    /// Books matching the current query.
    pub fn visible(&self) -> Vec<&Book> {
        shelf::search(self.store.books(), &self.query)
    }

    pub fn render(&self) -> String {
        render_table(&self.visible())
    }

    /// Whether the working set changed since the last call and has to be shown again.
    pub fn changed(&mut self) -> bool {
        self.store.dirty()
    }

    /// Replace the working set with whatever `fetch` returns.
    ///
    /// A failed fetch is logged and leaves the working set untouched, the returned message is
    /// meant for the user either way.
    pub fn reload_with<F>(&mut self, count: usize, fetch: F) -> String
    where
        F: FnOnce(usize) -> Result<Vec<Book>, shelf::Error>,
    {
        match fetch(count) {
            Ok(books) => {
                let loaded = books.len();
                self.store.replace(books);
                info!("Working set replaced with {loaded} books");
                format!("Loaded {loaded} book(s)")
            }
            Err(err) => {
                error!("Failed to load books: {err}");
                "Could not load books - keeping the current list".to_owned()
            }
        }
    }

    pub fn add(&mut self, draft: BookDraft) -> BookId {
        let id = self.store.insert(draft);
        trace!("Added book {id}");
        id
    }

    pub fn edit(&mut self, id: &BookId, draft: BookDraft) -> eyre::Result<()> {
        if self.store.update(id, draft) {
            Ok(())
        } else {
            Err(eyre!("No book found with the id '{id}'"))
        }
    }

    pub fn delete(&mut self, id: &BookId) -> eyre::Result<()> {
        if self.store.remove(id) {
            Ok(())
        } else {
            Err(eyre!("No book found with the id '{id}'"))
        }
    }

    /// Write the whole working set, ignoring the query, to `path` as JSON.
    pub fn export_to(&self, path: &Path) -> eyre::Result<PathBuf> {
        let path = path.with_extension(Json::ext());
        FormatFile::<Json>::create(&path)
            .and_then(|mut file| file.write_books(self.store.books()))
            .wrap_err_with(|| format!("Cannot export books to '{}'", path.display()))?;
        Ok(path)
    }
}

/// One line per book followed by the number of books shown.
pub fn render_table(books: &[&Book]) -> String {
    let mut lines = books
        .iter()
        .map(|book| {
            let year = book.year.map(|y| y.to_string()).unwrap_or_default();
            let rating = book.rating.map(|r| format!("{r:.1}")).unwrap_or_default();
            format!(
                "{} | {} | {} | {} | {}",
                book.title, book.author, book.genre, year, rating
            )
        })
        .collect::<Vec<_>>();

    lines.push(format!("{} book(s)", books.len()));
    lines.join("\n")
}

/// Build a [`BookDraft`] from raw user input, blank year and rating are left absent.
pub fn parse_draft(
    title: &str,
    author: &str,
    genre: &str,
    year: &str,
    rating: &str,
) -> eyre::Result<BookDraft> {
    let year = match year.trim() {
        "" => None,
        y => Some(
            y.parse::<i32>()
                .wrap_err_with(|| format!("'{y}' is not a valid year"))?,
        ),
    };

    let rating = match rating.trim() {
        "" => None,
        r => {
            let rating = r
                .parse::<f64>()
                .wrap_err_with(|| format!("'{r}' is not a valid rating"))?;
            if !rating.is_finite() {
                return Err(eyre!("'{r}' is not a valid rating"));
            }
            Some(rating)
        }
    };

    Ok(BookDraft {
        title: title.trim().to_owned(),
        author: author.trim().to_owned(),
        genre: genre.trim().to_owned(),
        year,
        rating,
    })
}
