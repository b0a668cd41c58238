use crate::{Book, BookDraft, BookId};

/// The operations a session needs from whatever holds its working set.
pub trait Store {
    /// All the books currently held.
    fn books(&self) -> &[Book];

    /// Replace every book with `books`.
    fn replace(&mut self, books: Vec<Book>);

    /// Add a new book built from `draft` and return its fresh id.
    fn insert(&mut self, draft: BookDraft) -> BookId;

    /// Overwrite every field but the id of the book with `id`.
    ///
    /// Returns `false` when no book has that id.
    fn update(&mut self, id: &BookId, draft: BookDraft) -> bool;

    /// Remove the book with `id`, returns whether a book was removed.
    fn remove(&mut self, id: &BookId) -> bool;

    /// Checks and resets the `dirty` flag.
    ///
    /// The `dirty` flag will return true when the books have changed since the store was created
    /// or since the last call.
    fn dirty(&mut self) -> bool;
}

/// An in-memory working set of books.
///
/// Books keep the order they were added in, a bulk [`Store::replace`] discards all of them.
#[derive(Debug, Default, PartialEq)]
#[cfg_attr(test, derive(Clone))]
pub struct Shelf {
    dirty: bool,
    books: Vec<Book>,
}

impl Shelf {
    /// Create a new [`Shelf`] from a list of books.
    #[must_use]
    pub const fn new(books: Vec<Book>) -> Self {
        Self {
            dirty: false,
            books,
        }
    }

    /// The book with `id`, if any.
    #[must_use]
    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    /// Number of books on the shelf.
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the shelf holds no books.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Books whose title or author contains `query`, ignoring case and surrounding whitespace.
    ///
    /// An empty query matches every book.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Book> {
        search(&self.books, query)
    }

    /// Consume the shelf returning its books.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // drop is not const
    pub fn into_books(self) -> Vec<Book> {
        self.books
    }
}

impl Store for Shelf {
    fn books(&self) -> &[Book] {
        &self.books
    }

    fn replace(&mut self, books: Vec<Book>) {
        self.dirty = true;
        self.books = books;
    }

    fn insert(&mut self, draft: BookDraft) -> BookId {
        // ids must stay unique within the shelf
        let mut book = Book::from_draft(draft);
        while self.get(&book.id).is_some() {
            book.id = BookId::new();
        }

        let id = book.id;
        self.books.push(book);
        self.dirty = true;
        id
    }

    fn update(&mut self, id: &BookId, draft: BookDraft) -> bool {
        match self.books.iter_mut().find(|b| &b.id == id) {
            Some(book) => {
                book.apply(draft);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &BookId) -> bool {
        let before = self.books.len();
        self.books.retain(|b| &b.id != id);
        let removed = self.books.len() != before;

        self.dirty |= removed;
        removed
    }

    fn dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }
}

/// Filter `books` by a free text query on title and author.
#[must_use]
pub fn search<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let query = query.trim().to_lowercase();
    books
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&query) || b.author.to_lowercase().contains(&query)
        })
        .collect()
}
