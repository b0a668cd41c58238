//! Contains traits and implementions of the [`Format`], [`Reader`], and [`Writer`] trait.
use std::marker::PhantomData;

mod json;

use crate::{Book, Error};
pub use json::Json;

/// A textual representation that can be parsed into and composed from a list of [`Book`]s.
///
/// Formats are promises at the type level about what a [`String`] (or similar) represents.
pub trait Format: Sized {
    /// Construct a new type using a [`String`] input.
    ///
    /// This function should not panic or fail as creating a [`Format`] is a type promise about
    /// what the [`String`] represents.
    fn new(val: String) -> Self;

    /// Parses this [`Format`] into a list of [`Book`]s.
    ///
    /// # Errors
    ///
    /// Will return [`Err`] if it's not possible to parse this [`Format`] to books.
    fn parse(self) -> Result<Vec<Book>, Error>;

    /// Composes a list of [`Book`]s to this [`Format`].
    ///
    /// # Errors
    ///
    /// Will return [`Err`] if the serializer backing the format rejects one of the books.
    fn compose(books: &[Book]) -> Result<Self, Error>;

    /// The current [`Format`] in a raw [`String`].
    fn raw(self) -> String;

    /// The display name of the format.
    fn name() -> &'static str;

    /// The file extension associated with this format.
    fn ext() -> &'static str;
}

/// A trait for objects which are [`Format`]-oriented sinks.
///
/// Writers have a default implemention of [`Writer::write_books`] using the [`Writer::write`]
/// method.
pub trait Writer {
    /// The format associated with the writer.
    type Format: Format;

    /// Write a format into this writer.
    ///
    /// # Errors
    ///
    /// The call to write should only return an [`Err`] when writing to the writer cannot be
    /// completed.
    fn write(&mut self, format: Self::Format) -> Result<(), Error>;

    /// Write `books` into this writer using [`Format::compose`] from the [`Writer::Format`]
    /// associated type.
    ///
    /// # Errors
    ///
    /// See [`Format::compose`] and [`Writer::write`].
    fn write_books(&mut self, books: &[Book]) -> Result<(), Error> {
        let format = Self::Format::compose(books)?;
        self.write(format)
    }
}

/// The [`Reader`] trait allows for reading a [`Format`] from a source.
///
/// Readers have a default implemention of [`Reader::read_books`] using the [`Reader::read`]
/// method.
pub trait Reader {
    /// The format associated with the reader.
    type Format: Format;

    /// Pull some bytes from this reader in order to produce a [`Reader::Format`] instance.
    ///
    /// # Errors
    /// If this method encounters any form of error making it unable to read the bytes in order to
    /// create the format.
    fn read(&mut self) -> Result<Self::Format, Error>;

    /// Read using [`Reader::read`] and then parse using [`Format::parse`].
    ///
    /// # Errors
    /// This will return [`Err`] if there is an error from [`Reader::read`] or an error when parsing
    /// using [`Format::parse`].
    fn read_books(&mut self) -> Result<Vec<Book>, Error> {
        let format = self.read()?;
        format.parse()
    }
}

/// A [`String`] wrapper that includes type information of the format the wrapped [`String`]
/// represents.
#[allow(clippy::module_name_repetitions)]
#[derive(PartialEq)]
pub struct FormatString<F: Format> {
    inner: String,
    _format: PhantomData<F>,
}

impl<F: Format> Default for FormatString<F> {
    fn default() -> Self {
        Self {
            inner: String::default(),
            _format: PhantomData,
        }
    }
}

impl<F: Format> FormatString<F> {
    /// Construct a new instance by wrapping an existing [`String`].
    #[must_use]
    pub fn new(val: String) -> Self {
        Self {
            inner: val,
            _format: PhantomData,
        }
    }
}

impl<F: Format> From<FormatString<F>> for String {
    fn from(val: FormatString<F>) -> Self {
        val.inner
    }
}

impl<F: Format> Reader for FormatString<F> {
    type Format = F;

    fn read(&mut self) -> Result<Self::Format, Error> {
        Ok(F::new(self.inner.clone()))
    }
}

impl<F: Format> Writer for FormatString<F> {
    type Format = F;

    fn write(&mut self, format: F) -> Result<(), Error> {
        self.inner = format.raw();
        Ok(())
    }
}
