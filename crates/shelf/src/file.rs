//! Format supporting Filesystem operations.
//!
//! This module contains basic methods for opening/creating files into a supported format and also
//! provides types to read and write from those format files.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, Write},
    marker::PhantomData,
    path::Path,
};

use crate::{
    format::{Format, Reader, Writer},
    Error, ErrorKind,
};

/// File name used for an export when the user does not pick one.
pub const DEFAULT_EXPORT_NAME: &str = "books";

/// A reference to an open file on the filesystem which should have the textual content that
/// matches the generic [`Format`].
///
/// `FormatFile`s are automatically closed when they go out of scope.
#[allow(clippy::module_name_repetitions)]
pub struct FormatFile<F: Format> {
    file: File,
    _format: PhantomData<F>,
}

impl<F: Format> FormatFile<F> {
    fn new(file: File) -> Self {
        Self {
            file,
            _format: PhantomData,
        }
    }

    /// Attempts to open an existing format file in read and write mode.
    ///
    /// The extension of `path` is replaced with [`Format::ext`].
    ///
    /// # Errors
    /// This function will return an error if `path` does not already exist or the user lacks
    /// permissions to open the file.
    ///
    /// # Examples
    /// ```no_run
    /// use shelf::{file::FormatFile, format::Json};
    ///
    /// fn main() -> Result<(), shelf::Error> {
    ///     let mut f = FormatFile::<Json>::open("books.json")?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path_buf = path.as_ref().with_extension(F::ext());
        let path = path_buf.as_path();
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map(Self::new)
            .map_err(|e| {
                Error::wrap_with(
                    ErrorKind::IO,
                    e,
                    format!(
                        "Failed to open the '{}' file for reading and writing",
                        path.display()
                    ),
                )
            })
    }

    /// Opens a format file in read and write mode.
    ///
    /// This function will create a file if it does not exist, and will truncate it if it does.
    /// The extension of `path` is replaced with [`Format::ext`].
    ///
    /// # Errors
    /// This function will return an error if the user lacks permissions to open or create the
    /// file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path_buf = path.as_ref().with_extension(F::ext());
        let path = path_buf.as_path();
        OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)
            .map(Self::new)
            .map_err(|e| {
                Error::wrap_with(
                    ErrorKind::IO,
                    e,
                    format!(
                        "Failed to create and open the '{}' file for reading and writing",
                        path.display()
                    ),
                )
            })
    }
}

impl<F: Format> Reader for FormatFile<F> {
    type Format = F;

    fn read(&mut self) -> Result<Self::Format, Error> {
        let mut content = String::new();
        self.file.rewind().map_err(|e| Error::wrap(ErrorKind::IO, e))?;
        self.file
            .read_to_string(&mut content)
            .map_err(|e| Error::wrap_with(ErrorKind::IO, e, "Cannot read contents of file"))
            .map(move |bytes| {
                log::trace!("{bytes} read from the file");
                F::new(content)
            })
    }
}

impl<F: Format> Writer for FormatFile<F> {
    type Format = F;

    fn write(&mut self, format: F) -> Result<(), Error> {
        fn overwrite_file_from_start(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
            // Rewind the cursor back to the start of the file to write over the contents and set
            // the length of the file to be equal to bytes so that existing data is removed
            file.rewind()?;
            file.set_len(bytes.len() as u64)?;
            file.write_all(bytes)?;
            file.flush()
        }

        let bytes = format.raw().into_bytes();
        log::trace!("writing {} bytes of {}", bytes.len(), F::name());
        overwrite_file_from_start(&mut self.file, &bytes)
            .map_err(|e| Error::wrap(ErrorKind::IO, e))
    }
}
