use std::path::PathBuf;

use crate::{app, interact};

use shelf::{
    file::FormatFile,
    format::{Format, FormatString, Json, Writer},
    CancelToken, FetchConfig, Fetcher, Shelf, DEFAULT_COUNT,
};

use clap::Subcommand;
use log::trace;

#[derive(Subcommand)]
#[non_exhaustive]
pub enum Commands {
    /// Fetch books from the catalog and print them as JSON
    Fetch {
        /// How many books to fetch
        #[clap(short = 'n', long, default_value_t = DEFAULT_COUNT)]
        count: usize,

        /// Write the JSON export to this file instead of stdout
        ///
        /// The extension is always replaced with `.json`.
        #[clap(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
    },

    /// Fetch books and list the ones whose title or author matches the query
    #[clap(arg_required_else_help = true)]
    Search {
        /// Text to look for, case is ignored
        query: String,

        /// How many books to fetch before searching
        #[clap(short = 'n', long, default_value_t = DEFAULT_COUNT)]
        count: usize,
    },

    /// Start an interactive session to list, search, add, edit, delete and export books
    ///
    /// Nothing is kept once the session ends, use the export action to save the books.
    Session {
        /// How many books to fetch on start and on every reload
        #[clap(short = 'n', long, default_value_t = DEFAULT_COUNT)]
        count: usize,
    },
}

impl Commands {
    pub fn execute(self, config: FetchConfig) -> Result<String, Box<dyn std::error::Error>> {
        let fetcher = Fetcher::new(config)?;

        match self {
            Commands::Fetch { count, output } => {
                let books = fetcher.fetch(count, &CancelToken::new())?;
                if let Some(path) = output {
                    trace!("Exporting {} books to {}", books.len(), path.display());
                    FormatFile::<Json>::create(&path)?.write_books(&books)?;
                    Ok(format!(
                        "{} books exported to '{}'",
                        books.len(),
                        path.with_extension(Json::ext()).display()
                    ))
                } else {
                    let mut export = FormatString::<Json>::default();
                    export.write_books(&books)?;
                    Ok(export.into())
                }
            }
            Commands::Search { query, count } => {
                let books = fetcher.fetch(count, &CancelToken::new())?;
                let found = shelf::search(&books, &query);
                Ok(app::render_table(&found))
            }
            Commands::Session { count } => {
                let mut session = app::Session::new(Shelf::default());
                interact::run(&mut session, &fetcher, count)?;
                Ok(String::new())
            }
        }
    }
}
