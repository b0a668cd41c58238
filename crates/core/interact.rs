use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use dialoguer::{console::Term, theme::ColorfulTheme, Confirm, Input};
use eyre::{eyre, Context, Result};
use log::{error, trace};
use shelf::{BookDraft, BookId, CancelToken, Client, Fetcher, Store};

use crate::app::{parse_draft, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    List,
    Search,
    Add,
    Edit,
    Delete,
    Reload,
    Export,
    Quit,
}

impl Action {
    const ALL: [Self; 8] = [
        Self::List,
        Self::Search,
        Self::Add,
        Self::Edit,
        Self::Delete,
        Self::Reload,
        Self::Export,
        Self::Quit,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::List => "List books",
            Self::Search => "Search by title or author",
            Self::Add => "Add a book",
            Self::Edit => "Edit a book",
            Self::Delete => "Delete a book",
            Self::Reload => "Reload from the catalog",
            Self::Export => "Export to JSON",
            Self::Quit => "Quit",
        }
    }
}

/// Load `count` books and keep asking the user what to do until they quit.
///
/// The books are shown again whenever an action changed them. Failures of a single action are
/// reported and the session carries on.
///
/// # Errors
///
/// An `Err` is returned when stdin or stderr is not a terminal, the prompts cannot be answered
/// there.
pub fn run<S, C>(session: &mut Session<S>, fetcher: &Fetcher<C>, count: usize) -> Result<()>
where
    S: Store,
    C: Client,
{
    if !(io::stdin().is_terminal() && Term::stderr().is_term()) {
        return Err(eyre!(
            "The session needs an interactive terminal - use the fetch or search commands instead"
        ));
    }

    let reload = |n| fetcher.fetch(n, &CancelToken::new());
    println!("{}", session.reload_with(count, reload));

    let labels = Action::ALL.map(Action::label);
    loop {
        if session.changed() {
            println!("{}", session.render());
        }

        let action = match user_select("What next?", &labels) {
            Ok(index) => Action::ALL[index],
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        trace!("User picked {action:?}");

        let res = match action {
            Action::List => {
                println!("{}", session.render());
                Ok(())
            }
            Action::Search => user_search(session),
            Action::Add => user_draft(&BookDraft::default()).map(|draft| {
                session.add(draft);
                println!("Book added");
            }),
            Action::Edit => user_edit(session),
            Action::Delete => user_delete(session),
            Action::Reload => {
                println!("{}", session.reload_with(count, reload));
                Ok(())
            }
            Action::Export => user_export(session),
            Action::Quit => return Ok(()),
        };

        if let Err(err) = res {
            error!("{err:#}");
            println!("{err}");
        }
    }
}

pub fn user_select<S: ToString>(prompt: &str, items: &[S]) -> Result<usize> {
    let selection = dialoguer::Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(0)
        .items(items)
        .interact_opt()
        .wrap_err_with(|| eyre!("User selection cancelled"))?;

    if let Some(index) = selection {
        Ok(index)
    } else {
        Err(eyre!("No selection made - cancelling operation"))
    }
}

pub fn user_input(prompt: &str, default: &str) -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default.to_owned())
        .allow_empty(true)
        .interact_text()
        .wrap_err_with(|| eyre!("User input cancelled"))
}

fn user_confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .wrap_err_with(|| eyre!("User confirmation cancelled"))
}

fn user_draft(current: &BookDraft) -> Result<BookDraft> {
    let title = user_input("Title", &current.title)?;
    let author = user_input("Author", &current.author)?;
    let genre = user_input("Genre", &current.genre)?;
    let year = user_input(
        "Year",
        &current.year.map(|y| y.to_string()).unwrap_or_default(),
    )?;
    let rating = user_input(
        "Rating",
        &current.rating.map(|r| r.to_string()).unwrap_or_default(),
    )?;

    parse_draft(&title, &author, &genre, &year, &rating)
}

fn user_select_book<S: Store>(session: &Session<S>, prompt: &str) -> Result<(BookId, BookDraft)> {
    let visible = session.visible();
    if visible.is_empty() {
        return Err(eyre!("No books to choose from"));
    }

    let items = visible
        .iter()
        .map(|b| format!("{} by {}", b.title, b.author))
        .collect::<Vec<_>>();
    let selection = user_select(prompt, &items)?;

    let book = visible[selection];
    Ok((book.id, book.draft()))
}

fn user_search<S: Store>(session: &mut Session<S>) -> Result<()> {
    let query = user_input("Search title or author", session.query())?;
    session.set_query(query);
    println!("{}", session.render());
    Ok(())
}

fn user_edit<S: Store>(session: &mut Session<S>) -> Result<()> {
    let (id, current) = user_select_book(session, "Edit which book?")?;
    let draft = user_draft(&current)?;
    session.edit(&id, draft)?;
    println!("Book updated");
    Ok(())
}

fn user_delete<S: Store>(session: &mut Session<S>) -> Result<()> {
    let (id, current) = user_select_book(session, "Delete which book?")?;
    if user_confirm(&format!("Really delete '{}'?", current.title))? {
        session.delete(&id)?;
        println!("Book deleted");
    }
    Ok(())
}

fn user_export<S: Store>(session: &Session<S>) -> Result<()> {
    let path = user_input("Export to", "books.json")?;
    let path = session.export_to(&PathBuf::from(path))?;
    println!("Books exported to '{}'", path.display());
    Ok(())
}
