//! The catalog fetcher: pulls normalized [`Book`]s from a subject-indexed catalog.
//!
//! A fetch is made of up to [`FetchConfig::max_rounds`] sequential rounds. Every round picks a
//! random subject, requests its works and keeps the qualifying ones. The first round that
//! produces at least one book wins; failed or empty rounds are only logged.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, trace};
use rand::{seq::SliceRandom, Rng};

use crate::{
    api::{self, open_library, Client},
    Book, Error, ErrorKind,
};

/// Number of books requested when the caller has no preference.
pub const DEFAULT_COUNT: usize = 10;

/// Subjects a fetch chooses from by default.
pub const SUBJECTS: [&str; 6] = ["fantasy", "science", "romance", "history", "horror", "love"];

const DEFAULT_ENDPOINT: &str = "https://openlibrary.org/subjects";
const DEFAULT_LIMIT: usize = 50;
const DEFAULT_MAX_ROUNDS: usize = 5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const EXHAUSTED_MESSAGE: &str = "unable to fetch any books from the catalog";

/// Settings of a [`Fetcher`].
#[derive(Clone, Debug, PartialEq)]
pub struct FetchConfig {
    /// Base URL the subject is appended to.
    pub endpoint: String,
    /// How many works to ask the catalog for in a single round.
    pub limit: usize,
    /// Upper bound of rounds before giving up.
    pub max_rounds: usize,
    /// Subjects to pick from, must not be empty.
    pub subjects: Vec<String>,
    /// Timeout of a single request.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            limit: DEFAULT_LIMIT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            subjects: SUBJECTS.iter().map(|&s| s.to_owned()).collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// The URL listing the works of `subject`.
    #[must_use]
    pub fn subject_url(&self, subject: &str) -> String {
        format!(
            "{}/{subject}.json?limit={}",
            self.endpoint.trim_end_matches('/'),
            self.limit
        )
    }
}

/// A flag shared between a running fetch and whoever may want to stop it.
///
/// The flag is checked before every round and again once a request returns.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every fetch holding this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancelToken::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::new(ErrorKind::Cancelled, "book fetch was cancelled"))
        } else {
            Ok(())
        }
    }
}

/// What a single round produced.
#[derive(Debug)]
pub(crate) enum RoundOutcome {
    Books(Vec<Book>),
    Empty,
    Failed(Error),
}

/// Fetches books from the catalog using the client `C`.
#[derive(Debug)]
pub struct Fetcher<C: Client = reqwest::blocking::Client> {
    client: C,
    config: FetchConfig,
}

impl Fetcher {
    /// Create a fetcher using an HTTP client built from `config`.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let client = api::http_client(config.timeout)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C: Client> Fetcher<C> {
    /// Create a fetcher around an existing client.
    #[must_use]
    pub const fn with_client(client: C, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// The settings of this fetcher.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch up to `count` books using the thread local random source.
    ///
    /// # Errors
    ///
    /// See [`Fetcher::fetch_with`].
    pub fn fetch(&self, count: usize, cancel: &CancelToken) -> Result<Vec<Book>, Error> {
        self.fetch_with(count, &mut rand::thread_rng(), cancel)
    }

    /// Fetch up to `count` books, `rng` picks the subjects and synthesizes the ratings.
    ///
    /// Rounds run one after another and stop at the first one producing a book. Every book
    /// returned carries the subject of that round as its genre.
    ///
    /// # Errors
    ///
    /// An [`Err`] of kind [`ErrorKind::InvalidInput`] is returned when `count` is zero or there
    /// are no subjects to pick from.
    /// An [`Err`] of kind [`ErrorKind::Cancelled`] is returned as soon as `cancel` is triggered.
    /// An [`Err`] of kind [`ErrorKind::Exhausted`] is returned when every round failed or came
    /// back empty.
    pub fn fetch_with<R>(
        &self,
        count: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Vec<Book>, Error>
    where
        R: Rng + ?Sized,
    {
        if count == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "at least one book must be requested",
            ));
        }

        for round in 1..=self.config.max_rounds {
            cancel.check()?;

            let subject = self
                .config
                .subjects
                .choose(rng)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "no subjects to pick from"))?;
            trace!("Round {round}: picked the '{subject}' subject");

            let outcome = self.round(subject, count, rng);
            cancel.check()?;

            match outcome {
                RoundOutcome::Books(books) => {
                    info!(
                        "Fetched {} '{subject}' books in round {round}",
                        books.len()
                    );
                    return Ok(books);
                }
                RoundOutcome::Empty => {
                    debug!("Round {round}: no qualifying works for '{subject}'");
                }
                RoundOutcome::Failed(err) => {
                    debug!("Round {round}: request for '{subject}' failed - {err}");
                }
            }
        }

        Err(Error::new(ErrorKind::Exhausted, EXHAUSTED_MESSAGE))
    }

    fn round<R: Rng + ?Sized>(&self, subject: &str, count: usize, rng: &mut R) -> RoundOutcome {
        let url = self.config.subject_url(subject);
        match open_library::get_subject_works(&self.client, &url) {
            Ok(works) => {
                let books = open_library::normalize(works, subject, count, rng);
                if books.is_empty() {
                    RoundOutcome::Empty
                } else {
                    RoundOutcome::Books(books)
                }
            }
            Err(err) => RoundOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        io::{Read, Write},
        net::TcpListener,
        sync::atomic::AtomicUsize,
        thread,
    };

    use super::*;

    use crate::api::{assert_url, MockClient, ScriptedClient, StatusErrorProducer};
    use rand::{rngs::StdRng, SeedableRng};
    use serde::de::DeserializeOwned;

    const ENDPOINT: &str = "http://catalog.test/subjects";
    const EMPTY: &str = r#"{"works": []}"#;
    const FANTASY: &str = include_str!("../tests/data/subject_fantasy.json");
    const THREE_WORKS: &str = r#"{"works": [
        {"title": "Dune", "authors": [{"name": "Frank Herbert"}], "first_publish_year": 1965},
        {"title": "Solaris", "authors": [{"name": "Stanislaw Lem"}], "first_publish_year": 1961},
        {"title": "Foundation", "authors": [{"name": "Isaac Asimov"}]}
    ]}"#;

    fn config() -> FetchConfig {
        FetchConfig {
            endpoint: ENDPOINT.to_owned(),
            ..FetchConfig::default()
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn subject_of(url: &str) -> &str {
        url.strip_prefix(ENDPOINT)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.split('.').next())
            .expect("url was built from the test endpoint")
    }

    #[test]
    fn subject_url_has_subject_and_limit() {
        assert_eq!(
            "http://catalog.test/subjects/horror.json?limit=50",
            config().subject_url("horror")
        );

        let trailing = FetchConfig {
            endpoint: format!("{ENDPOINT}/"),
            limit: 5,
            ..FetchConfig::default()
        };
        assert_eq!(
            "http://catalog.test/subjects/love.json?limit=5",
            trailing.subject_url("love")
        );
    }

    #[test]
    fn first_successful_round_wins() {
        let client = ScriptedClient::new([Ok(FANTASY.to_owned()), Ok(THREE_WORKS.to_owned())]);
        let fetcher = Fetcher::with_client(client, config());

        let books = fetcher
            .fetch_with(10, &mut rng(), &CancelToken::new())
            .unwrap();

        let urls = fetcher.client.urls();
        assert_eq!(1, urls.len(), "no further round after a success");
        assert_eq!(4, books.len());
        assert!(books.iter().all(|b| b.genre == subject_of(&urls[0])));
    }

    #[test]
    fn returns_at_most_the_desired_count_with_unique_ids() {
        let fetcher = Fetcher::with_client(ScriptedClient::new([Ok(FANTASY.to_owned())]), config());

        let books = fetcher.fetch_with(3, &mut rng(), &CancelToken::new()).unwrap();

        assert_eq!(3, books.len());
        assert!(books
            .iter()
            .all(|b| !b.title.is_empty() && !b.author.is_empty()));
        let ids = books.iter().map(|b| b.id).collect::<HashSet<_>>();
        assert_eq!(books.len(), ids.len());
        for rating in books.iter().filter_map(|b| b.rating) {
            assert!((3.0..=5.0).contains(&rating));
        }
    }

    #[test]
    fn late_success_after_empty_rounds() {
        let client = ScriptedClient::new([
            Ok(EMPTY.to_owned()),
            Ok(EMPTY.to_owned()),
            Ok(EMPTY.to_owned()),
            Ok(EMPTY.to_owned()),
            Ok(THREE_WORKS.to_owned()),
        ]);
        let fetcher = Fetcher::with_client(client, config());

        let books = fetcher
            .fetch_with(10, &mut rng(), &CancelToken::new())
            .unwrap();

        let urls = fetcher.client.urls();
        assert_eq!(5, urls.len());
        let last_subject = subject_of(&urls[4]);
        assert_eq!(
            vec!["Dune", "Solaris", "Foundation"],
            books.iter().map(|b| b.title.as_str()).collect::<Vec<_>>()
        );
        assert!(books.iter().all(|b| b.genre == last_subject));
        assert_eq!(None, books[2].year);
    }

    #[test]
    fn failing_status_every_round_is_exhausted() {
        let fetcher = Fetcher::with_client(MockClient::<StatusErrorProducer>::default(), config());

        let err = fetcher
            .fetch_with(10, &mut rng(), &CancelToken::new())
            .expect_err("every round fails");

        assert_eq!(ErrorKind::Exhausted, err.kind());
        assert_eq!(
            "Acquisition error: unable to fetch any books from the catalog",
            err.to_string()
        );
    }

    #[test]
    fn malformed_bodies_and_transport_errors_are_absorbed() {
        let client = ScriptedClient::new([
            Err(Error::new(ErrorKind::IO, "connection reset")),
            Ok(r#"{"docs": []}"#.to_owned()),
            Ok("<html>busy</html>".to_owned()),
            Ok(THREE_WORKS.to_owned()),
        ]);
        let fetcher = Fetcher::with_client(client, config());

        let books = fetcher
            .fetch_with(2, &mut rng(), &CancelToken::new())
            .unwrap();

        assert_eq!(4, fetcher.client.urls().len());
        assert_eq!(2, books.len());
    }

    #[test]
    fn stops_after_max_rounds() {
        let fetcher = Fetcher::with_client(
            ScriptedClient::new(std::iter::repeat_with(|| Ok(EMPTY.to_owned())).take(10)),
            config(),
        );

        let err = fetcher
            .fetch_with(1, &mut rng(), &CancelToken::new())
            .unwrap_err();

        assert_eq!(ErrorKind::Exhausted, err.kind());
        assert_eq!(5, fetcher.client.urls().len());
    }

    #[test]
    fn subjects_are_picked_from_the_configured_set() {
        let fetcher = Fetcher::with_client(<MockClient>::default(), config());

        let _ = fetcher.fetch_with(1, &mut rng(), &CancelToken::new());

        let url = crate::api::URL_SINK
            .with(|url| url.borrow().clone())
            .expect("at least one request was made");
        assert!(SUBJECTS.contains(&subject_of(&url)));
    }

    #[test]
    fn single_subject_is_always_used() {
        let config = FetchConfig {
            subjects: vec!["poetry".to_owned()],
            ..config()
        };
        let fetcher = Fetcher::with_client(MockClient::<StatusErrorProducer>::default(), config);

        let _ = fetcher.fetch_with(1, &mut rng(), &CancelToken::new());

        assert_url!("http://catalog.test/subjects/poetry.json?limit=50");
    }

    #[test]
    fn zero_count_is_rejected_before_any_request() {
        let fetcher = Fetcher::with_client(ScriptedClient::default(), config());

        let err = fetcher
            .fetch_with(0, &mut rng(), &CancelToken::new())
            .unwrap_err();

        assert_eq!(ErrorKind::InvalidInput, err.kind());
        assert!(fetcher.client.urls().is_empty());
    }

    #[test]
    fn empty_subject_set_is_rejected() {
        let config = FetchConfig {
            subjects: Vec::new(),
            ..config()
        };
        let fetcher = Fetcher::with_client(ScriptedClient::default(), config);

        let err = fetcher
            .fetch_with(1, &mut rng(), &CancelToken::new())
            .unwrap_err();

        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn cancelled_token_stops_before_the_first_request() {
        let fetcher = Fetcher::with_client(ScriptedClient::default(), config());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = fetcher.fetch_with(5, &mut rng(), &cancel).unwrap_err();

        assert_eq!(ErrorKind::Cancelled, err.kind());
        assert!(fetcher.client.urls().is_empty());
    }

    /// Cancels the shared token while its request is "in flight".
    struct CancellingClient {
        cancel: CancelToken,
        inner: ScriptedClient,
    }

    impl Client for CancellingClient {
        fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
            self.cancel.cancel();
            self.inner.get_json(url)
        }
    }

    #[test]
    fn cancel_during_request_discards_the_response() {
        let cancel = CancelToken::new();
        let client = CancellingClient {
            cancel: cancel.clone(),
            inner: ScriptedClient::new([Ok(THREE_WORKS.to_owned())]),
        };
        let fetcher = Fetcher::with_client(client, config());

        let err = fetcher.fetch_with(5, &mut rng(), &cancel).unwrap_err();

        assert_eq!(ErrorKind::Cancelled, err.kind());
        assert_eq!(1, fetcher.client.inner.urls().len(), "no retry after cancel");
    }

    /// Answer every connection on a local port with `status` and `body`.
    ///
    /// Returns the endpoint to fetch from and the number of connections answered so far.
    fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Cannot bind a local port");
        let addr = listener.local_addr().unwrap();
        let answered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&answered);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = stream.unwrap();
                let mut request = Vec::new();
                let mut buf = [0; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}/subjects"), answered)
    }

    fn http_fetcher(endpoint: String) -> Fetcher {
        let client = api::http_client(Duration::from_secs(5)).unwrap();
        Fetcher::with_client(
            client,
            FetchConfig {
                endpoint,
                ..FetchConfig::default()
            },
        )
    }

    #[test]
    fn unavailable_catalog_is_exhausted_even_with_a_valid_body() {
        let (endpoint, answered) = serve("503 Service Unavailable", THREE_WORKS);

        let err = http_fetcher(endpoint)
            .fetch_with(10, &mut rng(), &CancelToken::new())
            .expect_err("a 503 never yields books");

        assert_eq!(ErrorKind::Exhausted, err.kind());
        assert_eq!(5, answered.load(Ordering::SeqCst));
    }

    #[test]
    fn successful_status_is_read_as_works() {
        let (endpoint, answered) = serve("200 OK", THREE_WORKS);

        let books = http_fetcher(endpoint)
            .fetch_with(10, &mut rng(), &CancelToken::new())
            .unwrap();

        assert_eq!(3, books.len());
        assert_eq!(1, answered.load(Ordering::SeqCst));
    }
}
