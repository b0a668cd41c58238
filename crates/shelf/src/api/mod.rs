use std::time::Duration;

use serde::de::DeserializeOwned;

pub(crate) mod open_library;

/// A blocking HTTP client able to fetch JSON documents.
///
/// Any answer that is not a success status must be returned as an [`Err`] so callers never
/// have to look at the status themselves.
pub trait Client {
    /// GET the `url` and deserialize the body as `T`.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the request fails, the status is not a success or the body
    /// cannot be deserialized as `T`.
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned;
}

impl Client for reqwest::blocking::Client {
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .get(url)
            .send()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::new(
                ErrorKind::Status,
                format!("'{url}' responded with {status}"),
            ));
        }

        resp.json().map_err(|e| Error::wrap(ErrorKind::Deserialize, e))
    }
}

/// Build the default HTTP client with a request timeout.
///
/// # Errors
///
/// An [`Err`] is returned when the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::wrap_with(ErrorKind::IO, e, "Cannot build the HTTP client"))
}

#[cfg(test)]
pub(crate) use test::{
    assert_url, impl_text_producer, MockClient, Producer, ScriptedClient, StatusErrorProducer,
    URL_SINK,
};

use crate::{Error, ErrorKind};
