//! Blocking HTTP access to the outside world.
//!
//! Everything that touches the network goes through [`Fetcher`] so the cache,
//! the resolver and the downloader can be exercised against scripted responses.

use crate::types::Result;
use reqwest::blocking::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("proxy-tools/", env!("CARGO_PKG_VERSION"));

/// A completed HTTP exchange. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single blocking GET.
///
/// Transport failures (DNS, connection reset, timeout) are errors; an HTTP
/// error status is returned as a normal [`HttpResponse`].
pub trait Fetcher {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

/// [`Fetcher`] backed by a `reqwest` blocking client
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json;q=0.9,*/*;q=0.8")
            .send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
