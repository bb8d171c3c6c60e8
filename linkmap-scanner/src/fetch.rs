use crate::error::FetchError;
use reqwest::Client;
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

pub const USER_AGENT: &str = "Linkmap/0.1 (https://github.com/trapdoorsec/linkmap)";

/// Retrieves the raw body of a page.
pub trait Fetcher {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Plain GET over a pooled reqwest client. Status codes are not inspected.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;

        debug!(
            "Fetched {} ({} bytes, status {}) in {:?}",
            url,
            body.len(),
            status.as_u16(),
            start.elapsed()
        );

        Ok(body.to_vec())
    }
}

/// Sort a reqwest failure into the crawl's error taxonomy.
pub fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout(timeout);
    }

    if is_connection_closed(&err) {
        return FetchError::Closed(err.to_string());
    }

    FetchError::Transport(err)
}

fn is_connection_closed(err: &(dyn StdError + 'static)) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);

    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }

        // hyper reports a half-finished response this way
        if e.to_string().contains("connection closed before message completed") {
            return true;
        }

        source = e.source();
    }

    false
}
