//! Async download of a release asset, following redirects explicitly.
//!
//! The body is streamed to disk chunk by chunk; nothing holds the whole
//! payload in memory.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Redirect hops followed when the caller does not say otherwise.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request Failed. Status Code: {status} from {url}")]
    Status { status: u16, url: String },

    #[error("redirect from {url} has no usable Location header")]
    MissingLocation { url: String },

    #[error("gave up after {hops} redirects starting at {url}")]
    TooManyRedirects { hops: usize, url: String },

    #[error("no data received for {} seconds from {url}", .idle.as_secs())]
    Stalled { idle: Duration, url: String },
}

/// Request for a download operation
#[derive(Debug)]
pub struct DownloadRequest<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub dest: &'a Path,
    pub max_redirects: usize,
    pub idle_timeout: Duration,
}

impl<'a> DownloadRequest<'a> {
    pub fn new(client: &'a Client, url: &'a str, dest: &'a Path) -> Self {
        Self {
            client,
            url,
            dest,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Execute the download, returning the number of bytes written.
    ///
    /// `200` streams the body to `dest`; `302` re-issues the request against
    /// `Location` (resolved relative to the responding URL) up to
    /// `max_redirects` times; any other status fails. Each hop must produce
    /// response headers, and the body must keep producing data, within
    /// `idle_timeout`.
    pub async fn execute(self) -> Result<u64, DownloadError> {
        let mut current = self.url.to_string();

        for hop in 0..=self.max_redirects {
            // A peer that accepts but never answers counts as stalled too.
            let request = self
                .client
                .get(current.as_str())
                .header(ACCEPT, "application/octet-stream")
                .send();
            let response = match timeout(self.idle_timeout, request).await {
                Ok(response) => response?,
                Err(_) => {
                    return Err(DownloadError::Stalled {
                        idle: self.idle_timeout,
                        url: current,
                    });
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let written = write_body(response, self.dest, self.idle_timeout).await?;
                    tracing::info!("download done ({written} bytes)");
                    return Ok(written);
                }
                StatusCode::FOUND => {
                    current = redirect_target(&response)?;
                    tracing::info!("redirected to get asset");
                    tracing::debug!("redirect hop {} -> {current}", hop + 1);
                }
                status => {
                    return Err(DownloadError::Status {
                        status: status.as_u16(),
                        url: current,
                    });
                }
            }
        }

        Err(DownloadError::TooManyRedirects {
            hops: self.max_redirects,
            url: self.url.to_string(),
        })
    }
}

fn redirect_target(response: &Response) -> Result<String, DownloadError> {
    let missing = || DownloadError::MissingLocation {
        url: response.url().to_string(),
    };
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(missing)?;
    let next = response.url().join(location).map_err(|_| missing())?;
    Ok(next.to_string())
}

async fn write_body(
    response: Response,
    dest: &Path,
    idle_timeout: Duration,
) -> Result<u64, DownloadError> {
    let url = response.url().to_string();
    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    loop {
        let chunk = match timeout(idle_timeout, stream.next()).await {
            Ok(Some(chunk)) => chunk?,
            Ok(None) => break,
            Err(_) => {
                return Err(DownloadError::Stalled {
                    idle: idle_timeout,
                    url,
                });
            }
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client() -> Client {
        crate::Config::default().http_client().unwrap()
    }

    #[tokio::test]
    async fn writes_200_body_byte_for_byte() {
        let mut server = Server::new_async().await;
        let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024 + 7).collect();
        let mock = server
            .mock("GET", "/asset")
            .match_header("accept", "application/octet-stream")
            .with_status(200)
            .with_body(&payload)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/asset", server.url());
        let written = DownloadRequest::new(&client(), &url, &dest)
            .execute()
            .await
            .unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn follows_302_chain_to_final_payload() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let first = server
            .mock("GET", "/api/asset")
            .with_status(302)
            .with_header("location", &format!("{base}/hop"))
            .create_async()
            .await;
        // Relative Location is resolved against the responding URL.
        let second = server
            .mock("GET", "/hop")
            .with_status(302)
            .with_header("location", "/storage/blob?sig=abc")
            .create_async()
            .await;
        let last = server
            .mock("GET", "/storage/blob")
            .match_query(Matcher::UrlEncoded("sig".into(), "abc".into()))
            .match_header("accept", "application/octet-stream")
            .with_status(200)
            .with_body("final bytes")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{base}/api/asset");
        DownloadRequest::new(&client(), &url, &dest)
            .execute()
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"final bytes");
        first.assert_async().await;
        second.assert_async().await;
        last.assert_async().await;
    }

    #[tokio::test]
    async fn endless_redirects_fail_within_hop_bound() {
        let mut server = Server::new_async().await;
        let looping = server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", "/loop")
            .expect(3)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/loop", server.url());
        let err = DownloadRequest::new(&client(), &url, &dest)
            .with_max_redirects(2)
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TooManyRedirects { hops: 2, .. }));
        assert!(!dest.exists());
        looping.assert_async().await;
    }

    #[tokio::test]
    async fn other_statuses_fail_with_code() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/gone", server.url());
        let err = DownloadRequest::new(&client(), &url, &dest)
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn only_302_is_treated_as_redirect() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/moved")
            .with_status(301)
            .with_header("location", "/elsewhere")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/moved", server.url());
        let err = DownloadRequest::new(&client(), &url, &dest)
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 301, .. }));
    }

    #[tokio::test]
    async fn redirect_without_location_fails() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/nowhere")
            .with_status(302)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("{}/nowhere", server.url());
        let err = DownloadRequest::new(&client(), &url, &dest)
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::MissingLocation { .. }));
    }

    #[tokio::test]
    async fn silent_server_stalls_instead_of_hanging() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let holder = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let url = format!("http://{addr}/asset");
        let client = client();
        let result = timeout(
            Duration::from_secs(10),
            DownloadRequest::new(&client, &url, &dest)
                .with_idle_timeout(Duration::from_secs(1))
                .execute(),
        )
        .await
        .expect("download should give up on its own");

        assert!(matches!(result, Err(DownloadError::Stalled { .. })));
        holder.abort();
    }
}
