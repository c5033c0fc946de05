//! Release asset lookup against the release-metadata endpoint.

use std::time::Duration;

use launchpad_schema::ReleaseMetadata;
use reqwest::{Client, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed. Status code {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid release metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No asset {name} found")]
    AssetNotFound { name: String },
}

/// Fetch and parse the release metadata at `url`.
///
/// Anything but `200 OK` is a failure; the body of a failed response is
/// discarded.
pub async fn fetch_release(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<ReleaseMetadata, LocateError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(LocateError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Resolve the download URL of the asset named exactly `asset_name`.
pub async fn locate_asset(
    client: &Client,
    url: &str,
    asset_name: &str,
    timeout: Duration,
) -> Result<String, LocateError> {
    let release = fetch_release(client, url, timeout).await?;
    tracing::debug!(
        "Release {} lists {} assets",
        release.tag_name.as_deref().unwrap_or("<untagged>"),
        release.assets.len()
    );

    let asset = release
        .find_asset(asset_name)
        .ok_or_else(|| LocateError::AssetNotFound {
            name: asset_name.to_string(),
        })?;

    tracing::info!("determine {} for asset {}", asset.url, asset_name);
    Ok(asset.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client() -> Client {
        crate::Config::default().http_client().unwrap()
    }

    #[tokio::test]
    async fn returns_url_of_matching_asset_regardless_of_order() {
        let mut server = Server::new_async().await;
        let body = r#"{
            "tag_name": "v1.0",
            "assets": [
                { "name": "proj-windows-amd64.zip", "url": "https://api.example.com/a/3" },
                { "name": "proj-linux-arm64.zip", "url": "https://api.example.com/a/2" },
                { "name": "proj-linux-amd64.zip", "url": "https://api.example.com/a/1" },
                { "name": "notes.txt", "url": "https://api.example.com/a/4" }
            ]
        }"#;
        let mock = server
            .mock("GET", "/releases/tags/v1.0")
            .match_header("user-agent", Matcher::Regex("^launchpad/".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let url = format!("{}/releases/tags/v1.0", server.url());
        let found = locate_asset(&client(), &url, "proj-linux-amd64.zip", TIMEOUT)
            .await
            .unwrap();

        assert_eq!(found, "https://api.example.com/a/1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_asset_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/release")
            .with_status(200)
            .with_body(r#"{ "assets": [ { "name": "other.zip", "url": "u" } ] }"#)
            .create_async()
            .await;

        let url = format!("{}/release", server.url());
        let err = locate_asset(&client(), &url, "proj-linux-amd64.zip", TIMEOUT)
            .await
            .unwrap_err();

        assert!(
            matches!(err, LocateError::AssetNotFound { ref name } if name == "proj-linux-amd64.zip")
        );
    }

    #[tokio::test]
    async fn non_200_status_is_a_remote_request_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/release")
            .with_status(403)
            .with_body("rate limited")
            .create_async()
            .await;

        let url = format!("{}/release", server.url());
        let err = fetch_release(&client(), &url, TIMEOUT).await.unwrap_err();

        assert!(matches!(err, LocateError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn redirect_on_metadata_is_not_followed() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/release")
            .with_status(302)
            .with_header("location", "/elsewhere")
            .create_async()
            .await;

        let url = format!("{}/release", server.url());
        let err = fetch_release(&client(), &url, TIMEOUT).await.unwrap_err();

        assert!(matches!(err, LocateError::Status { status: 302, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/release")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let url = format!("{}/release", server.url());
        let err = fetch_release(&client(), &url, TIMEOUT).await.unwrap_err();

        assert!(matches!(err, LocateError::Parse(_)));
    }
}
