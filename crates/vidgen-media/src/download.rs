//! Streaming HTTP download of remote media to disk.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Download a URL to a local file, streaming chunks to disk.
///
/// The whole transfer is bounded by `timeout`; on expiry the partial
/// file is removed and the call fails with
/// [`MediaError::DownloadTimeout`]. A non-success HTTP status fails
/// with [`MediaError::DownloadFailed`].
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    output: &Path,
    timeout: Duration,
) -> MediaResult<()> {
    let transfer = async {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MediaError::download_failed(format!(
                "server returned {} for {}",
                response.status(),
                url
            )));
        }

        let mut file = File::create(output).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| MediaError::download_failed(format!("read failed: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    };

    match tokio::time::timeout(timeout, transfer).await {
        Ok(Ok(written)) => {
            info!(
                url,
                output = %output.display(),
                size_mb = written as f64 / (1024.0 * 1024.0),
                "Downloaded file"
            );
            Ok(())
        }
        Ok(Err(e)) => {
            let _ = tokio::fs::remove_file(output).await;
            Err(e)
        }
        Err(_) => {
            let _ = tokio::fs::remove_file(output).await;
            Err(MediaError::DownloadTimeout(timeout.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("audio.mp3");
        let client = reqwest::Client::new();

        download_to_file(
            &client,
            &format!("{}/audio.mp3", server.uri()),
            &out,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"mp3-bytes");
    }

    #[tokio::test]
    async fn test_download_http_error_removes_partial_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("missing.mp3");
        let client = reqwest::Client::new();

        let err = download_to_file(
            &client,
            &format!("{}/missing.mp3", server.uri()),
            &out,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_download_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.mp3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"slow".to_vec())
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("slow.mp3");
        let client = reqwest::Client::new();

        let err = download_to_file(
            &client,
            &format!("{}/slow.mp3", server.uri()),
            &out,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::DownloadTimeout(_)));
        assert!(!out.exists());
    }
}
