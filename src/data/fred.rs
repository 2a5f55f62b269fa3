//! FRED download of the raw CPI text feed.

use std::path::Path;

use reqwest::blocking::{Client, Response};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::CpiConfig;
use crate::error::AppError;

/// Somewhere a CPI feed can be pulled from.
pub trait FeedSource {
    /// Fetch the whole feed body as text.
    fn fetch_text(&self, url: &str) -> Result<String, AppError>;

    /// Stream the feed body into `path`. On failure `path` is left as it was.
    fn download_to(&self, url: &str, path: &Path) -> Result<(), AppError>;
}

pub struct FredClient {
    client: Client,
}

impl FredClient {
    pub fn new(config: &CpiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response, AppError> {
        debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::Transport(format!("CPI request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Transport(format!(
                "CPI request failed with status {}.",
                resp.status()
            )));
        }
        Ok(resp)
    }
}

impl FeedSource for FredClient {
    fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        self.get(url)?
            .text()
            .map_err(|e| AppError::Transport(format!("Failed to read CPI response body: {e}")))
    }

    fn download_to(&self, url: &str, path: &Path) -> Result<(), AppError> {
        let mut resp = self.get(url)?;

        // Stage next to the destination so `persist` is a same-filesystem rename.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| AppError::io(dir, e))?;
        let bytes = resp
            .copy_to(staged.as_file_mut())
            .map_err(|e| AppError::Transport(format!("Failed to save CPI data to '{}': {e}", path.display())))?;
        staged.persist(path).map_err(|e| AppError::io(path, e.error))?;

        debug!("Saved {bytes} bytes of CPI data to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    /// Raw HTTP/1.1 response; `content_length` may lie about `body`.
    pub fn http_response(status: &str, content_length: usize, body: &str) -> Vec<u8> {
        format!("HTTP/1.1 {status}\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n{body}")
            .into_bytes()
    }

    /// Serve `response` to a single connection on localhost, then hang up.
    /// Returns the base URL.
    pub fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                let n = reader.read_line(&mut line).unwrap_or(0);
                if n == 0 || line == "\r\n" {
                    break;
                }
            }
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        });
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{http_response, serve_once};
    use super::*;
    use crate::data::CpiData;

    const FEED: &str = "DATE VALUE\n2000-01-01 100.0\n2001-01-01 108.0\n";

    fn client() -> FredClient {
        FredClient::new(&CpiConfig::default()).unwrap()
    }

    #[test]
    fn download_writes_whole_body() {
        let url = serve_once(http_response("200 OK", FEED.len(), FEED));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpi.txt");

        client().download_to(&url, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), FEED);
    }

    #[test]
    fn truncated_download_leaves_no_cache_behind() {
        let url = serve_once(http_response("200 OK", FEED.len() + 500, FEED));
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cpi.txt");

        let mut cpi = CpiData::new();
        let res = cpi.load_cached_or_remote(&client(), &cache, &url);

        assert!(matches!(res, Err(AppError::Transport(_))));
        assert!(!cache.exists());
        assert!(cpi.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "staging file must be cleaned up");
    }

    #[test]
    fn failed_download_keeps_existing_file() {
        let url = serve_once(http_response("200 OK", FEED.len() + 500, FEED));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpi.txt");
        std::fs::write(&path, "previous").unwrap();

        assert!(client().download_to(&url, &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn error_status_is_transport() {
        let url = serve_once(http_response("404 Not Found", 0, ""));
        assert!(matches!(client().fetch_text(&url), Err(AppError::Transport(_))));
    }
}
