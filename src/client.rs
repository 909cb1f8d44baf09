//! Google Drive API client for listing and retrieving files.

use std::path::{Path, PathBuf};

use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};

use crate::auth::Credential;
use crate::error::{FetchError, Result};
use crate::export::FileKind;
use crate::models::{ApiErrorResponse, FileDescriptor, FileListResponse};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Bytes requested per chunk of a download or export.
const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Configuration for one retrieval run.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Name fragment files must contain to be retrieved.
    pub query: String,
    /// Maximum number of files returned by the list call.
    pub page_size: u32,
    /// Directory output files are written into.
    pub dest_dir: PathBuf,
}

/// Client for retrieving files from Google Drive.
///
/// Holds a borrowed copy of the access token; credential refresh is the
/// [`Authenticator`](crate::auth::Authenticator)'s job and happens before a
/// client is constructed.
pub struct DriveClient {
    http: Client,
    base_url: String,
    access_token: String,
    chunk_size: usize,
}

impl DriveClient {
    /// Create a client from a valid credential.
    pub fn new(credential: &Credential) -> Self {
        Self::with_base_url(credential, DRIVE_API_BASE)
    }

    /// Create a client against a non-default API base URL.
    pub fn with_base_url(credential: &Credential, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            access_token: credential.access_token().to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the transfer chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// List one page of files whose name contains `name_contains`.
    ///
    /// A continuation token returned by the API is accepted but not followed.
    pub async fn search_files(
        &self,
        name_contains: &str,
        page_size: u32,
    ) -> Result<Vec<FileDescriptor>> {
        let query = name_contains_query(name_contains);
        let page_size = page_size.to_string();

        let response = self
            .http
            .get(format!("{}/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("fields", "nextPageToken, files(id, name, mimeType)"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(into_api_error(response).await);
        }

        let list: FileListResponse = response.json().await?;
        if list.next_page_token.is_some() {
            tracing::debug!("More results available; only the first page is retrieved");
        }

        Ok(list.files)
    }

    /// Retrieve every file matching the configuration into its directory.
    ///
    /// Returns the paths written. An empty result set is a normal outcome;
    /// any API error during listing or downloading ends the run.
    pub async fn retrieve_matching(&self, config: &RetrievalConfig) -> Result<Vec<PathBuf>> {
        let files = self
            .search_files(&config.query, config.page_size)
            .await?;

        if files.is_empty() {
            println!("No files found.");
            return Ok(Vec::new());
        }

        println!("Files:");
        let mut written = Vec::with_capacity(files.len());
        for file in &files {
            println!("{}", file);
            written.push(self.fetch_to_dir(file, &config.dest_dir).await?);
        }

        Ok(written)
    }

    /// Download or export one file into `dest_dir`.
    ///
    /// Native Google documents are exported to their mapped format and saved
    /// with a `.txt` suffix appended; everything else is fetched verbatim
    /// under its original name. The content is fully buffered and written in
    /// a single operation, so an interrupted transfer leaves no partial file.
    pub async fn fetch_to_dir(&self, file: &FileDescriptor, dest_dir: &Path) -> Result<PathBuf> {
        let kind = FileKind::classify(file.mime_type.as_deref());

        let bytes = match kind {
            FileKind::NativeDocument { export_mime } => {
                self.download_chunked(
                    format!("{}/files/{}/export", self.base_url, file.id),
                    &[("mimeType", export_mime)],
                )
                .await?
            }
            FileKind::Opaque => {
                self.download_chunked(
                    format!("{}/files/{}", self.base_url, file.id),
                    &[("alt", "media")],
                )
                .await?
            }
        };

        let path = dest_dir.join(kind.output_name(&file.name));
        tokio::fs::write(&path, &bytes).await?;
        println!("File '{}' downloaded successfully.", file.name);

        Ok(path)
    }

    /// Fetch a resource in sequential ranged chunks, reporting progress
    /// after each chunk, until the transfer is complete.
    async fn download_chunked(&self, url: String, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut total: Option<u64> = None;
        let mut done = false;

        while !done {
            let start = buffer.len() as u64;
            let end = start + self.chunk_size as u64 - 1;

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(query)
                .header(RANGE, format!("bytes={}-{}", start, end))
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::PARTIAL_CONTENT {
                if total.is_none() {
                    total = response
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(content_range_total);
                }

                let chunk = response.bytes().await?;
                let short_chunk = chunk.len() < self.chunk_size;
                buffer.extend_from_slice(&chunk);
                done = match total {
                    Some(total) => buffer.len() as u64 >= total,
                    None => short_chunk,
                };
            } else if status.is_success() {
                // Server ignored the range; the whole body is the one chunk.
                let body = response.bytes().await?;
                buffer.extend_from_slice(&body);
                done = true;
            } else {
                return Err(into_api_error(response).await);
            }

            println!(
                "Downloading {}%.",
                progress_percent(buffer.len() as u64, total, done)
            );
        }

        Ok(buffer)
    }
}

/// Build the Drive query string for a name-contains search.
fn name_contains_query(term: &str) -> String {
    format!("name contains '{}'", term.replace('\'', "\\'"))
}

/// Percentage complete for a transfer, given what is known about its size.
fn progress_percent(received: u64, total: Option<u64>, done: bool) -> u32 {
    match total {
        Some(total) if total > 0 => (((received as f64 / total as f64) * 100.0) as u32).min(100),
        _ => {
            if done {
                100
            } else {
                0
            }
        }
    }
}

/// Total size advertised by a Content-Range header, if known.
fn content_range_total(value: &str) -> Option<u64> {
    // "bytes 0-1048575/2097152"; the total may be "*" when unknown.
    value.rsplit('/').next()?.trim().parse().ok()
}

/// Decode a non-success response into a structured API error.
async fn into_api_error(response: reqwest::Response) -> FetchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
        return FetchError::Api {
            status: api_error.error.code,
            message: api_error.error.message,
        };
    }

    FetchError::Api {
        status: status.as_u16(),
        message: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_contains_query() {
        assert_eq!(name_contains_query("presale"), "name contains 'presale'");
    }

    #[test]
    fn test_name_contains_query_escapes_quotes() {
        assert_eq!(
            name_contains_query("o'brien"),
            "name contains 'o\\'brien'"
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(content_range_total("bytes 0-1048575/2097152"), Some(2097152));
        assert_eq!(content_range_total("bytes 0-99/100"), Some(100));
        assert_eq!(content_range_total("bytes 0-99/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn test_progress_percent_known_total() {
        assert_eq!(progress_percent(25, Some(100), false), 25);
        assert_eq!(progress_percent(60, Some(100), false), 60);
        assert_eq!(progress_percent(100, Some(100), true), 100);
    }

    #[test]
    fn test_progress_percent_never_exceeds_hundred() {
        assert_eq!(progress_percent(150, Some(100), true), 100);
    }

    #[test]
    fn test_progress_percent_unknown_total() {
        assert_eq!(progress_percent(512, None, false), 0);
        assert_eq!(progress_percent(512, None, true), 100);
    }
}
