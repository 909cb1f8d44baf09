//! drive_fetch - A CLI tool for downloading Google Drive files by name.
//!
//! This library provides functionality to:
//! - Obtain an OAuth2 user credential (cached, refreshed, or via the
//!   interactive installed-app consent flow)
//! - List files whose name contains a search term
//! - Download regular files, or export native Google documents, to disk
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use drive_fetch::{Authenticator, DriveClient, RetrievalConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), drive_fetch::FetchError> {
//!     let auth = Authenticator::new("token.json", "credentials.json");
//!     let credential = auth.obtain().await?;
//!
//!     let client = DriveClient::new(&credential);
//!     let config = RetrievalConfig {
//!         query: "presale".to_string(),
//!         page_size: 10,
//!         dest_dir: PathBuf::from("."),
//!     };
//!     client.retrieve_matching(&config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod export;
pub mod models;

// Re-exports for convenience
pub use auth::{Authenticator, ClientSecrets, Credential};
pub use client::{DriveClient, RetrievalConfig};
pub use error::{FetchError, Result};
pub use export::FileKind;
pub use models::FileDescriptor;
