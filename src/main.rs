//! drive_fetch CLI - Download Google Drive files matching a name filter.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use drive_fetch::{Authenticator, DriveClient, FetchError, RetrievalConfig};

/// Download Google Drive files whose name contains a search term.
///
/// Native Google documents (Docs, Sheets, Slides) are exported to a concrete
/// format; all other files are downloaded verbatim.
#[derive(Parser)]
#[command(name = "drive_fetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name fragment files must contain to be downloaded.
    query: String,

    /// Local destination directory.
    #[arg(long, short = 't', default_value = ".")]
    to: PathBuf,

    /// Maximum number of files to retrieve.
    #[arg(long, default_value_t = 10)]
    page_size: u32,

    /// Path to the cached token file.
    #[arg(long, env = "DRIVE_TOKEN_FILE", default_value = "token.json")]
    token: PathBuf,

    /// Path to the OAuth client secrets JSON file.
    #[arg(long, env = "GOOGLE_CLIENT_SECRETS", default_value = "credentials.json")]
    credentials: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_credential() {
                tracing::error!("Could not obtain credentials: {}", e);
            } else {
                tracing::error!("An error occurred: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), FetchError> {
    let auth = Authenticator::new(&cli.token, &cli.credentials);
    let credential = auth.obtain().await?;

    std::fs::create_dir_all(&cli.to)?;

    let client = DriveClient::new(&credential);
    let config = RetrievalConfig {
        query: cli.query,
        page_size: cli.page_size,
        dest_dir: cli.to,
    };

    client.retrieve_matching(&config).await?;

    Ok(())
}
