//! OAuth2 credential management for the Google Drive API.
//!
//! Produces a valid access credential by loading a cached token bundle,
//! refreshing it when expired, or running the interactive installed-app
//! consent flow against a loopback redirect listener.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::error::{FetchError, Result};

/// OAuth2 authorization endpoint.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scope requested for all operations.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Safety buffer applied before the nominal expiry instant.
const EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Response served to the browser once the redirect has been captured.
const CONSENT_DONE_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body>Authorization complete. You may close this window.</body></html>";

/// Token bundle granting scoped access to the Drive API.
///
/// Carries the client identity and token endpoint alongside the tokens so a
/// refresh can run from the cache alone, without the client secrets file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub expiry: DateTime<Utc>,
}

impl Credential {
    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.expiry < Utc::now() + Duration::minutes(EXPIRY_BUFFER_MINUTES)
    }

    /// Whether the granted scopes cover `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn access_token(&self) -> &str {
        &self.token
    }
}

/// Client identity for the OAuth2 installed-application flow.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

/// Contents of the client secrets configuration file.
#[derive(Debug, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledApp,
}

impl ClientSecrets {
    /// Load client secrets from a JSON file in Google's "installed app" format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| FetchError::ClientSecrets(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| FetchError::ClientSecrets(format!("{}: {}", path.display(), e)))
    }
}

/// Credential manager over the token cache and the consent flow.
pub struct Authenticator {
    token_path: PathBuf,
    secrets_path: PathBuf,
}

impl Authenticator {
    /// Create an authenticator over a token cache file and a client secrets
    /// file. The secrets file is only read if the consent flow must run.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(token_path: P, secrets_path: Q) -> Self {
        Self {
            token_path: token_path.into(),
            secrets_path: secrets_path.into(),
        }
    }

    /// Produce a valid, authorized credential.
    ///
    /// Tries the cache first, then a refresh-token exchange, then the
    /// interactive consent flow. The credential is re-persisted to the cache
    /// whenever it was newly obtained or refreshed.
    pub async fn obtain(&self) -> Result<Credential> {
        if let Some(cached) = self.load_cached() {
            if !cached.is_expired() {
                tracing::debug!("Using cached credential");
                return Ok(cached);
            }

            if cached.refresh_token.is_some() {
                match self.refresh(&cached).await {
                    Ok(credential) => {
                        self.persist(&credential)?;
                        return Ok(credential);
                    }
                    Err(e) => {
                        tracing::warn!("Token refresh failed, running consent flow: {}", e);
                    }
                }
            }
        }

        let credential = self.consent().await?;
        self.persist(&credential)?;
        Ok(credential)
    }

    /// Load the cached credential, treating any structural problem as absence.
    fn load_cached(&self) -> Option<Credential> {
        let content = match fs::read_to_string(&self.token_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %self.token_path.display(), "No token cache: {}", e);
                return None;
            }
        };

        let credential: Credential = match serde_json::from_str(&content) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(path = %self.token_path.display(), "Ignoring malformed token cache: {}", e);
                return None;
            }
        };

        if !credential.has_scope(DRIVE_SCOPE) {
            tracing::warn!("Cached credential does not grant the required scope");
            return None;
        }

        Some(credential)
    }

    /// Overwrite the token cache with `credential`.
    fn persist(&self, credential: &Credential) -> Result<()> {
        fs::write(&self.token_path, serde_json::to_string_pretty(credential)?)?;
        tracing::info!(path = %self.token_path.display(), "Saved credentials");
        Ok(())
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, cached: &Credential) -> Result<Credential> {
        let refresh_token = cached
            .refresh_token
            .as_ref()
            .ok_or_else(|| FetchError::Credential("No refresh token available".to_string()))?;

        let client = oauth_client(
            &cached.client_id,
            &cached.client_secret,
            GOOGLE_AUTH_URL,
            &cached.token_uri,
            None,
        )?;

        tracing::info!("Refreshing expired access token");

        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| FetchError::Credential(format!("Token refresh failed: {}", e)))?;

        Ok(credential_from_response(
            &token_result,
            cached.client_id.clone(),
            cached.client_secret.clone(),
            cached.token_uri.clone(),
            Some(refresh_token.clone()),
        ))
    }

    /// Run the interactive consent flow.
    ///
    /// Blocks until the user approves or declines access in the browser.
    async fn consent(&self) -> Result<Credential> {
        let secrets = ClientSecrets::from_file(&self.secrets_path)?;
        let app = secrets.installed;

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let redirect_url = format!("http://127.0.0.1:{}", port);

        let client = oauth_client(
            &app.client_id,
            &app.client_secret,
            &app.auth_uri,
            &app.token_uri,
            Some(redirect_url),
        )?;

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        println!("Opening browser for authorization. If nothing happens, visit:");
        println!("{}", auth_url);
        if let Err(e) = open::that(auth_url.as_str()) {
            tracing::debug!("Could not open browser: {}", e);
        }

        let (code, state) = wait_for_redirect(&listener).await?;
        if state != *csrf_token.secret() {
            return Err(FetchError::Credential(
                "Authorization state mismatch".to_string(),
            ));
        }

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| FetchError::Credential(format!("Token exchange failed: {}", e)))?;

        Ok(credential_from_response(
            &token_result,
            app.client_id,
            app.client_secret,
            app.token_uri,
            None,
        ))
    }
}

/// Build an OAuth2 client for the given endpoints.
fn oauth_client(
    client_id: &str,
    client_secret: &str,
    auth_uri: &str,
    token_uri: &str,
    redirect_url: Option<String>,
) -> Result<BasicClient> {
    let mut client = BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.to_string())),
        AuthUrl::new(auth_uri.to_string())
            .map_err(|e| FetchError::Credential(format!("Invalid auth URL: {}", e)))?,
        Some(
            TokenUrl::new(token_uri.to_string())
                .map_err(|e| FetchError::Credential(format!("Invalid token URL: {}", e)))?,
        ),
    );

    if let Some(redirect_url) = redirect_url {
        client = client.set_redirect_uri(
            RedirectUrl::new(redirect_url)
                .map_err(|e| FetchError::Credential(format!("Invalid redirect URL: {}", e)))?,
        );
    }

    Ok(client)
}

/// Assemble a credential from a token endpoint response.
///
/// Refresh responses may omit the refresh token; the previous one is kept.
fn credential_from_response(
    token_result: &BasicTokenResponse,
    client_id: String,
    client_secret: String,
    token_uri: String,
    previous_refresh_token: Option<String>,
) -> Credential {
    let refresh_token = token_result
        .refresh_token()
        .map(|t| t.secret().clone())
        .or(previous_refresh_token);

    let expires_in = token_result
        .expires_in()
        .unwrap_or_else(|| std::time::Duration::from_secs(3600));
    let expiry = Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

    Credential {
        token: token_result.access_token().secret().clone(),
        refresh_token,
        token_uri,
        client_id,
        client_secret,
        scopes: vec![DRIVE_SCOPE.to_string()],
        expiry,
    }
}

/// Accept one connection on the loopback listener and extract the redirect
/// parameters, answering the browser with a completion page.
async fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String)> {
    let (mut stream, _) = listener.accept().await?;

    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&mut stream);
        reader.read_line(&mut request_line).await?;
    }

    let parsed = parse_redirect(&request_line);

    stream.write_all(CONSENT_DONE_PAGE.as_bytes()).await?;
    stream.flush().await?;

    parsed
}

/// Extract the `code` and `state` parameters from the redirect request line.
fn parse_redirect(request_line: &str) -> Result<(String, String)> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| FetchError::Credential("Malformed redirect request".to_string()))?;

    let url = Url::parse(&format!("http://127.0.0.1{}", path))
        .map_err(|e| FetchError::Credential(format!("Invalid redirect URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(FetchError::Credential(format!(
                    "Authorization was denied: {}",
                    value
                )))
            }
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(FetchError::Credential(
            "Redirect is missing code or state".to_string(),
        )),
    }
}
