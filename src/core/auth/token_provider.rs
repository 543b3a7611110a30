// Authentication port.
//
// The core layer only needs "give me a bearer token" plus the lifecycle
// operations the host can trigger (refresh, invalidate, logout). The infra
// layer decides where the token comes from.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// OAuth scopes requested for every credential type.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "credentials.json not found at path {}. Make sure to place it in the package's extra folder (extra/credentials.json)",
        .path.display()
    )]
    MissingCredentials { path: PathBuf },

    #[error("Invalid credentials file: {0}")]
    InvalidCredentials(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Explicit authentication context threaded through every client.
///
/// Implementations cache the access token internally; recreating it is
/// always safe.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid access token, acquiring or refreshing it if needed.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Forces a new access token regardless of the cached one.
    async fn refresh(&self) -> Result<String, AuthError>;

    /// Drops the cached access token so the next call re-acquires it.
    async fn invalidate(&self);

    /// Revokes the stored grant. Returns whether the revocation succeeded.
    async fn revoke(&self) -> Result<bool, AuthError>;
}

/// Shared handle passed to clients and services.
pub type AuthContext = Arc<dyn TokenProvider>;
