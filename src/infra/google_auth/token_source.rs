// =============================================================================
// GOOGLE OAUTH2 TOKEN SOURCE
// =============================================================================
//
// Implements the core `TokenProvider` for every supported credential file:
//
// 1. **Service account:** signs a JWT (RS256) and exchanges it at the token
//    endpoint. The spreadsheets must be shared with the service account email.
// 2. **Authorized user:** exchanges the stored refresh token.
// 3. **Installed (desktop) client:** uses the refresh token kept in the token
//    cache file; the first run opens the browser for consent and writes that
//    cache.
//
// Access tokens are cached in memory and refreshed a minute before expiry.

use super::credentials::{
    AuthorizedUserCredentials, Credentials, InstalledAppSecrets, ServiceAccountCredentials,
    REVOKE_URI,
};
use super::installed_flow;
use crate::core::auth::{AuthError, TokenProvider, SCOPES};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{OnceCell, RwLock};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REFRESH_MARGIN_SECS: i64 = 60;

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    /// Issuer (service account email).
    iss: String,

    /// Space separated scopes.
    scope: String,

    /// Audience (token endpoint).
    aud: String,

    /// Issued at (Unix timestamp).
    iat: i64,

    /// Expiration (Unix timestamp, max 1 hour from iat).
    exp: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    /// Only present on the first authorization of an installed client.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn from_response(response: &TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            token: response.access_token.clone(),
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

pub struct GoogleAuth {
    credentials_path: PathBuf,
    /// Loaded on first use, so input validation runs before the file is read.
    credentials: OnceCell<Credentials>,
    token_cache: PathBuf,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
    /// Refresh token of an installed client, once known.
    user_grant: RwLock<Option<AuthorizedUserCredentials>>,
}

impl GoogleAuth {
    /// Reads the credentials file lazily. `token_cache` is only used by
    /// installed clients.
    pub fn from_file(credentials_path: PathBuf, token_cache: PathBuf) -> Self {
        Self::build(credentials_path, OnceCell::new(), token_cache)
    }

    pub fn with_credentials(credentials: Credentials, token_cache: PathBuf) -> Self {
        Self::build(PathBuf::new(), OnceCell::new_with(Some(credentials)), token_cache)
    }

    fn build(
        credentials_path: PathBuf,
        credentials: OnceCell<Credentials>,
        token_cache: PathBuf,
    ) -> Self {
        Self {
            credentials_path,
            credentials,
            token_cache,
            client: Client::new(),
            cached_token: RwLock::new(None),
            user_grant: RwLock::new(None),
        }
    }

    async fn credentials(&self) -> Result<&Credentials, AuthError> {
        self.credentials
            .get_or_try_init(|| async {
                let credentials = Credentials::load(&self.credentials_path).await?;
                tracing::debug!(
                    "Loaded {} credentials from {}",
                    credentials.kind(),
                    self.credentials_path.display()
                );
                Ok(credentials)
            })
            .await
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, AuthError> {
        match self.credentials().await? {
            Credentials::ServiceAccount(account) => self.exchange_jwt(account).await,
            Credentials::AuthorizedUser(user) => self.exchange_refresh_token(user).await,
            Credentials::Installed(app) => {
                if let Some(grant) = self.stored_grant(app).await? {
                    return self.exchange_refresh_token(&grant).await;
                }

                let response = installed_flow::authorize(&self.client, app).await?;
                match &response.refresh_token {
                    Some(refresh_token) => {
                        let grant = AuthorizedUserCredentials {
                            client_id: app.client_id.clone(),
                            client_secret: app.client_secret.clone(),
                            refresh_token: refresh_token.clone(),
                            token_uri: app.token_uri.clone(),
                        };
                        self.store_grant(grant).await?;
                    }
                    None => tracing::warn!("Authorization returned no refresh token"),
                }
                Ok(response)
            }
        }
    }

    async fn exchange_jwt(
        &self,
        account: &ServiceAccountCredentials,
    ) -> Result<TokenResponse, AuthError> {
        let now = Utc::now().timestamp();

        let claims = JwtClaims {
            iss: account.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: account.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidCredentials(format!("bad private key: {}", e)))?;
        let jwt = encode(&header, &claims, &key)
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        self.post_token_form(
            &account.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())],
        )
        .await
    }

    async fn exchange_refresh_token(
        &self,
        user: &AuthorizedUserCredentials,
    ) -> Result<TokenResponse, AuthError> {
        self.post_token_form(
            &user.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ],
        )
        .await
    }

    async fn post_token_form(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("({}): {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))
    }

    /// The installed client's grant, from memory or from the token cache.
    async fn stored_grant(
        &self,
        app: &InstalledAppSecrets,
    ) -> Result<Option<AuthorizedUserCredentials>, AuthError> {
        if let Some(grant) = self.user_grant.read().await.as_ref() {
            return Ok(Some(grant.clone()));
        }

        if !self.token_cache.exists() {
            return Ok(None);
        }

        match Credentials::load(&self.token_cache).await {
            Ok(Credentials::AuthorizedUser(grant)) if grant.client_id == app.client_id => {
                *self.user_grant.write().await = Some(grant.clone());
                Ok(Some(grant))
            }
            Ok(_) => {
                tracing::warn!(
                    "Ignoring token cache {} issued for another client",
                    self.token_cache.display()
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable token cache: {}", e);
                Ok(None)
            }
        }
    }

    async fn store_grant(&self, grant: AuthorizedUserCredentials) -> Result<(), AuthError> {
        if let Some(parent) = self.token_cache.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.token_cache, grant.to_json()?).await?;
        tracing::info!("Stored Google authorization in {}", self.token_cache.display());

        *self.user_grant.write().await = Some(grant);
        Ok(())
    }

    async fn post_revoke(&self, token: &str) -> Result<bool, AuthError> {
        let response = self
            .client
            .post(REVOKE_URI)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if response.status().is_success() {
            Ok(true)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Token revocation rejected ({}): {}", status, text);
            Ok(false)
        }
    }
}

#[async_trait]
impl TokenProvider for GoogleAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(Utc::now()) {
                    return Ok(token.token.clone());
                }
            }
        }

        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let response = self.fetch_new_token().await?;
        let token = response.access_token.clone();

        *self.cached_token.write().await = Some(CachedToken::from_response(&response, Utc::now()));
        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    async fn revoke(&self) -> Result<bool, AuthError> {
        let revoked = match self.credentials().await? {
            // Nothing was granted by a user.
            Credentials::ServiceAccount(_) => true,
            Credentials::AuthorizedUser(user) => self.post_revoke(&user.refresh_token).await?,
            Credentials::Installed(app) => {
                let revoked = match self.stored_grant(app).await? {
                    Some(grant) => self.post_revoke(&grant.refresh_token).await?,
                    None => true,
                };

                *self.user_grant.write().await = None;
                if self.token_cache.exists() {
                    tokio::fs::remove_file(&self.token_cache).await?;
                    tracing::info!("Removed token cache {}", self.token_cache.display());
                }
                revoked
            }
        };

        self.invalidate().await;
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google_auth::credentials::{DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI};
    use tempfile::tempdir;

    fn installed() -> Credentials {
        Credentials::Installed(InstalledAppSecrets {
            client_id: "desktop-client".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        })
    }

    fn grant(client_id: &str) -> AuthorizedUserCredentials {
        AuthorizedUserCredentials {
            client_id: client_id.to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "1//stored".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    fn app_secrets(credentials: &Credentials) -> &InstalledAppSecrets {
        match credentials {
            Credentials::Installed(app) => app,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_token_response_defaults() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "ya29.x", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(response.expires_in, 3600);
        assert!(response.refresh_token.is_none());
    }

    #[test]
    fn test_cached_token_refreshes_early() {
        let now = Utc::now();
        let response = TokenResponse {
            access_token: "t".to_string(),
            expires_in: 3599,
            refresh_token: None,
        };
        let cached = CachedToken::from_response(&response, now);

        assert!(cached.is_fresh(now));
        assert!(cached.is_fresh(now + Duration::seconds(3500)));
        assert!(!cached.is_fresh(now + Duration::seconds(3540)));
    }

    #[tokio::test]
    async fn test_cached_token_served_without_network() {
        let dir = tempdir().unwrap();
        let auth = GoogleAuth::with_credentials(installed(), dir.path().join("token.json"));
        *auth.cached_token.write().await = Some(CachedToken {
            token: "cached".to_string(),
            expires_at: Utc::now() + Duration::minutes(30),
        });

        assert_eq!(auth.access_token().await.unwrap(), "cached");

        auth.invalidate().await;
        assert!(auth.cached_token.read().await.is_none());
    }

    #[tokio::test]
    async fn test_grant_persisted_and_reloaded() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("nested").join("token.json");
        let credentials = installed();

        let auth = GoogleAuth::with_credentials(credentials.clone(), cache.clone());
        auth.store_grant(grant("desktop-client")).await.unwrap();
        assert!(cache.exists());

        let reloaded = GoogleAuth::with_credentials(credentials.clone(), cache);
        let stored = reloaded
            .stored_grant(app_secrets(&credentials))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.refresh_token, "1//stored");
    }

    #[tokio::test]
    async fn test_grant_for_other_client_ignored() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("token.json");
        tokio::fs::write(&cache, grant("someone-else").to_json().unwrap())
            .await
            .unwrap();

        let credentials = installed();
        let auth = GoogleAuth::with_credentials(credentials.clone(), cache);
        assert!(auth
            .stored_grant(app_secrets(&credentials))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revoke_without_grant_clears_state() {
        let dir = tempdir().unwrap();
        let auth = GoogleAuth::with_credentials(installed(), dir.path().join("token.json"));
        *auth.cached_token.write().await = Some(CachedToken {
            token: "cached".to_string(),
            expires_at: Utc::now() + Duration::minutes(30),
        });

        assert!(auth.revoke().await.unwrap());
        assert!(auth.cached_token.read().await.is_none());
    }

    #[tokio::test]
    async fn test_service_account_revoke_is_noop() {
        let credentials = Credentials::ServiceAccount(ServiceAccountCredentials {
            client_email: "bot@project.iam.gserviceaccount.com".to_string(),
            private_key: "not a key".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        });
        let auth = GoogleAuth::with_credentials(credentials, PathBuf::from("unused.json"));

        assert!(auth.revoke().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_fails_on_first_use() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("credentials.json");
        let auth = GoogleAuth::from_file(missing.clone(), dir.path().join("token.json"));

        match auth.access_token().await {
            Err(AuthError::MissingCredentials { path }) => assert_eq!(path, missing),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_private_key_reported() {
        let credentials = Credentials::ServiceAccount(ServiceAccountCredentials {
            client_email: "bot@project.iam.gserviceaccount.com".to_string(),
            private_key: "not a key".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        });
        let auth = GoogleAuth::with_credentials(credentials, PathBuf::from("unused.json"));

        assert!(matches!(
            auth.access_token().await,
            Err(AuthError::InvalidCredentials(_))
        ));
    }
}
