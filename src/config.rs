// Environment-driven configuration.
//
// `main.rs` loads `.env` through dotenv first, so every value below can come
// from the process environment or from that file.

use std::path::{Path, PathBuf};

pub const CREDENTIALS_ENV: &str = "GOOGLE_SHEETS_CREDENTIALS";
pub const TOKEN_CACHE_ENV: &str = "GOOGLE_SHEETS_TOKEN_CACHE";
pub const APPLICATION_NAME_ENV: &str = "GOOGLE_SHEETS_APPLICATION_NAME";

pub const DEFAULT_APPLICATION_NAME: &str = "BIM One Google Sheets";
const TOKEN_CACHE_FILE: &str = "token.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Service account key, authorized user file or desktop client secrets.
    pub credentials_path: PathBuf,
    /// Where the desktop flow keeps its refresh token.
    pub token_cache_path: PathBuf,
    /// Sent as the User-Agent on every API call.
    pub application_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credentials_path = get(CREDENTIALS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_credentials_path);

        let token_cache_path = get(TOKEN_CACHE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| token_cache_beside(&credentials_path));

        let application_name =
            get(APPLICATION_NAME_ENV).unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());

        Self {
            credentials_path,
            token_cache_path,
            application_name,
        }
    }
}

/// `<exe dir>/../extra/credentials.json`, the packaged location.
pub fn default_credentials_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    exe_dir.join("..").join("extra").join("credentials.json")
}

fn token_cache_beside(credentials_path: &Path) -> PathBuf {
    match credentials_path.parent() {
        Some(dir) => dir.join(TOKEN_CACHE_FILE),
        None => PathBuf::from(TOKEN_CACHE_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config
            .credentials_path
            .ends_with(Path::new("..").join("extra").join("credentials.json")));
        assert_eq!(
            config.token_cache_path,
            config.credentials_path.parent().unwrap().join("token.json")
        );
        assert_eq!(config.application_name, DEFAULT_APPLICATION_NAME);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (CREDENTIALS_ENV, "/etc/sheets/client.json"),
            (APPLICATION_NAME_ENV, "Revit Export"),
        ]);
        assert_eq!(config.credentials_path, PathBuf::from("/etc/sheets/client.json"));
        assert_eq!(config.token_cache_path, PathBuf::from("/etc/sheets/token.json"));
        assert_eq!(config.application_name, "Revit Export");

        let config = config_from(&[
            (CREDENTIALS_ENV, "/etc/sheets/client.json"),
            (TOKEN_CACHE_ENV, "/var/cache/sheets-token.json"),
        ]);
        assert_eq!(
            config.token_cache_path,
            PathBuf::from("/var/cache/sheets-token.json")
        );
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = config_from(&[(APPLICATION_NAME_ENV, "   "), (CREDENTIALS_ENV, "")]);
        assert_eq!(config.application_name, DEFAULT_APPLICATION_NAME);
        assert!(config.credentials_path.ends_with("credentials.json"));
    }

    #[test]
    fn test_bare_file_name_cache_is_relative() {
        assert_eq!(
            token_cache_beside(Path::new("credentials.json")),
            PathBuf::from("token.json")
        );
    }
}
