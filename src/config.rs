//! Client configuration

use std::io;
use std::path::PathBuf;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://growing-server-production.up.railway.app/api";

/// Configuration for [`GrowingClient`](crate::GrowingClient)
///
/// Every remote call goes through the single `base_url`; point it at a local
/// server for development or at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Where the bearer token is stored; `None` picks a per-user data path
    pub credentials_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            credentials_path: None,
        }
    }
}

impl ClientConfig {
    /// Resolve the credential file path
    ///
    /// Uses the configured override when present, otherwise a `token` file in
    /// the per-user data directory.
    pub fn credentials_file(&self) -> io::Result<PathBuf> {
        if let Some(path) = &self.credentials_path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("", "", "growing").ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "no home directory for credential storage",
            )
        })?;
        Ok(dirs.data_dir().join("token"))
    }
}
