// ── Runtime connection configuration ──
//
// These types describe *how* to reach a controller. They carry credential
// data and connection tuning, but never touch disk; `hnv-config` builds a
// `ClientConfig` from profiles and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default wait between provisioning status checks.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic-auth credentials for the controller.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA bundle file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab controllers).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single controller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller base URL (e.g., `https://nc.contoso.local`).
    pub url: Url,
    /// `None` for controllers that accept anonymous requests.
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Wait between provisioning status checks.
    pub retry_interval: Duration,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }
}
