//! Profile configuration for network-virtualization controller clients.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `hnv_core::ClientConfig`. Nothing in `hnv-core` reads
//! files; callers load a profile here and hand the result to
//! `Lifecycle::connect`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hnv_core::{ClientConfig, Credentials, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/password`.
const KEYRING_SERVICE: &str = "hnv";

/// Fallback password variable when a profile names none.
const PASSWORD_ENV: &str = "HNV_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when the caller names none.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Accept any TLS certificate.
    #[serde(default)]
    pub insecure: bool,

    /// HTTP request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Wait between provisioning status checks, seconds.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            retry_interval: default_retry_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_retry_interval() -> u64 {
    1
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://nc.contoso.local").
    pub url: String,

    /// Basic-auth user. Without one, requests are sent anonymously.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// PEM bundle of CAs trusted for the controller's certificate.
    pub ca_bundle: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub retry_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "hnv", "hnv").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hnv");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// `HNV_`-prefixed variables override file values; nested keys use a
/// double underscore (`HNV_DEFAULTS__RETRY_INTERVAL=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HNV_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

/// Pick `name`, or the configured default profile.
pub fn select_profile<'a>(
    config: &'a Config,
    name: Option<&'a str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = name
        .or(config.default_profile.as_deref())
        .unwrap_or("default");
    config
        .profiles
        .get(name)
        .map(|profile| (name, profile))
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: name.into(),
        })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the profile's password.
///
/// Order: the profile's `password_env` variable, `HNV_PASSWORD`, the
/// system keyring, then plaintext in the config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    let env_name = profile.password_env.as_deref().unwrap_or(PASSWORD_ENV);
    if let Ok(pw) = std::env::var(env_name) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Basic-auth credentials for the profile, or `None` without a username.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(username) = profile.username.clone() else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some(Credentials { username, password }))
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, falling back to `defaults` for
/// anything the profile leaves unset.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_bundle {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = positive_secs("timeout", profile.timeout.unwrap_or(defaults.timeout))?;
    let retry_interval = positive_secs(
        "retry_interval",
        profile.retry_interval.unwrap_or(defaults.retry_interval),
    )?;

    Ok(ClientConfig {
        url,
        credentials: resolve_credentials(profile, profile_name)?,
        tls,
        timeout,
        retry_interval,
    })
}

/// Load the config and build the client settings for one profile.
pub fn load_client_config(profile: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let config = load_config()?;
    let (name, selected) = select_profile(&config, profile)?;
    profile_to_client_config(selected, name, &config.defaults)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least one second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 45
retry_interval = 2

[profiles.lab]
url = "https://nc.lab.local"
username = "admin"
password = "plain-secret"
password_env = "HNV_TEST_UNSET_PASSWORD_VARIABLE"

[profiles.anon]
url = "http://127.0.0.1:8080/"
insecure = true
retry_interval = 5
"#;

    fn load_sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn file_values_override_defaults() {
        let config = load_sample();
        assert_eq!(config.default_profile.as_deref(), Some("lab"));
        assert_eq!(config.defaults.timeout, 45);
        assert_eq!(config.defaults.retry_interval, 2);
        assert!(!config.defaults.insecure);
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.defaults.retry_interval, 1);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn default_profile_is_selected() {
        let config = load_sample();
        let (name, profile) = select_profile(&config, None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.username.as_deref(), Some("admin"));

        assert!(matches!(
            select_profile(&config, Some("prod")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn profile_translates_to_client_config() {
        let config = load_sample();
        let (name, profile) = select_profile(&config, Some("lab")).unwrap();
        let client = profile_to_client_config(profile, name, &config.defaults).unwrap();

        assert_eq!(client.url.as_str(), "https://nc.lab.local/");
        assert_eq!(client.tls, TlsVerification::SystemDefaults);
        assert_eq!(client.timeout, Duration::from_secs(45));
        assert_eq!(client.retry_interval, Duration::from_secs(2));

        let credentials = client.credentials.unwrap();
        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.password.expose_secret(), "plain-secret");
    }

    #[test]
    fn anonymous_insecure_profile() {
        let config = load_sample();
        let profile = &config.profiles["anon"];
        let client = profile_to_client_config(profile, "anon", &config.defaults).unwrap();

        assert!(client.credentials.is_none());
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(client.retry_interval, Duration::from_secs(5));
    }

    #[test]
    fn ca_bundle_selects_custom_trust() {
        let profile = Profile {
            url: "https://nc.lab.local".into(),
            ca_bundle: Some(PathBuf::from("/etc/hnv/ca.pem")),
            ..Profile::default()
        };
        let client = profile_to_client_config(&profile, "ca", &Defaults::default()).unwrap();
        assert_eq!(
            client.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/hnv/ca.pem"))
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad_url = Profile {
            url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&bad_url, "x", &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "url"
        ));

        let ftp = Profile {
            url: "ftp://nc.lab.local".into(),
            ..Profile::default()
        };
        assert!(profile_to_client_config(&ftp, "x", &Defaults::default()).is_err());

        let zero_interval = Profile {
            url: "https://nc.lab.local".into(),
            retry_interval: Some(0),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&zero_interval, "x", &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "retry_interval"
        ));
    }

    #[test]
    fn username_without_any_password_source_fails() {
        let profile = Profile {
            url: "https://nc.lab.local".into(),
            username: Some("admin".into()),
            password_env: Some("HNV_TEST_UNSET_PASSWORD_VARIABLE".into()),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_credentials(&profile, "hnv-test-profile-without-keyring-entry"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                url: "https://nc.example.org".into(),
                retry_interval: Some(3),
                ..Profile::default()
            },
        );
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = select_profile(&loaded, None).unwrap();
        assert_eq!(profile.url, "https://nc.example.org");
        assert_eq!(profile.retry_interval, Some(3));
    }
}
