//! Configuration loading.
//!
//! The configuration is a small INI file:
//!
//! ```ini
//! [icloud]
//! hostname=imap.mail.me.com
//! username=jane@icloud.com
//! password=app-specific-password
//! port=993
//!
//! [server]
//! username=jane
//! legacy_content_type=false
//! ```
//!
//! `port` and `legacy_content_type` are optional. Every other key is
//! required, and a missing file or missing keys are reported before any
//! network activity.

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use thiserror::Error;

use crate::codec::ContentTypePolicy;

const ICLOUD: &str = "icloud";
const SERVER: &str = "server";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Cannot open {}", path.display())]
    NotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The file exists but could not be read or parsed.
    #[error("Cannot read {}: {message}", path.display())]
    Unreadable {
        /// Path that was tried.
        path: PathBuf,
        /// Underlying reason.
        message: String,
    },

    /// Required keys are absent. Lists all of them, as `section.key`.
    #[error("Missing configuration keys: {}", keys.join(", "))]
    MissingKeys {
        /// Every missing key.
        keys: Vec<String>,
    },

    /// A key is present but its value cannot be used.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Offending key, as `section.key`.
        key: String,
        /// Value found in the file.
        value: String,
    },
}

/// IMAP login details.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// IMAP server host name.
    pub hostname: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Implicit-TLS port.
    pub port: u16,
}

impl Credentials {
    /// Creates credentials for the default IMAPS port.
    #[must_use]
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            port: inotes_imap::DEFAULT_TLS_PORT,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IMAP login details.
    pub credentials: Credentials,
    /// Local part of the synthesized `From` address.
    pub note_from: String,
    /// How the `Content-Type` header of new notes is chosen.
    pub content_type: ContentTypePolicy,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, lacks required
    /// keys, or holds an unusable value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let ini = Ini::load_from_file_opt(path, parse_options()).map_err(|e| {
            ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        tracing::debug!(path = %path.display(), "configuration file loaded");
        Self::from_ini(&ini)
    }

    /// Parses configuration from INI text.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the file errors.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_opt(text, parse_options()).map_err(|e| {
            ConfigError::Unreadable {
                path: PathBuf::from("<string>"),
                message: e.to_string(),
            }
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |section: &str, key: &str| -> String {
            match lookup(ini, section, key) {
                Some(value) => value.to_string(),
                None => {
                    missing.push(format!("{section}.{key}"));
                    String::new()
                }
            }
        };

        let hostname = required(ICLOUD, "hostname");
        let username = required(ICLOUD, "username");
        let password = required(ICLOUD, "password");
        let note_from = required(SERVER, "username");

        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys { keys: missing });
        }

        let port = match lookup(ini, ICLOUD, "port") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: format!("{ICLOUD}.port"),
                value: value.to_string(),
            })?,
            None => inotes_imap::DEFAULT_TLS_PORT,
        };

        let legacy = match lookup(ini, SERVER, "legacy_content_type") {
            Some(value) => parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                key: format!("{SERVER}.legacy_content_type"),
                value: value.to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            credentials: Credentials {
                hostname,
                username,
                password,
                port,
            },
            note_from,
            content_type: if legacy {
                ContentTypePolicy::AlwaysHtml
            } else {
                ContentTypePolicy::PerFormat
            },
        })
    }
}

/// Passwords may contain backslashes and quotes; take values verbatim.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn lookup<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.get_from(Some(section), key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL: &str = "\
[icloud]
hostname=imap.mail.me.com
username=jane@icloud.com
password=pa\\ss\"word
port=1993

[server]
username=jane
legacy_content_type=yes
";

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.credentials.hostname, "imap.mail.me.com");
        assert_eq!(config.credentials.username, "jane@icloud.com");
        assert_eq!(config.credentials.password, "pa\\ss\"word");
        assert_eq!(config.credentials.port, 1993);
        assert_eq!(config.note_from, "jane");
        assert_eq!(config.content_type, ContentTypePolicy::AlwaysHtml);
    }

    #[test]
    fn test_optional_keys_default() {
        let config = Config::parse(
            "[icloud]\nhostname=h\nusername=u\npassword=p\n[server]\nusername=jane\n",
        )
        .unwrap();
        assert_eq!(config.credentials.port, 993);
        assert_eq!(config.content_type, ContentTypePolicy::PerFormat);
    }

    #[test]
    fn test_every_missing_key_is_listed() {
        let err = Config::parse("[icloud]\nhostname=h\npassword=\n").unwrap_err();
        match err {
            ConfigError::MissingKeys { keys } => {
                assert_eq!(
                    keys,
                    vec!["icloud.username", "icloud.password", "server.username"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::parse(
            "[icloud]\nhostname=h\nusername=u\npassword=p\nport=imaps\n[server]\nusername=j\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "icloud.port"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inotes.conf");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("inotes.conf"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.note_from, "jane");
    }

    #[test]
    fn test_password_is_redacted() {
        let credentials = Credentials::new("h", "u", "hunter2");
        let shown = format!("{credentials:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
