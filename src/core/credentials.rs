//! Credential lookup by server domain

use config::{Config, File, FileFormat};
use reqwest::Url;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::config::default_credentials_path;
use crate::core::errors::{ClientError, Result};

/// Section of the key file that holds server entries
const SERVERS_SECTION: &str = "servers";

/// Credentials for one server domain
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Domain key the entry was stored under
    pub domain: String,
    /// Server base URL
    pub url: Url,
    /// Account name sent with each request
    pub username: String,
    /// API key sent with each request
    pub api_key: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("domain", &self.domain)
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Source of credentials keyed by domain
///
/// Implementations are read-only after construction and may be shared
/// across concurrent requests.
pub trait CredentialSource: Send + Sync {
    /// Resolve a domain to its credential
    fn lookup(&self, domain: &str) -> Option<Credential>;

    /// All domains this source knows about
    fn domains(&self) -> Vec<String>;
}

/// Credential store backed by an INI key file
///
/// ```ini
/// [servers]
/// translate_zanata_org.url=https://translate.zanata.org/
/// translate_zanata_org.username=alice
/// translate_zanata_org.key=0123456789abcdef
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyFileCredentials {
    entries: HashMap<String, Credential>,
}

impl KeyFileCredentials {
    /// Load from a key file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = File::from(path).format(FileFormat::Ini).required(true);
        let config = Config::builder().add_source(source).build().map_err(|e| {
            ClientError::config(format!(
                "cannot load credential store {}: {}",
                path.display(),
                e
            ))
        })?;

        let store = Self::from_config(&config)?;
        info!(
            "Loaded {} server credential(s) from {}",
            store.entries.len(),
            path.display()
        );
        Ok(store)
    }

    /// Load from the default location
    pub fn from_default_location() -> Result<Self> {
        let path = std::env::var_os("ZANATA_CONFIG")
            .map(Into::into)
            .unwrap_or_else(default_credentials_path);
        Self::from_path(path)
    }

    /// Parse key file contents
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Ini))
            .build()
            .map_err(|e| ClientError::config(format!("malformed credential store: {}", e)))?;

        Self::from_config(&config)
    }

    fn from_config(config: &Config) -> Result<Self> {
        let table = match config.get_table(SERVERS_SECTION) {
            Ok(table) => table,
            Err(config::ConfigError::NotFound(_)) => {
                warn!("Credential store has no [{}] section", SERVERS_SECTION);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        // domain -> field -> value
        let mut fields: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (key, value) in table {
            let Some((domain, field)) = key.rsplit_once('.') else {
                debug!("Ignoring credential store key without domain: {}", key);
                continue;
            };
            let value = value.into_string().map_err(|e| {
                ClientError::config(format!("invalid value for {}: {}", key, e))
            })?;
            fields
                .entry(domain.to_ascii_lowercase())
                .or_default()
                .insert(field.to_ascii_lowercase(), value);
        }

        let mut entries = HashMap::with_capacity(fields.len());
        for (domain, mut values) in fields {
            let mut take = |field: &str| {
                values.remove(field).ok_or_else(|| {
                    ClientError::config(format!("{}.{} is not given", domain, field))
                })
            };
            let raw_url = take("url")?;
            let url = Url::parse(&raw_url).map_err(|e| {
                ClientError::config(format!(
                    "invalid server URL for {}: {} ({})",
                    domain, raw_url, e
                ))
            })?;
            let credential = Credential {
                url,
                username: take("username")?,
                api_key: take("key")?,
                domain: domain.clone(),
            };
            entries.insert(domain, credential);
        }

        Ok(Self { entries })
    }
}

impl CredentialSource for KeyFileCredentials {
    fn lookup(&self, domain: &str) -> Option<Credential> {
        self.entries.get(&domain.to_ascii_lowercase()).cloned()
    }

    fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.entries.keys().cloned().collect();
        domains.sort();
        domains
    }
}
