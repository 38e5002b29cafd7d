//! Request authorization schemes

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::credentials::{Credential, CredentialSource};
use crate::core::errors::{ClientError, Result};
use crate::core::request::Request;

/// Header carrying the account name
pub const AUTH_USER_HEADER: &str = "X-Auth-User";

/// Header carrying the API key
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Authorization scheme used by a session
///
/// Implementations must be safe to call from overlapping requests. Any
/// derived material they cache is protected by their own synchronization.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Server root for `domain`
    fn base_url(&self, domain: &str) -> Result<Url>;

    /// Return `draft` with the scheme's headers or parameters attached
    ///
    /// Fails with `ClientError::Auth` when no credential covers `domain`.
    fn authorize(&self, domain: &str, draft: Request) -> Result<Request>;

    /// Renew any short-lived authorization material
    async fn refresh(&self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }
}

fn parse_base_url(raw: &str, domain: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        ClientError::config(format!("invalid server URL for {}: {} ({})", domain, raw, e))
    })
}

/// Authorizer backed by a key-file credential source
///
/// Sends the account name and API key as `X-Auth-User` / `X-Auth-Token`.
#[derive(Clone)]
pub struct KeyFileAuthorizer {
    credentials: Arc<dyn CredentialSource>,
}

impl KeyFileAuthorizer {
    /// Authorize with credentials from `credentials`
    pub fn new<C>(credentials: C) -> Self
    where
        C: CredentialSource + 'static,
    {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    /// Share an existing credential source
    pub fn from_shared(credentials: Arc<dyn CredentialSource>) -> Self {
        Self { credentials }
    }

    fn credential(&self, domain: &str) -> Result<Credential> {
        self.credentials.lookup(domain).ok_or_else(|| {
            warn!("No credential for domain {}", domain);
            ClientError::auth(format!("no credential for domain {}", domain))
        })
    }
}

impl std::fmt::Debug for KeyFileAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFileAuthorizer")
            .field("domains", &self.credentials.domains())
            .finish()
    }
}

#[async_trait]
impl Authorizer for KeyFileAuthorizer {
    fn base_url(&self, domain: &str) -> Result<Url> {
        Ok(self.credential(domain)?.url)
    }

    fn authorize(&self, domain: &str, draft: Request) -> Result<Request> {
        let credential = self.credential(domain)?;
        debug!(domain, user = %credential.username, "authorizing request");
        Ok(draft
            .with_header(AUTH_USER_HEADER, credential.username)
            .with_header(AUTH_TOKEN_HEADER, credential.api_key))
    }
}

/// Authorizer sending a fixed bearer token to a single server
#[derive(Clone)]
pub struct BearerAuthorizer {
    domain: String,
    base_url: Url,
    token: String,
}

impl BearerAuthorizer {
    /// Fails with `ClientError::Config` when `base_url` is not an absolute URL
    pub fn new(domain: impl Into<String>, base_url: &str, token: impl Into<String>) -> Result<Self> {
        let domain = domain.into();
        let base_url = parse_base_url(base_url, &domain)?;
        Ok(Self {
            domain,
            base_url,
            token: token.into(),
        })
    }

    fn check_domain(&self, domain: &str) -> Result<()> {
        if domain.eq_ignore_ascii_case(&self.domain) {
            Ok(())
        } else {
            Err(ClientError::auth(format!("no credential for domain {}", domain)))
        }
    }
}

impl std::fmt::Debug for BearerAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthorizer")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authorizer for BearerAuthorizer {
    fn base_url(&self, domain: &str) -> Result<Url> {
        self.check_domain(domain)?;
        Ok(self.base_url.clone())
    }

    fn authorize(&self, domain: &str, draft: Request) -> Result<Request> {
        self.check_domain(domain)?;
        Ok(draft.with_header("Authorization", format!("Bearer {}", self.token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::KeyFileCredentials;
    use reqwest::Method;

    const STORE: &str = "\
[servers]
translate_zanata_org.url=https://translate.zanata.org/
translate_zanata_org.username=alice
translate_zanata_org.key=k1
fedora.url=https://fedora.zanata.org/
fedora.username=bob
fedora.key=k2
";

    fn authorizer() -> KeyFileAuthorizer {
        KeyFileAuthorizer::new(KeyFileCredentials::from_ini_str(STORE).unwrap())
    }

    fn draft() -> Request {
        Request::new(
            Method::GET,
            Url::parse("https://placeholder.invalid").unwrap(),
            ["rest", "projects"],
        )
    }

    #[test]
    fn test_authorize_every_stored_domain() {
        let credentials = KeyFileCredentials::from_ini_str(STORE).unwrap();
        let authorizer = authorizer();

        for domain in credentials.domains() {
            let expected = credentials.lookup(&domain).unwrap();
            let request = authorizer.authorize(&domain, draft()).unwrap();
            assert_eq!(request.headers[AUTH_USER_HEADER], expected.username);
            assert_eq!(request.headers[AUTH_TOKEN_HEADER], expected.api_key);
        }
    }

    #[test]
    fn test_authorize_absent_domain() {
        let err = authorizer().authorize("example_com", draft()).unwrap_err();
        assert!(matches!(err, ClientError::Auth { .. }));
    }

    #[test]
    fn test_authorize_leaves_draft_fields() {
        let request = authorizer()
            .authorize("fedora", draft().with_query("from", "en"))
            .unwrap();
        assert_eq!(request.query["from"], "en");
        assert_eq!(request.segments, vec!["rest", "projects"]);
    }

    #[test]
    fn test_base_url() {
        let url = authorizer().base_url("translate_zanata_org").unwrap();
        assert_eq!(url.as_str(), "https://translate.zanata.org/");

        assert!(matches!(
            authorizer().base_url("example_com"),
            Err(ClientError::Auth { .. })
        ));
    }

    #[test]
    fn test_bearer_authorizer() {
        let authorizer = BearerAuthorizer::new("local", "http://localhost:8080/", "t0k3n").unwrap();

        let request = authorizer.authorize("local", draft()).unwrap();
        assert_eq!(request.headers["Authorization"], "Bearer t0k3n");
        assert!(matches!(
            authorizer.authorize("other", draft()),
            Err(ClientError::Auth { .. })
        ));
        assert_eq!(
            authorizer.base_url("LOCAL").unwrap().as_str(),
            "http://localhost:8080/"
        );
    }

    #[tokio::test]
    async fn test_refresh_is_noop() {
        assert!(authorizer().refresh(&CancellationToken::new()).await.is_ok());
    }
}
