//! Session: the entry point for all server operations
//!
//! Every operation follows the same pipeline: validate arguments, build a
//! [`RequestContext`], authorize, dispatch through the [`Transport`], and
//! decode the body with the [`ResultDecoder`]. Each operation resolves to
//! exactly one `Result`.
//!
//! # Example
//!
//! ```ignore
//! use zanata_client::{KeyFileAuthorizer, KeyFileCredentials, Session};
//!
//! #[tokio::main]
//! async fn main() -> zanata_client::Result<()> {
//!     let credentials = KeyFileCredentials::from_default_location()?;
//!     let session = Session::new(KeyFileAuthorizer::new(credentials), "translate_zanata_org")?;
//!
//!     for project in session.get_projects(None).await? {
//!         println!("{} ({})", project.name, project.status);
//!     }
//!     Ok(())
//! }
//! ```

use regex::Regex;
use reqwest::Method;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::authorizer::{Authorizer, KeyFileAuthorizer};
use crate::core::config::ClientConfig;
use crate::core::credentials::KeyFileCredentials;
use crate::core::decoder::{Decoded, JsonDecoder, ResultDecoder, Shape};
use crate::core::document::TranslatedDocument;
use crate::core::errors::{ClientError, DecodeError, Result};
use crate::core::models::{Iteration, Project, Suggestion};
use crate::core::request::{Request, RequestContext, JSON_CONTENT_TYPE};
use crate::core::transport::{RawResponse, ReqwestTransport, Transport};

/// Upper bound on the error body kept in `ClientError::Server`
const MAX_ERROR_BODY: usize = 512;

/// Authenticated view of one server domain
///
/// Cheap to clone; clones share the authorizer, transport and decoder.
/// The domain and authorizer are fixed at construction.
#[derive(Clone)]
pub struct Session {
    authorizer: Arc<dyn Authorizer>,
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn ResultDecoder>,
    domain: String,
}

impl Session {
    /// Create a session over HTTP with default client settings
    pub fn new<A>(authorizer: A, domain: impl Into<String>) -> Result<Self>
    where
        A: Authorizer + 'static,
    {
        let domain = domain.into();
        let config = ClientConfig::default().with_domain(domain.clone());
        Self::builder(authorizer, domain)
            .transport(ReqwestTransport::new(&config)?)
            .build()
    }

    /// Create a session from configuration, loading the key-file credentials
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let credentials = KeyFileCredentials::from_path(&config.credentials_path)?;
        Self::builder(KeyFileAuthorizer::new(credentials), config.domain.clone())
            .transport(ReqwestTransport::new(config)?)
            .build()
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Start building a session with injected collaborators
    pub fn builder<A>(authorizer: A, domain: impl Into<String>) -> SessionBuilder
    where
        A: Authorizer + 'static,
    {
        SessionBuilder {
            authorizer: Arc::new(authorizer),
            domain: domain.into(),
            transport: None,
            decoder: None,
        }
    }

    /// Domain this session talks to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fetch one project by id
    pub async fn get_project(
        &self,
        project_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Project> {
        require_non_empty("project id", project_id)?;

        let ctx = self.context(
            "get_project",
            format!("project {}", project_id),
            cancel,
            Method::GET,
            ["rest", "projects", "p", project_id],
        )?;

        match self.fetch(ctx, Shape::Project).await? {
            Decoded::Project(project) => Ok(project),
            other => Err(mismatch(&Shape::Project, &other)),
        }
    }

    /// List every project visible to the authorized identity
    pub async fn get_projects(&self, cancel: Option<&CancellationToken>) -> Result<Vec<Project>> {
        let ctx = self.context(
            "get_projects",
            "projects",
            cancel,
            Method::GET,
            ["rest", "projects"],
        )?;

        match self.fetch(ctx, Shape::Projects).await? {
            Decoded::Projects(projects) => {
                info!("Fetched {} projects from {}", projects.len(), self.domain);
                Ok(projects)
            }
            other => Err(mismatch(&Shape::Projects, &other)),
        }
    }

    /// List the iterations of a project, in server order
    ///
    /// The project may come from any session; only its id is used.
    pub async fn get_iterations(
        &self,
        project: &Project,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Iteration>> {
        self.get_iterations_by_id(&project.id, cancel).await
    }

    /// List the iterations of the project with `project_id`
    pub async fn get_iterations_by_id(
        &self,
        project_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Iteration>> {
        require_non_empty("project id", project_id)?;

        let ctx = self.context(
            "get_iterations",
            format!("project {}", project_id),
            cancel,
            Method::GET,
            ["rest", "projects", "p", project_id],
        )?;

        let shape = Shape::Iterations {
            project_id: project_id.to_string(),
        };
        match self.fetch(ctx, shape.clone()).await? {
            Decoded::Iterations(iterations) => Ok(iterations),
            other => Err(mismatch(&shape, &other)),
        }
    }

    /// Open the translation of `document` in one iteration and locale
    ///
    /// The returned handle streams the body lazily; it stays bound to the
    /// same cancellation token.
    pub async fn get_translated_documentation(
        &self,
        project_id: &str,
        iteration_id: &str,
        document: &str,
        locale: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<TranslatedDocument> {
        require_non_empty("project id", project_id)?;
        require_non_empty("iteration id", iteration_id)?;
        require_non_empty("document", document)?;
        require_locale("locale", locale)?;

        let ctx = self.context(
            "get_translated_documentation",
            format!(
                "document {} of {}/{} in {}",
                document, project_id, iteration_id, locale
            ),
            cancel,
            Method::GET,
            [
                "rest",
                "projects",
                "p",
                project_id,
                "iterations",
                "i",
                iteration_id,
                "r",
                document,
                "translations",
                locale,
            ],
        )?;

        let cancel = ctx.cancel.clone();
        let response = self.dispatch(ctx).await?;
        Ok(self.decoder.document(response.body, cancel))
    }

    /// Query the translation memory for `source_texts`
    ///
    /// Results keep the server's ranking; index 0 is the best match.
    pub async fn get_suggestions<S>(
        &self,
        source_texts: &[S],
        source_locale: &str,
        target_locale: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Suggestion>>
    where
        S: AsRef<str>,
    {
        if source_texts.is_empty() {
            return Err(ClientError::invalid_argument(
                "at least one source text is required",
            ));
        }
        require_locale("source locale", source_locale)?;
        require_locale("target locale", target_locale)?;

        let query: Vec<&str> = source_texts.iter().map(AsRef::as_ref).collect();
        let body = serde_json::to_vec(&query)
            .map_err(|e| ClientError::invalid_argument(format!("cannot encode query: {}", e)))?;

        let mut ctx = self.context(
            "get_suggestions",
            "suggestions",
            cancel,
            Method::POST,
            ["rest", "suggestions"],
        )?;
        ctx.request = ctx
            .request
            .with_query("from", source_locale)
            .with_query("to", target_locale)
            .with_json_body(body);

        match self.fetch(ctx, Shape::Suggestions).await? {
            Decoded::Suggestions(suggestions) => Ok(suggestions),
            other => Err(mismatch(&Shape::Suggestions, &other)),
        }
    }

    fn context<const N: usize>(
        &self,
        operation: &'static str,
        resource: impl Into<String>,
        cancel: Option<&CancellationToken>,
        method: Method,
        segments: [&str; N],
    ) -> Result<RequestContext> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!(operation, "cancelled before start");
            return Err(ClientError::Cancelled);
        }

        let base_url = self.authorizer.base_url(&self.domain)?;
        let request = Request::new(method, base_url, segments)
            .with_header("Accept", JSON_CONTENT_TYPE);
        Ok(RequestContext::new(operation, resource, cancel, request))
    }

    /// Authorize, send, and check the status
    async fn dispatch(&self, ctx: RequestContext) -> Result<RawResponse> {
        if let Err(e) = ctx.ensure_active() {
            debug!(operation = ctx.operation, "cancelled before dispatch");
            return Err(e);
        }

        let RequestContext {
            operation,
            resource,
            cancel,
            request,
        } = ctx;

        let request = self.authorizer.authorize(&self.domain, request)?;
        debug!(operation, method = %request.method, path = %request.path(), "dispatching");

        let outcome = self.transport.send(request, &cancel).await;

        // Nothing is delivered once cancellation has been observed.
        if cancel.is_cancelled() {
            debug!(operation, "cancelled while in flight");
            return Err(ClientError::Cancelled);
        }

        let response = outcome.map_err(|e| {
            if !matches!(e, ClientError::Cancelled) {
                warn!(operation, "transport failed: {}", e);
            }
            e
        })?;

        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let body = match response.collect(&cancel).await {
            Ok(body) => body,
            Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
            Err(e) => {
                debug!(operation, status, "cannot read error body: {}", e);
                Vec::new()
            }
        };
        let mut message = String::from_utf8_lossy(&body).into_owned();
        if message.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }

        warn!(operation, status, "server returned error status");
        Err(ClientError::from_status(status, &resource, message))
    }

    /// Dispatch, buffer the body, and decode it eagerly
    async fn fetch(&self, ctx: RequestContext, shape: Shape) -> Result<Decoded> {
        let operation = ctx.operation;
        let cancel = ctx.cancel.clone();

        let response = self.dispatch(ctx).await?;
        let body = response.collect(&cancel).await?;

        self.decoder.decode(&body, &shape).map_err(|e| {
            warn!(operation, "cannot decode {}: {}", shape.name(), e);
            ClientError::Protocol(e)
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    authorizer: Arc<dyn Authorizer>,
    domain: String,
    transport: Option<Arc<dyn Transport>>,
    decoder: Option<Arc<dyn ResultDecoder>>,
}

impl SessionBuilder {
    /// Use `transport` instead of the default reqwest transport
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share an existing transport
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `decoder` instead of [`JsonDecoder`]
    pub fn decoder<D>(mut self, decoder: D) -> Self
    where
        D: ResultDecoder + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Finish the session; fails with `ClientError::Config` on an empty domain
    pub fn build(self) -> Result<Session> {
        if self.domain.trim().is_empty() {
            return Err(ClientError::config("domain is required"));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let config = ClientConfig::default().with_domain(self.domain.clone());
                Arc::new(ReqwestTransport::new(&config)?)
            }
        };

        Ok(Session {
            authorizer: self.authorizer,
            transport,
            decoder: self.decoder.unwrap_or_else(|| Arc::new(JsonDecoder)),
            domain: self.domain,
        })
    }
}

fn mismatch(expected: &Shape, actual: &Decoded) -> ClientError {
    ClientError::Protocol(DecodeError::ShapeMismatch {
        expected: expected.name(),
        actual: actual.name(),
    })
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::invalid_argument(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn locale_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,8}(?:[-_][A-Za-z0-9]{1,8})*$").expect("valid locale pattern")
    })
}

/// Check that `locale` looks like a language tag ("de", "de-DE", "zh_Hant_TW")
fn require_locale(what: &str, locale: &str) -> Result<()> {
    if locale_pattern().is_match(locale) {
        Ok(())
    } else {
        Err(ClientError::invalid_argument(format!(
            "{} is not a language tag: {:?}",
            what, locale
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_validation() {
        for ok in ["en", "ja", "de-DE", "zh-Hant-TW", "pt_BR", "sr-Latn"] {
            assert!(require_locale("locale", ok).is_ok(), "{}", ok);
        }
        for bad in ["", "e", "de DE", "../etc", "en-", "-en"] {
            assert!(
                matches!(
                    require_locale("locale", bad),
                    Err(ClientError::InvalidArgument { .. })
                ),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("id", "coala").is_ok());
        assert!(matches!(
            require_non_empty("id", " "),
            Err(ClientError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_mismatch_is_protocol_error() {
        let err = mismatch(&Shape::Project, &Decoded::Projects(vec![]));
        assert!(matches!(
            err,
            ClientError::Protocol(DecodeError::ShapeMismatch {
                expected: "project",
                actual: "project list"
            })
        ));
    }
}
