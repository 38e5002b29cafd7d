//! Request description and per-operation context

use bytes::Bytes;
use reqwest::{Method, Url};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::core::errors::{ClientError, Result};

/// Media type used for request and response bodies
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request as handed to a transport
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Server root; segments are appended to its path
    pub base_url: Url,
    /// Unescaped path segments below the base URL
    pub segments: Vec<String>,
    /// Query parameters, unescaped
    pub query: BTreeMap<String, String>,
    /// Header name to value
    pub headers: BTreeMap<String, String>,
    /// Encoded request body, if any
    pub body: Option<Bytes>,
}

impl Request {
    /// Start a request for `segments` below `base_url`
    pub fn new<I, S>(method: Method, base_url: Url, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            base_url,
            segments: segments.into_iter().map(Into::into).collect(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Add or replace a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add or replace a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body and its content type
    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.headers
            .insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        self.body = Some(Bytes::from(body));
        self
    }

    /// Path below the base URL, for logging
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Full URL with escaped segments and query
    ///
    /// Segments are appended to the base URL's path; a trailing slash on the
    /// base does not produce an empty segment.
    pub fn url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::config(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(self.segments.iter().map(String::as_str));

        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}

/// State owned by one in-flight operation
#[derive(Debug)]
pub struct RequestContext {
    /// Operation name, used in logs
    pub operation: &'static str,
    /// Human-readable target, used in `NotFound` errors
    pub resource: String,
    /// Token observed at every stage of the operation
    pub cancel: CancellationToken,
    /// Draft request, not yet authorized
    pub request: Request,
}

impl RequestContext {
    /// Create a context; without a caller token the operation gets a private one
    pub fn new(
        operation: &'static str,
        resource: impl Into<String>,
        cancel: Option<&CancellationToken>,
        request: Request,
    ) -> Self {
        Self {
            operation,
            resource: resource.into(),
            cancel: cancel.cloned().unwrap_or_default(),
            request,
        }
    }

    /// Fail with `Cancelled` once the token has fired
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_url_appends_to_bare_host() {
        let req = Request::new(Method::GET, base("https://translate.zanata.org"), ["rest", "projects"]);
        assert_eq!(req.url().unwrap().as_str(), "https://translate.zanata.org/rest/projects");
    }

    #[test]
    fn test_url_avoids_double_slash() {
        let req = Request::new(
            Method::GET,
            base("https://example.org/zanata/"),
            ["rest", "projects"],
        );
        assert_eq!(req.url().unwrap().as_str(), "https://example.org/zanata/rest/projects");
    }

    #[test]
    fn test_url_escapes_segments() {
        let req = Request::new(
            Method::GET,
            base("https://example.org"),
            ["rest", "projects", "p", "a b/c"],
        );
        assert_eq!(
            req.url().unwrap().as_str(),
            "https://example.org/rest/projects/p/a%20b%2Fc"
        );
    }

    #[test]
    fn test_url_query() {
        let req = Request::new(Method::POST, base("https://example.org"), ["rest", "suggestions"])
            .with_query("to", "ja")
            .with_query("from", "en");
        assert_eq!(
            req.url().unwrap().as_str(),
            "https://example.org/rest/suggestions?from=en&to=ja"
        );
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = Request::new(Method::POST, base("https://example.org"), ["x"])
            .with_json_body(b"[\"a\"]".to_vec());
        assert_eq!(req.headers["Content-Type"], JSON_CONTENT_TYPE);
        assert_eq!(req.body.as_deref(), Some(&b"[\"a\"]"[..]));
        assert_eq!(req.path(), "/x");
    }

    #[test]
    fn test_context_observes_token() {
        let token = CancellationToken::new();
        let req = Request::new(Method::GET, base("https://example.org"), ["x"]);
        let ctx = RequestContext::new("test", "x", Some(&token), req);
        assert!(ctx.ensure_active().is_ok());

        token.cancel();
        assert!(matches!(ctx.ensure_active(), Err(ClientError::Cancelled)));
    }
}
