//! Zanata Client - asynchronous client for translation management servers
//!
//! This library authenticates against a Zanata-style REST server, lists
//! projects and their iterations, streams translated documentation bundles,
//! and queries the translation memory for suggestions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;

// Re-export key types for convenience
pub use core::{
    authorizer::{Authorizer, BearerAuthorizer, KeyFileAuthorizer},
    config::ClientConfig,
    credentials::{Credential, CredentialSource, KeyFileCredentials},
    decoder::{Decoded, JsonDecoder, ResultDecoder, Shape},
    document::TranslatedDocument,
    errors::{ClientError, DecodeError, Result},
    models::{EntityStatus, Iteration, Project, Suggestion},
    request::{Request, RequestContext},
    session::{Session, SessionBuilder},
    transport::{ByteStream, RawResponse, ReqwestTransport, Transport},
};

pub use tokio_util::sync::CancellationToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
