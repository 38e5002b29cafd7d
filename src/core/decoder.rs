//! Turning response bodies into entities

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::document::TranslatedDocument;
use crate::core::errors::DecodeError;
use crate::core::models::{EntityStatus, Iteration, Project, Suggestion};
use crate::core::transport::ByteStream;

/// Entity shape a request expects back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A single project object
    Project,
    /// An array of projects
    Projects,
    /// The iterations of one project
    Iterations {
        /// Owner stamped onto every decoded iteration
        project_id: String,
    },
    /// A ranked array of suggestions
    Suggestions,
}

impl Shape {
    /// Label used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Project => "project",
            Shape::Projects => "project list",
            Shape::Iterations { .. } => "iteration list",
            Shape::Suggestions => "suggestion list",
        }
    }
}

/// Result of an eager decode
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// One project
    Project(Project),
    /// Projects in server order
    Projects(Vec<Project>),
    /// Iterations in server order
    Iterations(Vec<Iteration>),
    /// Suggestions, best match first
    Suggestions(Vec<Suggestion>),
}

impl Decoded {
    /// Label used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Decoded::Project(_) => "project",
            Decoded::Projects(_) => "project list",
            Decoded::Iterations(_) => "iteration list",
            Decoded::Suggestions(_) => "suggestion list",
        }
    }
}

/// Wire-format knowledge, kept out of the session
pub trait ResultDecoder: Send + Sync {
    /// Decode a fully buffered body
    ///
    /// Collections are all-or-nothing: one malformed element fails the call.
    fn decode(&self, body: &[u8], shape: &Shape) -> Result<Decoded, DecodeError>;

    /// Wrap a document body without reading it
    fn document(&self, body: ByteStream, cancel: CancellationToken) -> TranslatedDocument;
}

/// Decoder for the server's JSON representation
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

#[derive(Deserialize)]
struct WireIteration {
    id: String,
    status: EntityStatus,
}

impl JsonDecoder {
    fn array<T: DeserializeOwned>(root: Value) -> Result<Vec<T>, DecodeError> {
        if !root.is_array() {
            return Err(DecodeError::UnexpectedRoot { expected: "array" });
        }
        Ok(serde_json::from_value(root)?)
    }

    fn iterations(root: Value, project_id: &str) -> Result<Vec<Iteration>, DecodeError> {
        // The project endpoint embeds iterations; a bare array is accepted too.
        let items = match root {
            Value::Array(_) => root,
            Value::Object(mut object) => object
                .remove("iterations")
                .ok_or(DecodeError::MissingField {
                    field: "iterations",
                })?,
            _ => {
                return Err(DecodeError::UnexpectedRoot {
                    expected: "object or array",
                })
            }
        };

        let wire: Vec<WireIteration> = Self::array(items)?;
        Ok(wire
            .into_iter()
            .map(|w| Iteration {
                id: w.id,
                status: w.status,
                project_id: project_id.to_string(),
            })
            .collect())
    }
}

impl ResultDecoder for JsonDecoder {
    fn decode(&self, body: &[u8], shape: &Shape) -> Result<Decoded, DecodeError> {
        let root: Value = serde_json::from_slice(body)?;

        match shape {
            Shape::Project => {
                if !root.is_object() {
                    return Err(DecodeError::UnexpectedRoot { expected: "object" });
                }
                Ok(Decoded::Project(serde_json::from_value(root)?))
            }
            Shape::Projects => Ok(Decoded::Projects(Self::array(root)?)),
            Shape::Iterations { project_id } => {
                Ok(Decoded::Iterations(Self::iterations(root, project_id)?))
            }
            Shape::Suggestions => Ok(Decoded::Suggestions(Self::array(root)?)),
        }
    }

    fn document(&self, body: ByteStream, cancel: CancellationToken) -> TranslatedDocument {
        TranslatedDocument::new(body, cancel)
    }
}
