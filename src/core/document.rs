//! One-shot handle over a translated documentation bundle

use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::errors::{ClientError, DecodeError, Result};
use crate::core::transport::ByteStream;

/// Streamed JSON document returned by the server
///
/// Reading consumes the underlying response; the connection is released by
/// [`close`](Self::close), by reaching the end, or by dropping the handle.
/// Every read observes the operation's cancellation token.
pub struct TranslatedDocument {
    body: Option<ByteStream>,
    cancel: CancellationToken,
    bytes_read: u64,
}

impl TranslatedDocument {
    /// Wrap `body`; reads fail with `Cancelled` once `cancel` fires
    pub fn new(body: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            body: Some(body),
            cancel,
            bytes_read: 0,
        }
    }

    /// Bytes delivered so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the stream has been fully read or closed
    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }

    /// Read the next chunk; `None` once the document is exhausted
    ///
    /// Fails with `Cancelled` if the token fires, and the handle is closed.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let Some(body) = self.body.as_mut() else {
            return Ok(None);
        };

        let next = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(bytes_read = self.bytes_read, "document read cancelled");
                self.body = None;
                return Err(ClientError::Cancelled);
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                self.bytes_read += chunk.len() as u64;
                Ok(Some(chunk))
            }
            Some(Err(e)) => {
                self.body = None;
                Err(e)
            }
            None => {
                self.body = None;
                Ok(None)
            }
        }
    }

    /// Read the remaining content into memory
    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }

    /// Read and parse the remaining content
    pub async fn into_json(self) -> Result<Value> {
        let buf = self.read_to_end().await?;
        serde_json::from_slice(&buf).map_err(|e| ClientError::Protocol(DecodeError::Json(e)))
    }

    /// Stream the remaining content into `writer`, returning the bytes written
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            writer.write_all(&chunk).await.map_err(ClientError::transport)?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(ClientError::transport)?;
        Ok(written)
    }

    /// Release the underlying stream without reading the rest
    pub fn close(mut self) {
        if self.body.take().is_some() {
            debug!(bytes_read = self.bytes_read, "document closed before end");
        }
    }
}

impl std::fmt::Debug for TranslatedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatedDocument")
            .field("closed", &self.is_closed())
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use futures::stream;
    use serde_json::json;

    fn document(chunks: Vec<&'static str>, cancel: CancellationToken) -> TranslatedDocument {
        let body: ByteStream = Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        ));
        TranslatedDocument::new(body, cancel)
    }

    #[tokio::test]
    async fn test_reads_chunks_in_order() {
        let mut doc = document(vec!["{\"a\":", "1}"], CancellationToken::new());

        assert_eq!(doc.next_chunk().await.unwrap().unwrap(), "{\"a\":");
        assert_eq!(doc.next_chunk().await.unwrap().unwrap(), "1}");
        assert!(doc.next_chunk().await.unwrap().is_none());
        assert!(doc.is_closed());
        assert_eq!(doc.bytes_read(), 7);

        // exhausted handles stay exhausted
        assert!(doc.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_into_json() {
        let doc = document(
            vec!["{\"title\": \"Einf", "ührung\", \"sections\": [1, 2]}"],
            CancellationToken::new(),
        );
        let value = doc.into_json().await.unwrap();
        assert_json_eq!(value, json!({"title": "Einführung", "sections": [1, 2]}));
    }

    #[tokio::test]
    async fn test_into_json_rejects_truncated_document() {
        let doc = document(vec!["{\"title\": "], CancellationToken::new());
        let err = doc.into_json().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_cancel_mid_read() {
        let token = CancellationToken::new();
        let mut doc = document(vec!["{", "}"], token.clone());

        assert!(doc.next_chunk().await.unwrap().is_some());
        token.cancel();

        let err = doc.next_chunk().await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert!(doc.is_closed());
    }

    #[tokio::test]
    async fn test_cancel_fails_read_to_end() {
        let token = CancellationToken::new();
        token.cancel();
        let doc = document(vec!["{}"], token);
        assert!(matches!(doc.read_to_end().await, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn test_copy_to_writer() {
        let doc = document(vec!["{\"a\":", "[]}"], CancellationToken::new());
        let mut out: Vec<u8> = Vec::new();
        let written = doc.copy_to(&mut out).await.unwrap();
        assert_eq!(written, 8);
        assert_eq!(out, b"{\"a\":[]}");
    }

    #[test]
    fn test_close_releases_stream() {
        let doc = document(vec!["{}"], CancellationToken::new());
        assert!(!doc.is_closed());
        doc.close();
    }
}
