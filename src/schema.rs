//! # API schema file server.
//!
//! [`SchemaServer`] holds one JSON schema document (typically embedded with
//! `include_bytes!`), optionally rewrites its top-level `host`, and serves the
//! result with `Content-Type: application/json` through an `axum` router.
//!
//! ```text
//! SchemaServer::new(bytes) ─► with_host("api.example.com") ─► setup()
//!     parse JSON ─► replace "host" ─► re-encode once
//!                                        └─► router("/swagger.json") ─► GET → 200 application/json
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use closer::schema::SchemaServer;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let app = SchemaServer::new(&br#"{"swagger":"2.0","host":"localhost"}"#[..])
//!     .with_host("api.example.com")
//!     .setup()?
//!     .router("/swagger.json");
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use axum::Router;
use axum::body::Bytes;
use axum::http::header;
use axum::routing::get;
use serde_json::Value;
use thiserror::Error;

/// Schema server failures, all raised by [`SchemaServer::setup`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("schema must be a JSON object")]
    NotAnObject,

    #[error("failed to encode schema: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Schema document waiting for [`setup`](Self::setup).
pub struct SchemaServer {
    raw: Bytes,
    host: Option<String>,
}

/// Prepared schema, ready to be served.
#[derive(Clone, Debug)]
pub struct Schema {
    content: Bytes,
}

impl SchemaServer {
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self {
            raw: raw.into(),
            host: None,
        }
    }

    /// Replaces the document's `host` during [`setup`](Self::setup).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Parses the document, applies the host override and encodes it once.
    pub fn setup(self) -> Result<Schema, SchemaError> {
        tracing::info!("reading schema");
        let mut doc: Value = serde_json::from_slice(&self.raw).map_err(SchemaError::Parse)?;
        let fields = doc.as_object_mut().ok_or(SchemaError::NotAnObject)?;

        if let Some(host) = self.host {
            let old = fields.get("host").and_then(Value::as_str).unwrap_or_default();
            tracing::info!(new_base_url = %host, old_base_url = %old, "changing host in schema");
            fields.insert("host".to_string(), Value::String(host));
        }

        let content = serde_json::to_vec(&doc).map_err(SchemaError::Encode)?;
        Ok(Schema {
            content: Bytes::from(content),
        })
    }
}

impl Schema {
    /// The encoded document.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// A router answering `GET path` with the document.
    pub fn router(self, path: &str) -> Router {
        let content = self.content;
        Router::new().route(
            path,
            get(move || async move { ([(header::CONTENT_TYPE, "application/json")], content) }),
        )
    }
}
