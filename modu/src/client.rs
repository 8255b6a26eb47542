// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Streaming chat client
//
// Responsibilities:
// - Build the chat request (JSON body, auth, request id)
// - Send it through an injected HttpSender
// - Turn a non-2xx status into a user-facing notice, but keep reading
// - Hand `text/event-stream` bodies to an EventReader
// - Buffer any other body in full as plain text

use crate::config::{Config, ServerConfig};
use crate::sse::{is_event_stream, EventReader, StreamLimits};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timeout_ms: Option<u64>,
}

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
}

/// POSTs a request and returns the response with a streaming body.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

pub struct ReqwestHttpSender {
    client: reqwest::Client,
}

impl ReqwestHttpSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout(e.to_string())
    } else {
        HttpError::Transport(e.to_string())
    }
}

#[async_trait]
impl HttpSender for ReqwestHttpSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut req = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .body(request.body);

        if let Some(timeout_ms) = request.timeout_ms {
            req = req.timeout(std::time::Duration::from_millis(timeout_ms));
        }

        let resp = req.send().await.map_err(map_reqwest_error)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes_stream().map_err(map_reqwest_error);

        Ok(HttpResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

// ---------------------------------------------------------------------------
// Chat request / response
// ---------------------------------------------------------------------------

/// Body of a chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_uid: Option<String>,
    pub content: String,
}

/// How the response body is delivered.
#[derive(Debug)]
pub enum ResponseBody {
    /// `text/event-stream`: parsed records, ending with `done`.
    Events(EventReader),
    /// Anything else, read in full.
    Text(String),
}

#[derive(Debug)]
pub struct ChatResponse {
    pub request_id: String,
    pub status: StatusCode,
    /// User-facing message for a non-2xx status. The body is still
    /// delivered so the caller can show whatever the server sent.
    pub status_notice: Option<String>,
    pub body: ResponseBody,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("failed to encode chat request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

pub struct ChatClient {
    http: Arc<dyn HttpSender>,
    server: ServerConfig,
    limits: StreamLimits,
}

impl ChatClient {
    pub fn new(http: Arc<dyn HttpSender>, server: ServerConfig, limits: StreamLimits) -> Self {
        Self {
            http,
            server,
            limits,
        }
    }

    /// Client backed by reqwest, using the endpoint and limits from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(ReqwestHttpSender::new(reqwest::Client::new())),
            config.server.clone(),
            config.stream,
        )
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let request_id = Uuid::new_v4().to_string();
        let http_request = HttpRequest {
            url: self.server.chat_url(),
            headers: self.headers(&request_id)?,
            body: Bytes::from(serde_json::to_vec(request)?),
            timeout_ms: self.server.timeout_ms,
        };

        tracing::debug!(
            request_id = %request_id,
            url = %http_request.url,
            conversation_uid = ?request.conversation_uid,
            "sending chat request"
        );

        let response = self.http.send(http_request).await.map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "chat request failed");
            e
        })?;

        let status_notice = status_notice(response.status);
        if let Some(notice) = &status_notice {
            tracing::warn!(
                request_id = %request_id,
                status = response.status.as_u16(),
                notice = %notice,
                "chat request returned error status"
            );
        }

        let streaming = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_event_stream)
            .unwrap_or(false);

        let body = if streaming {
            ResponseBody::Events(EventReader::spawn(response.body, self.limits))
        } else {
            ResponseBody::Text(read_text(response.body).await?)
        };

        tracing::debug!(
            request_id = %request_id,
            status = response.status.as_u16(),
            streaming,
            "chat response received"
        );

        Ok(ChatResponse {
            request_id,
            status: response.status,
            status_notice,
            body,
        })
    }

    fn headers(&self, request_id: &str) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(
            "x-request-id",
            HeaderValue::from_str(request_id)
                .map_err(|_| ClientError::InvalidHeader { name: "x-request-id" })?,
        );
        if let Some(token) = &self.server.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidHeader { name: "authorization" })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// The message shown to the user when the server answers with an error
/// status. `None` for 2xx.
pub fn status_notice(status: StatusCode) -> Option<String> {
    if status.is_success() {
        return None;
    }
    Some(match status.canonical_reason() {
        Some(reason) => format!("Request failed ({} {reason})", status.as_u16()),
        None => format!("Request failed ({})", status.as_u16()),
    })
}

async fn read_text(mut body: BodyStream) -> Result<String, HttpError> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
