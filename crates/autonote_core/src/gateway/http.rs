//! HTTP gateway for the remote notes API.
//!
//! # Responsibility
//! - Map gateway operations onto the `/notes` REST endpoints.
//! - Attach the session bearer credential to every request.
//! - Classify transport, status and decoding failures.
//!
//! # Invariants
//! - A 401 response invalidates the shared `Session` before returning.
//! - Updates always send a full note body (`title`, `content`, `tags`,
//!   `source_type`, `source_url`), never a bare patch.
//! - Response bodies are decoded and validated; malformed bodies surface as
//!   `GatewayError::Malformed`.

use crate::gateway::config::GatewayConfig;
use crate::gateway::session::Session;
use crate::gateway::{GatewayError, GatewayResult, NotesGateway};
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

const NOTES_SEGMENT: &str = "notes";
const USER_AGENT: &str = concat!("autonote/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed [`NotesGateway`].
pub struct HttpNotesGateway {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpNotesGateway {
    /// Builds a client with the configured timeout.
    pub fn new(config: &GatewayConfig, session: Session) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn notes_url(&self, id: Option<&NoteId>) -> GatewayResult<Url> {
        endpoint(&self.base_url, id)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> GatewayResult<String> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_transport)?;

        if (200..300).contains(&status) {
            debug!("event=http_response module=gateway status=ok code={status}");
            return Ok(body);
        }

        let err = classify_status(status, extract_server_message(&body));
        if matches!(err, GatewayError::Unauthorized(_)) {
            self.session.invalidate();
            warn!("event=session_invalidated module=gateway status=error code={status}");
        } else {
            warn!("event=http_response module=gateway status=error code={status}");
        }
        Err(err)
    }
}

impl NotesGateway for HttpNotesGateway {
    async fn list(&self) -> GatewayResult<Vec<Note>> {
        let url = self.notes_url(None)?;
        let body = self.send(self.client.get(url)).await?;
        decode(&body)
    }

    async fn get(&self, id: &NoteId) -> GatewayResult<Note> {
        let url = self.notes_url(Some(id))?;
        let body = self.send(self.client.get(url)).await?;
        decode(&body)
    }

    async fn create(&self, draft: &NoteDraft) -> GatewayResult<Note> {
        let url = self.notes_url(None)?;
        let body = self.send(self.client.post(url).json(draft)).await?;
        decode(&body)
    }

    /// `PUT` replaces the whole record remotely, so the current note is
    /// fetched first and the patch applied to it.
    async fn update(&self, id: &NoteId, patch: &NotePatch) -> GatewayResult<Note> {
        let current = self.get(id).await?;
        let payload = patch.apply_to(&current);
        let url = self.notes_url(Some(id))?;
        let body = self.send(self.client.put(url).json(&payload)).await?;
        decode(&body)
    }

    async fn delete(&self, id: &NoteId) -> GatewayResult<()> {
        let url = self.notes_url(Some(id))?;
        self.send(self.client.delete(url)).await.map(|_| ())
    }
}

/// Builds `<base>/notes` or `<base>/notes/<id>` with the id percent-encoded.
fn endpoint(base_url: &Url, id: Option<&NoteId>) -> GatewayResult<Url> {
    let mut url = base_url.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            GatewayError::Transport(format!("api url `{base_url}` cannot carry a path"))
        })?;
        segments.pop_if_empty().push(NOTES_SEGMENT);
        if let Some(id) = id {
            segments.push(id.as_str());
        }
    }
    Ok(url)
}

fn classify_transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn classify_status(status: u16, message: Option<String>) -> GatewayError {
    match status {
        401 => GatewayError::Unauthorized(message),
        404 => GatewayError::NotFound(message),
        _ => GatewayError::Remote { status, message },
    }
}

/// Extracts a human-readable message from an error body.
///
/// Understands `{"detail": "..."}` and `{"message": "..."}`; structured
/// validation details (arrays) are ignored.
fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

fn decode<T: DeserializeOwned>(body: &str) -> GatewayResult<T> {
    serde_json::from_str(body).map_err(|err| GatewayError::Malformed(err.to_string()))
}
