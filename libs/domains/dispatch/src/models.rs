//! Data models for the dispatch domain.

use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Inbound Request Types
// ============================================================================

/// An uploaded file, fully read into memory.
///
/// Both the recipients file and the attachment are buffered before a run
/// starts so no file handle stays open across the paced send loop, which can
/// run for minutes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Declared filename, used to select a parsing strategy by extension.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Message body variant, selecting the content type sent to the mail API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain-text body.
    Text(String),
    /// HTML body.
    Html(String),
}

impl MessageBody {
    /// Content-type tag as the Graph API expects it.
    pub fn content_type(&self) -> &'static str {
        match self {
            MessageBody::Text(_) => "Text",
            MessageBody::Html(_) => "HTML",
        }
    }

    /// The body content itself.
    pub fn content(&self) -> &str {
        match self {
            MessageBody::Text(content) | MessageBody::Html(content) => content,
        }
    }
}

/// Raw parameters of one campaign request, as delivered by the HTTP shell.
///
/// Nothing here is validated yet; the engine checks preconditions and
/// reports violations on the event stream rather than out of band.
#[derive(Debug, Clone)]
pub struct CampaignRequest {
    /// Bearer token from the `Authorization` header, if one was sent.
    pub bearer_token: Option<String>,
    /// Subject line for every outbound message.
    pub subject: String,
    /// Message body and its content type.
    pub body: MessageBody,
    /// Pacing delay enforced after every send attempt.
    pub delay: Duration,
    /// The uploaded recipients file, if one was sent.
    pub recipients_file: Option<UploadedFile>,
    /// Optional attachment file.
    pub attachment_file: Option<UploadedFile>,
}

/// Validated, immutable parameters for one run.
///
/// Built by the engine once all preconditions pass; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    /// Bearer credential attached to every mail API call.
    pub token: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: MessageBody,
    /// Encoded attachment, identical for every recipient.
    pub attachment: Option<Attachment>,
    /// Pacing delay between sends.
    pub delay: Duration,
    /// Deduplicated recipient addresses in dispatch order.
    pub recipients: Vec<String>,
}

// ============================================================================
// Attachment
// ============================================================================

/// An attachment in the transport encoding the mail API expects.
///
/// Invariant: both fields are always populated. Partial attachment input is
/// treated upstream as no attachment at all.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment filename.
    pub name: String,
    /// Base64-encoded file contents.
    pub content_bytes: String,
}

// ============================================================================
// Outcome & Event Types
// ============================================================================

/// Result status of one send attempt.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    /// The mail API accepted the message (HTTP 202).
    Sent,
    /// The mail API rejected the message.
    Failed,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendStatus::Sent => write!(f, "sent"),
            SendStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-recipient outcome, emitted as soon as the send attempt resolves.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Recipient address.
    pub email: String,
    /// Whether the message was accepted.
    pub status: SendStatus,
    /// Opaque error detail from the mail API, on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    /// Outcome for an accepted message.
    pub fn sent(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: SendStatus::Sent,
            error: None,
        }
    }

    /// Outcome for a rejected message, with the API's error detail.
    pub fn failed(email: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: SendStatus::Failed,
            error: Some(detail.into()),
        }
    }
}

/// Final counts for one run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of accepted messages.
    pub sent: u32,
    /// Number of rejected messages.
    pub failed: u32,
    /// Human-readable completion message.
    pub message: String,
}

impl RunSummary {
    /// Summary for a completed run.
    pub fn new(sent: u32, failed: u32) -> Self {
        Self {
            sent,
            failed,
            message: "Process completed.".to_string(),
        }
    }
}

/// Payload of a fatal `error` event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Best-effort description of what went wrong.
    pub message: String,
}

/// One event on the campaign stream.
///
/// Closed set of event shapes: the emitter cannot produce an unrecognized
/// event. Serializes as `{"type": <tag>, "data": <payload>}`, the frame
/// format the frontend consumes. `Error` and `Complete` are terminal: the
/// engine never yields another event after either.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum DispatchEvent {
    /// Informational message, e.g. the recipient count loaded.
    Log(String),
    /// One per-recipient outcome.
    Progress(DispatchOutcome),
    /// Fatal error; always the last event on its stream.
    Error(ErrorMessage),
    /// Final summary; always the last event of a successful run.
    Complete(RunSummary),
}

impl DispatchEvent {
    /// Informational log event.
    pub fn log(message: impl Into<String>) -> Self {
        DispatchEvent::Log(message.into())
    }

    /// Fatal error event.
    pub fn error(message: impl Into<String>) -> Self {
        DispatchEvent::Error(ErrorMessage {
            message: message.into(),
        })
    }
}
