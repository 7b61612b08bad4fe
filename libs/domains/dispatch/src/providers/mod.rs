//! Mail provider implementations.
//!
//! This module contains the `Mailer` trait and the Microsoft Graph
//! implementation used in production. The trait is the seam the dispatch
//! engine sends through, so runs can be driven against a mock in tests.

mod graph;

pub use graph::{GraphConfig, GraphMailer};

use async_trait::async_trait;

use crate::error::DispatchResult;
use crate::models::{Attachment, MessageBody};

/// One outbound message, addressed to a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Subject line.
    pub subject: String,
    /// Body content and its content-type tag.
    pub body: MessageBody,
    /// The single recipient address.
    pub recipient: String,
    /// Zero-or-one attachment.
    pub attachment: Option<Attachment>,
}

/// How the mail API answered one send request.
///
/// A rejection is a per-recipient outcome, not an error: the run keeps
/// going. Transport-level failures surface as `Err` from [`Mailer::send`]
/// and abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The API accepted the message for delivery.
    Accepted,
    /// The API rejected the message; `detail` is the raw response body.
    Rejected {
        /// Opaque error detail from the API.
        detail: String,
    },
}

/// Trait for mail sending providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message with the given bearer credential attached.
    async fn send(&self, token: &str, message: &OutboundMessage) -> DispatchResult<SendOutcome>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
