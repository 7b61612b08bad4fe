//! Microsoft Graph mail provider implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use super::{Mailer, OutboundMessage, SendOutcome};
use crate::error::DispatchResult;

/// Microsoft Graph API configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Graph API base URL (defaults to production).
    pub api_url: String,
}

impl GraphConfig {
    /// Create a new Graph configuration with a custom base URL.
    pub fn new(api_url: String) -> Self {
        Self { api_url }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_url: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

/// Microsoft Graph mail provider.
///
/// Sends through `POST /me/sendMail` on behalf of the user whose bearer
/// token accompanies each send. The token is per-request, not part of the
/// provider, because every campaign arrives with its own credential.
pub struct GraphMailer {
    config: GraphConfig,
    client: Client,
}

impl GraphMailer {
    /// Create a new Graph provider sharing an existing HTTP client.
    pub fn new(client: Client, config: GraphConfig) -> Self {
        Self { config, client }
    }
}

// Graph API request structures

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    message: GraphMessage<'a>,
    #[serde(rename = "saveToSentItems")]
    save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
struct GraphMessage<'a> {
    subject: &'a str,
    body: GraphBody<'a>,
    #[serde(rename = "toRecipients")]
    to_recipients: Vec<GraphRecipient<'a>>,
    attachments: Vec<GraphAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct GraphBody<'a> {
    #[serde(rename = "contentType")]
    content_type: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphRecipient<'a> {
    #[serde(rename = "emailAddress")]
    email_address: GraphAddress<'a>,
}

#[derive(Debug, Serialize)]
struct GraphAddress<'a> {
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphAttachment<'a> {
    #[serde(rename = "@odata.type")]
    odata_type: &'static str,
    name: &'a str,
    #[serde(rename = "contentBytes")]
    content_bytes: &'a str,
}

fn wire_request(message: &OutboundMessage) -> SendMailRequest<'_> {
    let attachments = message
        .attachment
        .iter()
        .map(|attachment| GraphAttachment {
            odata_type: "#microsoft.graph.fileAttachment",
            name: &attachment.name,
            content_bytes: &attachment.content_bytes,
        })
        .collect();

    SendMailRequest {
        message: GraphMessage {
            subject: &message.subject,
            body: GraphBody {
                content_type: message.body.content_type(),
                content: message.body.content(),
            },
            to_recipients: vec![GraphRecipient {
                email_address: GraphAddress {
                    address: &message.recipient,
                },
            }],
            attachments,
        },
        save_to_sent_items: true,
    }
}

#[async_trait]
impl Mailer for GraphMailer {
    async fn send(&self, token: &str, message: &OutboundMessage) -> DispatchResult<SendOutcome> {
        let request = wire_request(message);

        debug!(
            recipient = %message.recipient,
            subject = %message.subject,
            has_attachment = message.attachment.is_some(),
            "Sending message via Microsoft Graph"
        );

        let response = self
            .client
            .post(format!("{}/me/sendMail", self.config.api_url))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        // Graph acknowledges sendMail with 202 Accepted and an empty body;
        // anything else is a rejection whose body text is the error detail.
        if status == StatusCode::ACCEPTED {
            Ok(SendOutcome::Accepted)
        } else {
            let detail = response.text().await.unwrap_or_default();
            error!(
                recipient = %message.recipient,
                status = %status,
                error = %detail,
                "Microsoft Graph rejected message"
            );
            Ok(SendOutcome::Rejected { detail })
        }
    }

    fn name(&self) -> &'static str {
        "Microsoft Graph"
    }
}
