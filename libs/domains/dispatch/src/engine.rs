//! The dispatch engine: a paced, per-recipient send loop exposed as an
//! ordered event stream.
//!
//! One run is one cooperative task with two suspension points, the outbound
//! mail API call and the pacing timer. Recipients are processed strictly one
//! at a time so callers see a steady feed of progress events rather than a
//! burst. Because the loop lives inside the stream, dropping the stream (a
//! caller disconnecting) cancels the run at the next suspension point.

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use tracing::{error, info};

use crate::attachment;
use crate::error::DispatchError;
use crate::models::{
    CampaignRequest, DispatchEvent, DispatchJob, DispatchOutcome, RunSummary,
};
use crate::providers::{Mailer, OutboundMessage, SendOutcome};
use crate::recipients;

/// Check preconditions and assemble the immutable job for one run.
///
/// Checked in order, each failure terminal: credential present, recipients
/// file present, extractor yields at least one address.
fn prepare(request: CampaignRequest) -> Result<DispatchJob, DispatchError> {
    let token = request
        .bearer_token
        .filter(|token| !token.is_empty())
        .ok_or(DispatchError::MissingCredential)?;

    let file = request
        .recipients_file
        .ok_or(DispatchError::MissingRecipientsFile)?;

    let recipients = recipients::extract(&file.bytes, &file.filename);
    if recipients.is_empty() {
        return Err(DispatchError::NoRecipients(file.filename));
    }

    Ok(DispatchJob {
        token,
        subject: request.subject,
        body: request.body,
        attachment: attachment::encode(request.attachment_file),
        delay: request.delay,
        recipients,
    })
}

/// Run one campaign, yielding events in the exact order they occur.
///
/// Event grammar: either a single `Error`, or one `Log`, then one `Progress`
/// per recipient, then exactly one of `Complete` (success path) or `Error`
/// (a transport failure abandoned the run mid-loop). Nothing follows a
/// terminal event.
pub fn run(
    mailer: Arc<dyn Mailer>,
    request: CampaignRequest,
) -> impl Stream<Item = DispatchEvent> {
    stream! {
        let job = match prepare(request) {
            Ok(job) => job,
            Err(err) => {
                yield DispatchEvent::error(err.to_string());
                return;
            }
        };

        info!(
            recipients = job.recipients.len(),
            provider = mailer.name(),
            delay_secs = job.delay.as_secs(),
            "Starting dispatch run"
        );
        yield DispatchEvent::log(format!("Loaded {} recipients.", job.recipients.len()));

        let mut sent: u32 = 0;
        let mut failed: u32 = 0;

        for recipient in &job.recipients {
            let message = OutboundMessage {
                subject: job.subject.clone(),
                body: job.body.clone(),
                recipient: recipient.clone(),
                attachment: job.attachment.clone(),
            };

            match mailer.send(&job.token, &message).await {
                Ok(SendOutcome::Accepted) => {
                    sent += 1;
                    yield DispatchEvent::Progress(DispatchOutcome::sent(recipient.clone()));
                }
                Ok(SendOutcome::Rejected { detail }) => {
                    failed += 1;
                    yield DispatchEvent::Progress(DispatchOutcome::failed(
                        recipient.clone(),
                        detail,
                    ));
                }
                Err(err) => {
                    // API rejections are per-recipient outcomes; anything
                    // else abandons the run. Outcomes already emitted stand.
                    error!(
                        recipient = %recipient,
                        error = %err,
                        "Unexpected failure, abandoning run"
                    );
                    yield DispatchEvent::error(err.to_string());
                    return;
                }
            }

            // Fixed pacing delay after every send attempt, failures and the
            // last recipient included. Crude throughput limiter against the
            // mail API.
            tokio::time::sleep(job.delay).await;
        }

        info!(sent, failed, "Dispatch run complete");
        yield DispatchEvent::Complete(RunSummary::new(sent, failed));
    }
}
