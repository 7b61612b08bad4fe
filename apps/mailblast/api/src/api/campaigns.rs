//! Campaign dispatch route: multipart upload in, Server-Sent Events out.
//!
//! The handler never rejects a request out of band: precondition failures
//! (missing credential, missing file, no valid recipients) surface as
//! `error` events on the same stream the frontend is already reading.

use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::post;
use axum::Router;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use domain_dispatch::{engine, CampaignRequest, MessageBody, UploadedFile};
use futures::{Stream, StreamExt};
use tracing::warn;

use crate::state::AppState;

/// Pacing interval applied when the form omits `delay` or sends junk.
const DEFAULT_DELAY_SECS: u64 = 5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/send-emails-stream", post(stream_campaign))
        .with_state(state)
}

/// `POST /api/send-emails-stream`
///
/// Multipart form: `recipientsFile` (required), `attachmentFile` (optional),
/// `subject`, `bodyText` or `bodyHtml`, `delay` in whole seconds. The
/// response is a one-shot event stream for this run; every engine event
/// becomes one `data:` frame.
async fn stream_campaign(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    multipart: Multipart,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let bearer_token =
        auth.map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());
    let request = parse_form(bearer_token, multipart).await;

    let events = engine::run(state.mailer.clone(), request)
        .map(|event| Event::default().json_data(&event));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Read the whole multipart form into a [`CampaignRequest`].
///
/// Files are buffered fully up front so no upload stream stays open across
/// the paced send loop. Malformed parts are logged and skipped; whatever is
/// missing afterwards is reported by the engine's precondition checks.
async fn parse_form(bearer_token: Option<String>, mut multipart: Multipart) -> CampaignRequest {
    let mut subject = String::new();
    let mut body_text: Option<String> = None;
    let mut body_html: Option<String> = None;
    let mut delay_secs = DEFAULT_DELAY_SECS;
    let mut recipients_file: Option<UploadedFile> = None;
    let mut attachment_file: Option<UploadedFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read multipart field, stopping form parse");
                break;
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "subject" => subject = field.text().await.unwrap_or_default(),
            "bodyText" => body_text = field.text().await.ok(),
            "bodyHtml" => body_html = field.text().await.ok(),
            "delay" => {
                let raw = field.text().await.unwrap_or_default();
                delay_secs = raw.trim().parse().unwrap_or_else(|_| {
                    warn!(delay = %raw, "invalid delay value, using default");
                    DEFAULT_DELAY_SECS
                });
            }
            "recipientsFile" => recipients_file = read_file(field).await,
            "attachmentFile" => attachment_file = read_file(field).await,
            other => warn!(field = %other, "ignoring unknown form field"),
        }
    }

    // bodyHtml selects the HTML content type; bodyText (or nothing) stays
    // plain text.
    let body = match body_html {
        Some(html) => MessageBody::Html(html),
        None => MessageBody::Text(body_text.unwrap_or_default()),
    };

    CampaignRequest {
        bearer_token,
        subject,
        body,
        delay: Duration::from_secs(delay_secs),
        recipients_file,
        attachment_file,
    }
}

/// Buffer one uploaded file part. An unnamed or empty part counts as no
/// file at all.
async fn read_file(field: axum::extract::multipart::Field<'_>) -> Option<UploadedFile> {
    let filename = field.file_name().unwrap_or_default().to_string();
    match field.bytes().await {
        Ok(bytes) if !bytes.is_empty() => Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        }),
        Ok(_) => None,
        Err(err) => {
            warn!(filename = %filename, error = %err, "failed to read uploaded file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment, ServerConfig};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_dispatch::{DispatchResult, Mailer, OutboundMessage, SendOutcome};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt; // For oneshot()

    /// Mailer that accepts everything without touching the network.
    struct AcceptAllMailer;

    #[async_trait]
    impl Mailer for AcceptAllMailer {
        async fn send(
            &self,
            _token: &str,
            _message: &OutboundMessage,
        ) -> DispatchResult<SendOutcome> {
            Ok(SendOutcome::Accepted)
        }

        fn name(&self) -> &'static str {
            "AcceptAll"
        }
    }

    fn test_state() -> AppState {
        let config = Config {
            server: ServerConfig::default(),
            frontend_url: "http://localhost:5173".to_string(),
            graph_api_url: "https://graph.microsoft.com/v1.0".to_string(),
            environment: Environment::Development,
        };
        AppState::new(config, Arc::new(AcceptAllMailer))
    }

    const BOUNDARY: &str = "test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, filename: &str, contents: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n"
        )
    }

    fn form_body(parts: &[String]) -> Body {
        Body::from(format!("{}--{BOUNDARY}--\r\n", parts.concat()))
    }

    async fn post_stream(body: Body, with_auth: bool) -> (StatusCode, Option<String>, String) {
        let app = router(test_state());

        let mut request = Request::builder()
            .method("POST")
            .uri("/send-emails-stream")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if with_auth {
            request = request.header("authorization", "Bearer token-123");
        }

        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_stream_emits_log_progress_and_complete_frames() {
        let body = form_body(&[
            file_part("recipientsFile", "list.csv", "a@x.com\nb@x.com"),
            text_part("subject", "Hello"),
            text_part("bodyText", "Hi"),
            text_part("delay", "0"),
        ]);

        let (status, content_type, frames) = post_stream(body, true).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/event-stream"));
        assert!(frames.contains(r#"data: {"type":"log","data":"Loaded 2 recipients."}"#));
        assert!(frames
            .contains(r#"data: {"type":"progress","data":{"email":"a@x.com","status":"sent"}}"#));
        assert!(frames
            .contains(r#"data: {"type":"progress","data":{"email":"b@x.com","status":"sent"}}"#));
        assert!(frames.contains(
            r#"data: {"type":"complete","data":{"sent":2,"failed":0,"message":"Process completed."}}"#
        ));
    }

    #[tokio::test]
    async fn test_missing_authorization_yields_single_error_frame() {
        let body = form_body(&[
            file_part("recipientsFile", "list.csv", "a@x.com"),
            text_part("delay", "0"),
        ]);

        let (status, _, frames) = post_stream(body, false).await;

        assert_eq!(status, StatusCode::OK);
        assert!(frames
            .contains(r#"data: {"type":"error","data":{"message":"Authorization header is missing."}}"#));
        assert!(!frames.contains(r#""type":"progress""#));
    }

    #[tokio::test]
    async fn test_missing_recipients_file_yields_error_frame() {
        let body = form_body(&[text_part("subject", "Hello"), text_part("delay", "0")]);

        let (_, _, frames) = post_stream(body, true).await;

        assert!(frames
            .contains(r#"data: {"type":"error","data":{"message":"Recipients file is required."}}"#));
    }

    async fn multipart_from(parts: &[String]) -> Multipart {
        use axum::extract::FromRequest;

        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(form_body(parts))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_parse_form_defaults_to_plain_text_and_default_delay() {
        let multipart = multipart_from(&[]).await;
        let parsed = parse_form(Some("token".to_string()), multipart).await;

        assert_eq!(parsed.body, MessageBody::Text(String::new()));
        assert_eq!(parsed.delay, Duration::from_secs(DEFAULT_DELAY_SECS));
        assert!(parsed.recipients_file.is_none());
        assert!(parsed.attachment_file.is_none());
    }

    #[tokio::test]
    async fn test_parse_form_body_html_wins_over_body_text() {
        let multipart = multipart_from(&[
            text_part("bodyText", "plain"),
            text_part("bodyHtml", "<b>rich</b>"),
        ])
        .await;
        let parsed = parse_form(None, multipart).await;

        assert_eq!(parsed.body, MessageBody::Html("<b>rich</b>".to_string()));
    }

    #[tokio::test]
    async fn test_parse_form_invalid_delay_falls_back_to_default() {
        let multipart = multipart_from(&[text_part("delay", "soon")]).await;
        let parsed = parse_form(None, multipart).await;

        assert_eq!(parsed.delay, Duration::from_secs(DEFAULT_DELAY_SECS));
    }

    #[tokio::test]
    async fn test_parse_form_reads_uploaded_files() {
        let multipart = multipart_from(&[
            file_part("recipientsFile", "list.csv", "a@x.com"),
            file_part("attachmentFile", "note.txt", "hi"),
        ])
        .await;
        let parsed = parse_form(None, multipart).await;

        let recipients = parsed.recipients_file.unwrap();
        assert_eq!(recipients.filename, "list.csv");
        assert_eq!(recipients.bytes, b"a@x.com");
        assert_eq!(parsed.attachment_file.unwrap().filename, "note.txt");
    }
}
