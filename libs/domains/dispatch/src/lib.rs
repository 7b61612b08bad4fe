//! Dispatch Domain
//!
//! Streaming bulk-mail dispatch: turn one uploaded recipients file into one
//! paced run of per-recipient sends through the Microsoft Graph API, with
//! progress observable incrementally as a stream of typed events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   HTTP Handler   │  ← multipart upload + Authorization header
//! └────────┬─────────┘
//!          │ CampaignRequest
//! ┌────────▼─────────┐
//! │  Dispatch Engine │  ← preconditions, paced send loop
//! └────────┬─────────┘
//!          │ per recipient
//! ┌────────▼─────────┐
//! │   Mail Provider  │  ← Microsoft Graph sendMail
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  DispatchEvent   │  ← log / progress / error / complete
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_dispatch::{engine, providers::GraphMailer, CampaignRequest};
//!
//! let mailer = Arc::new(GraphMailer::new(client, GraphConfig::default()));
//! let events = engine::run(mailer, request);
//! // forward each event to the caller as an SSE frame
//! ```

pub mod attachment;
pub mod engine;
pub mod error;
pub mod models;
pub mod providers;
pub mod recipients;

// Re-export commonly used types
pub use error::{DispatchError, DispatchResult};
pub use models::{
    Attachment, CampaignRequest, DispatchEvent, DispatchJob, DispatchOutcome, MessageBody,
    RunSummary, SendStatus, UploadedFile,
};
pub use providers::{GraphConfig, GraphMailer, Mailer, OutboundMessage, SendOutcome};
