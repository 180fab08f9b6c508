//! Mailbox access: a narrow trait for the pipeline plus the Gmail implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_gmail1::api::{MessagePart, Scope};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::GmailHub;
use crate::date_range::DateInterval;
use crate::error::{MergerError, Result};
use crate::models::{AttachmentMeta, MessageEnvelope};

/// Retry budget for transient API failures (initial attempt + 3 retries)
const MAX_ATTEMPTS: u32 = 4;

/// Build the Gmail search expression for an interval.
///
/// Gmail's `after:`/`before:` are a half-open day range, matching the
/// interval contract. The configured filter expression is appended
/// unmodified.
pub fn build_query(interval: &DateInterval, filter: &str) -> String {
    let mut query = format!(
        "after:{} before:{}",
        interval.start.format("%Y/%m/%d"),
        interval.end.format("%Y/%m/%d")
    );
    let filter = filter.trim();
    if !filter.is_empty() {
        query.push(' ');
        query.push_str(filter);
    }
    query
}

/// Everything the pipeline needs from a mailbox: search messages carrying
/// attachment metadata, and fetch one attachment's bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Run a search and return matching messages in retrieval order
    async fn search_messages(&self, query: &str) -> Result<Vec<MessageEnvelope>>;

    /// Fetch the raw bytes of one attachment
    async fn fetch_attachment(&self, attachment: &AttachmentMeta) -> Result<Vec<u8>>;
}

/// Production Gmail client with bounded retry on transient failures
pub struct GmailMailClient {
    hub: GmailHub,
}

impl GmailMailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }

    /// List all message IDs matching the query, following pagination
    async fn list_message_ids(&self, query: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let (_, response) = retry(|| async {
                let mut call = self
                    .hub
                    .users()
                    .messages_list("me")
                    .q(query)
                    .add_scope(Scope::Readonly);
                if let Some(token) = &page_token {
                    call = call.page_token(token);
                }
                call.doit().await.map_err(MergerError::from)
            })
            .await?;

            ids.extend(
                response
                    .messages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|msg| msg.id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    /// Fetch one message in full form and reduce it to an envelope
    async fn get_envelope(&self, id: &str) -> Result<MessageEnvelope> {
        let (_, message) = retry(|| async {
            self.hub
                .users()
                .messages_get("me", id)
                .format("full")
                .add_scope(Scope::Readonly)
                .doit()
                .await
                .map_err(MergerError::from)
        })
        .await?;

        let payload = message.payload.as_ref();

        let sender = payload
            .and_then(|part| header_value(part, "From"))
            .map(|raw| extract_address(&raw))
            .unwrap_or_else(|| "unknown".to_string());

        // Prefer the RFC 2822 Date header; fall back to Gmail's internal
        // receive timestamp, then to nothing.
        let date = payload
            .and_then(|part| header_value(part, "Date"))
            .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                message
                    .internal_date
                    .and_then(DateTime::from_timestamp_millis)
            });

        let mut attachments = Vec::new();
        if let Some(part) = payload {
            collect_attachments(id, part, &mut attachments);
        }

        Ok(MessageEnvelope {
            id: id.to_string(),
            sender,
            date,
            attachments,
        })
    }
}

#[async_trait]
impl MailClient for GmailMailClient {
    async fn search_messages(&self, query: &str) -> Result<Vec<MessageEnvelope>> {
        debug!("Searching mailbox with query: {}", query);
        let ids = self.list_message_ids(query).await?;
        debug!("Query matched {} message(s)", ids.len());

        // Sequential on purpose: retrieval order is contractual and flows
        // through to the merge order and summary numbering.
        let mut envelopes = Vec::with_capacity(ids.len());
        for id in &ids {
            envelopes.push(self.get_envelope(id).await?);
        }
        Ok(envelopes)
    }

    async fn fetch_attachment(&self, attachment: &AttachmentMeta) -> Result<Vec<u8>> {
        // Small attachments arrive inline with the message
        if let Some(data) = &attachment.data {
            return Ok(data.clone());
        }

        let attachment_id = attachment.attachment_id.as_deref().ok_or_else(|| {
            MergerError::ApiError(format!(
                "attachment '{}' has neither inline data nor an attachment id",
                attachment.filename
            ))
        })?;

        let (_, body) = retry(|| async {
            self.hub
                .users()
                .messages_attachments_get("me", &attachment.message_id, attachment_id)
                .add_scope(Scope::Readonly)
                .doit()
                .await
                .map_err(MergerError::from)
        })
        .await?;

        body.data.ok_or_else(|| {
            MergerError::ApiError(format!(
                "attachment '{}' returned no data",
                attachment.filename
            ))
        })
    }
}

/// Run an API call, retrying transient failures with exponential backoff.
/// Rate-limit responses wait out the server-provided delay instead.
async fn retry<T, F, Fut>(mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = Duration::from_millis(100);

    for attempt in 1..=MAX_ATTEMPTS {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < MAX_ATTEMPTS => {
                let wait = match &error {
                    MergerError::RateLimitExceeded { retry_after } => {
                        Duration::from_secs(*retry_after)
                    }
                    _ => delay,
                };
                warn!(
                    "Transient API failure (attempt {}/{}): {}; retrying in {:?}",
                    attempt, MAX_ATTEMPTS, error, wait
                );
                tokio::time::sleep(wait).await;
                delay *= 2;
            }
            Err(error) => return Err(error),
        }
    }

    unreachable!("retry loop always returns within MAX_ATTEMPTS")
}

/// First header with the given name, case-insensitively
fn header_value(part: &MessagePart, name: &str) -> Option<String> {
    part.headers.as_ref()?.iter().find_map(|header| {
        match (&header.name, &header.value) {
            (Some(header_name), Some(value)) if header_name.eq_ignore_ascii_case(name) => {
                Some(value.clone())
            }
            _ => None,
        }
    })
}

/// Pull the bare address out of a From header ("Jane Doe <jane@firm.com>")
fn extract_address(raw: &str) -> String {
    match (raw.find('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if open < close => raw[open + 1..close].trim().to_string(),
        _ => raw.trim().to_string(),
    }
}

/// Walk the MIME part tree collecting every named attachment in listing order
fn collect_attachments(message_id: &str, part: &MessagePart, out: &mut Vec<AttachmentMeta>) {
    if let Some(filename) = part.filename.as_deref() {
        if !filename.is_empty() {
            let body = part.body.as_ref();
            out.push(AttachmentMeta {
                message_id: message_id.to_string(),
                attachment_id: body.and_then(|b| b.attachment_id.clone()),
                filename: filename.to_string(),
                mime_type: part.mime_type.clone().unwrap_or_default(),
                data: body.and_then(|b| b.data.clone()),
            });
        }
    }

    if let Some(children) = &part.parts {
        for child in children {
            collect_attachments(message_id, child, out);
        }
    }
}
