use thiserror::Error;

/// Type alias for Result with MergerError
pub type Result<T> = std::result::Result<T, MergerError>;

/// Error types for the attachment merger pipeline
#[derive(Error, Debug)]
pub enum MergerError {
    /// A custom period bound did not parse under the fixed YYYY/MM/DD pattern.
    /// Fatal: the date range is foundational to the mailbox query.
    #[error("Invalid date format: {0} (expected YYYY/MM/DD)")]
    InvalidDateFormat(String),

    /// A single attachment could not be fetched, converted or written.
    /// Recovered inside the processing loop; never aborts sibling attachments.
    #[error("Failed to process attachment '{filename}': {source}")]
    AttachmentFailure {
        filename: String,
        #[source]
        source: Box<MergerError>,
    },

    /// The combined PDF could not be produced. Reported but non-fatal:
    /// per-attachment files are already persisted.
    #[error("Could not assemble the combined PDF: {source}")]
    AggregationFailed {
        #[source]
        source: Box<MergerError>,
    },

    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded - should retry after specified seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The attachment bytes do not look like a JPEG we can place on a page
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// The PDF library rejected an input or output document
    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MergerError {
    /// Check if the error is transient and the API call should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MergerError::RateLimitExceeded { .. }
                | MergerError::ServerError { .. }
                | MergerError::NetworkError(_)
        )
    }

    /// Wrap an error as a per-attachment failure carrying the original filename
    pub fn for_attachment(self, filename: &str) -> Self {
        MergerError::AttachmentFailure {
            filename: filename.to_string(),
            source: Box::new(self),
        }
    }
}

/// Parse the Retry-After header from an HTTP response.
///
/// Only the delay-seconds form is handled; a missing or malformed header
/// falls back to a 5 second default.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

impl From<google_gmail1::Error> for MergerError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    // Rate limiting - transient
                    429 => {
                        let retry_after = parse_retry_after_header(response);
                        MergerError::RateLimitExceeded { retry_after }
                    }
                    404 => MergerError::MessageNotFound("Resource not found".to_string()),
                    400 => MergerError::BadRequest(message),
                    // Server errors - transient
                    500..=599 => MergerError::ServerError {
                        status: status_code,
                        message,
                    },
                    _ => MergerError::ApiError(message),
                }
            }
            // BadRequest variant (request not understood by server)
            google_gmail1::Error::BadRequest(ref err) => MergerError::BadRequest(format!("{}", err)),
            // Network/connection errors - transient
            google_gmail1::Error::HttpError(ref err) => {
                MergerError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => MergerError::NetworkError(err.to_string()),
            _ => MergerError::ApiError(error.to_string()),
        }
    }
}
