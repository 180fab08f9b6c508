//! OAuth2 authentication and Gmail API hub construction

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::path::Path;

use crate::error::{MergerError, Result};

/// This tool only ever reads the mailbox; nothing needs a broader scope.
pub const REQUIRED_SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.readonly"];

/// Type alias for the Gmail hub to simplify signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Initialize the Gmail API hub with OAuth2 installed-flow authentication.
///
/// Tokens are persisted to disk so subsequent runs skip the browser round
/// trip; the flow opens a browser the first time.
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<GmailHub> {
    // Read OAuth2 client credentials
    let secret = yup_oauth2::read_application_secret(credentials_path)
        .await
        .map_err(|e| MergerError::AuthError(format!("Failed to read credentials: {}", e)))?;

    // Build authenticator with token persistence
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| MergerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Pre-authenticate so the cached token carries the right scope
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| MergerError::AuthError(format!("Failed to obtain token: {}", e)))?;

    // HTTP/1 for compatibility with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| MergerError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}
