//! CSRF-protected file download from the 3DSpace document modeler.
//!
//! One download is four dependent steps:
//!
//! 1. `GET documents/{doc}` → the document's CSRF token.
//! 2. `PUT documents/{doc}/files/{file}/DownloadTicket` with
//!    `ENO_CSRF_TOKEN` → a single-use ticket URL.
//! 3. `GET <ticket URL>`, following redirects → the file bytes, streamed
//!    into a temporary file next to the destination.
//! 4. Rename the temporary file over the destination.
//!
//! Tokens and tickets are single-use, so a failure at any step aborts the
//! whole download and leaves the destination untouched. Callers that want to
//! try again start over at step 1.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use enovia_models::{
    CsrfToken, DocumentId, DocumentResponse, DownloadStep, DownloadTicket, FileId,
    TicketResponse,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{rejection, EnoviaError};
use crate::session::SessionContext;

/// Header carrying the document's anti-forgery token.
pub const CSRF_HEADER: &str = "ENO_CSRF_TOKEN";

/// One file to fetch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Document the file is attached to.
    pub document: DocumentId,
    /// File to fetch.
    pub file: FileId,
    /// Where to write the bytes.
    pub destination: PathBuf,
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Document the file is attached to.
    pub document: DocumentId,
    /// File that was fetched.
    pub file: FileId,
    /// Where the bytes were written.
    pub destination: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Downloads document files over an authenticated session.
#[derive(Debug, Clone)]
pub struct SecureDownloadClient {
    session: Arc<SessionContext>,
}

impl SecureDownloadClient {
    /// Create a client bound to `session`.
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    /// The session requests are sent on.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Fetch `file` of `document` and write it to `destination`.
    pub async fn download(
        &self,
        document: &DocumentId,
        file: &FileId,
        destination: impl AsRef<Path>,
    ) -> Result<DownloadReport, EnoviaError> {
        let destination = destination.as_ref();
        info!(
            document = %document,
            file = %file,
            destination = %destination.display(),
            "downloading document file"
        );

        let token = self.fetch_csrf_token(document).await?;
        let ticket = self.issue_ticket(token, file).await?;
        let bytes = self.redeem(ticket, destination).await?;

        info!(document = %document, file = %file, bytes, "document file downloaded");
        Ok(DownloadReport {
            document: document.clone(),
            file: file.clone(),
            destination: destination.to_path_buf(),
            bytes,
        })
    }

    /// Run a [`DownloadRequest`].
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadReport, EnoviaError> {
        self.download(&request.document, &request.file, &request.destination)
            .await
    }

    /// Step 1: read the CSRF token of `document`.
    ///
    /// A payload without a token yields an empty token rather than an error;
    /// the server decides at ticket issuance whether it needed one.
    pub async fn fetch_csrf_token(&self, document: &DocumentId) -> Result<CsrfToken, EnoviaError> {
        let step = DownloadStep::Document;
        let response = self
            .session
            .get(self.session.endpoints().document(document))
            .send()
            .await
            .map_err(|e| EnoviaError::download(step, e.status(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnoviaError::download(step, Some(status), rejection(status, &body)));
        }

        let payload: DocumentResponse = response.json().await.map_err(|e| {
            EnoviaError::download(step, Some(status), format!("unreadable document payload: {e}"))
        })?;
        let token = CsrfToken::new(document.clone(), payload.csrf_value());
        if token.is_empty() {
            debug!(document = %document, "document payload carries no CSRF token");
        }
        Ok(token)
    }

    /// Step 2: request a download ticket for `file` of the token's document.
    pub async fn issue_ticket(
        &self,
        token: CsrfToken,
        file: &FileId,
    ) -> Result<DownloadTicket, EnoviaError> {
        let step = DownloadStep::TicketIssuance;
        let document = token.document().clone();
        let response = self
            .session
            .put(self.session.endpoints().download_ticket(&document, file))
            .header(CSRF_HEADER, token.expose())
            .send()
            .await
            .map_err(|e| EnoviaError::download(step, e.status(), e.to_string()))?;
        drop(token);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnoviaError::download(step, Some(status), rejection(status, &body)));
        }

        let payload: TicketResponse = response.json().await.map_err(|e| {
            EnoviaError::download(step, Some(status), format!("unreadable ticket payload: {e}"))
        })?;
        let url = payload.into_first_url().ok_or_else(|| {
            EnoviaError::download(step, Some(status), "response carries no ticketURL")
        })?;

        debug!(document = %document, file = %file, "download ticket issued");
        Ok(DownloadTicket::new(document, file.clone(), url))
    }

    /// Step 3: follow the ticket URL and stream the file into `destination`.
    ///
    /// Returns the number of bytes written. The body goes to a temporary file
    /// in the destination's directory, renamed into place once complete.
    pub async fn redeem(
        &self,
        ticket: DownloadTicket,
        destination: &Path,
    ) -> Result<u64, EnoviaError> {
        let step = DownloadStep::TicketRedemption;
        let url = ticket.redeem();
        let response = self
            .session
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| EnoviaError::download(step, e.status(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnoviaError::download(step, Some(status), rejection(status, &body)));
        }
        debug!(final_url_host = response.url().host_str().unwrap_or(""), "ticket redeemed");

        let io_error = |source: std::io::Error| EnoviaError::Io {
            path: destination.to_path_buf(),
            source,
        };
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropping `partial` on any early return removes the temporary file.
        let (file, partial) = tempfile::Builder::new()
            .prefix(".enovia-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(io_error)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                EnoviaError::download(step, Some(status), format!("body read failed: {e}"))
            })?;
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;
        drop(file);

        partial
            .persist(destination)
            .map_err(|e| io_error(e.error))?;
        Ok(written)
    }
}
