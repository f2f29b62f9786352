//! Long-lived client owning the authenticated session.
//!
//! [`EnoviaClient`] is created once at startup and handed to whatever issues
//! protected calls. It holds the only [`SessionContext`] of the process and
//! serializes re-authentication, so at most one ticket exchange is in flight.
//!
//! # Session expiry
//!
//! When a download step is answered `401 Unauthorized` and
//! [`ClientOptions::reauthenticate_on_expiry`] is set, the client runs the
//! ticket exchange again and restarts that download from the document fetch,
//! once. Concurrent callers that hit the same expired session wait for the
//! single re-authentication and reuse its result.
//!
//! ```rust,no_run
//! use enovia_models::{DocumentId, FileId};
//! use enovia_sdk::{ClientOptions, EnoviaClient, ServiceCredential};
//!
//! # async fn run() -> Result<(), enovia_sdk::EnoviaError> {
//! let credential = ServiceCredential::from_env()?;
//! let client = EnoviaClient::connect(credential, ClientOptions::from_env()).await?;
//!
//! let document = DocumentId::new("6A1F0C2D00004E20")?;
//! let file = FileId::new("6A1F0C2D00004E31")?;
//! client.download_document_file(&document, &file, "part.CATPart").await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use enovia_models::{DocumentId, FileId, SecurityContext};
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::ClientOptions;
use crate::credentials::ServiceCredential;
use crate::download::{DownloadReport, DownloadRequest, SecureDownloadClient};
use crate::error::EnoviaError;
use crate::exchange::authenticate_with;
use crate::session::SessionContext;

/// Authenticated entry point to a 3DEXPERIENCE platform.
#[derive(Debug)]
pub struct EnoviaClient {
    credential: ServiceCredential,
    options: ClientOptions,
    session: RwLock<Arc<SessionContext>>,
    reauth: Mutex<()>,
}

impl EnoviaClient {
    /// Authenticate and build the client.
    pub async fn connect(
        credential: ServiceCredential,
        options: ClientOptions,
    ) -> Result<Self, EnoviaError> {
        let session = authenticate_with(&credential, &options).await?;
        Ok(Self {
            credential,
            options,
            session: RwLock::new(Arc::new(session)),
            reauth: Mutex::new(()),
        })
    }

    /// The current session.
    pub async fn session(&self) -> Arc<SessionContext> {
        Arc::clone(&*self.session.read().await)
    }

    /// Security context of the current session.
    pub async fn security_context(&self) -> SecurityContext {
        self.session().await.security_context().clone()
    }

    /// Options the client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Download `file` of `document` to `destination`.
    pub async fn download_document_file(
        &self,
        document: &DocumentId,
        file: &FileId,
        destination: impl AsRef<Path>,
    ) -> Result<DownloadReport, EnoviaError> {
        let destination = destination.as_ref();
        let session = self.session().await;
        let result = SecureDownloadClient::new(Arc::clone(&session))
            .download(document, file, destination)
            .await;

        match result {
            Err(err) if err.is_session_expired() && self.options.reauthenticate_on_expiry => {
                warn!(
                    document = %document,
                    file = %file,
                    error = %err,
                    "session rejected, re-authenticating"
                );
                let fresh = self.reauthenticate(&session).await?;
                SecureDownloadClient::new(fresh)
                    .download(document, file, destination)
                    .await
            }
            other => other,
        }
    }

    /// Run several downloads concurrently on the shared session.
    ///
    /// At most [`ClientOptions::max_concurrent_downloads`] are in flight.
    /// Results come back in request order; one failure does not cancel the
    /// others.
    pub async fn download_many(
        &self,
        requests: &[DownloadRequest],
    ) -> Vec<Result<DownloadReport, EnoviaError>> {
        stream::iter(requests)
            .map(|req| self.download_document_file(&req.document, &req.file, &req.destination))
            .buffered(self.options.max_concurrent_downloads.max(1))
            .collect()
            .await
    }

    /// Replace `stale` with a freshly authenticated session.
    ///
    /// If another caller already replaced it, that session is returned
    /// without a new exchange.
    async fn reauthenticate(
        &self,
        stale: &Arc<SessionContext>,
    ) -> Result<Arc<SessionContext>, EnoviaError> {
        let _guard = self.reauth.lock().await;

        let current = self.session().await;
        if !Arc::ptr_eq(&current, stale) {
            return Ok(current);
        }

        let fresh = Arc::new(authenticate_with(&self.credential, &self.options).await?);
        *self.session.write().await = Arc::clone(&fresh);
        info!(security_context = %fresh.security_context(), "session renewed");
        Ok(fresh)
    }
}
