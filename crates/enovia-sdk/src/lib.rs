//! # Enovia SDK
//!
//! Client for the 3DEXPERIENCE platform's batch-service login and secure
//! document file download.
//!
//! The SDK provides:
//!
//! * [`ServiceCredential`] — batch-service credentials loaded once from the
//!   environment.
//! * [`TicketExchange`] — the 3DPassport TGT → ST → session → security
//!   context bootstrap, as a typestate machine.
//! * [`SessionContext`] — cookie-bearing session plus the
//!   `SecurityContext` header every protected call needs.
//! * [`SecureDownloadClient`] — CSRF token → download ticket → bytes on disk.
//! * [`EnoviaClient`] — owns the session for the process lifetime and renews
//!   it after expiry.
//! * [`EnoviaError`] — unified error type for all SDK operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use enovia_models::{DocumentId, FileId};
//! use enovia_sdk::{authenticate, SecureDownloadClient, ServiceCredential};
//!
//! # async fn run() -> Result<(), enovia_sdk::EnoviaError> {
//! let credential = ServiceCredential::from_env()?;
//! let session = Arc::new(authenticate(&credential).await?);
//! println!("SecurityContext: {}", session.security_context());
//!
//! let downloads = SecureDownloadClient::new(session);
//! downloads
//!     .download(&DocumentId::new("doc1")?, &FileId::new("file1")?, "/tmp/out.bin")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod download;
pub mod endpoints;
pub mod error;
pub mod exchange;
pub mod session;

pub use client::EnoviaClient;
pub use config::ClientOptions;
pub use credentials::ServiceCredential;
pub use download::{DownloadReport, DownloadRequest, SecureDownloadClient};
pub use endpoints::Endpoints;
pub use error::EnoviaError;
pub use exchange::{authenticate, authenticate_with, TicketExchange};
pub use session::SessionContext;
