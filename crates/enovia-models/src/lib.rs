#![deny(missing_docs)]

//! # Enovia Models
//!
//! Value types shared by the 3DEXPERIENCE session client, the CLI and the
//! `mock-3dx` test server.
//!
//! ## Lifecycle of the protocol values
//!
//! ```text
//! ServiceCredential (enovia-sdk)
//! └── TicketGrantingTicket      3DPassport batch ticket
//!     └── ServiceTicket         3DPassport CAS transient login
//!         └── session cookies   3DSpace `?ticket=`
//!             └── SecurityContext   "{role}.{organization}.{collabspace}"
//!                 └── per download: CsrfToken → DownloadTicket → bytes
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ids`] | `DocumentId`, `FileId` path-segment identifiers |
//! | [`tickets`] | Single-use bearer values (TGT, ST, CSRF token, download ticket) |
//! | [`identity`] | `SecurityContext` and the preferred-credentials payload |
//! | [`wire`] | JSON response bodies of the passport and document endpoints |
//! | [`step`] | Named protocol steps used in errors and logs |

pub mod error;
pub mod identity;
pub mod ids;
pub mod step;
pub mod tickets;
pub mod wire;

pub use error::*;
pub use identity::*;
pub use ids::*;
pub use step::*;
pub use tickets::*;
pub use wire::*;
