//! Named steps of the authentication and download sequences.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Steps of the session bootstrap, in the order they must run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AuthStep {
    /// Service credentials → ticket-granting ticket.
    #[strum(serialize = "ticket-granting ticket")]
    TicketGrantingTicket,
    /// TGT → service ticket.
    #[strum(serialize = "service ticket")]
    ServiceTicket,
    /// Service ticket → session cookies.
    #[strum(serialize = "session establishment")]
    Session,
    /// Session → `SecurityContext`.
    #[strum(serialize = "security context")]
    SecurityContext,
}

/// Steps of a single file download, in the order they must run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DownloadStep {
    /// Fetch the document and read its CSRF token.
    #[strum(serialize = "document fetch")]
    Document,
    /// Request a download ticket for the file.
    #[strum(serialize = "ticket issuance")]
    TicketIssuance,
    /// Follow the ticket URL to the file bytes.
    #[strum(serialize = "ticket redemption")]
    TicketRedemption,
}
