//! Single-use bearer values of the ticket exchange and download flow.
//!
//! None of these types implement `Clone`: each one is moved into the request
//! that consumes it, so a ticket cannot be presented twice by the same code
//! path. `Debug` output never contains the bearer value.

use std::fmt;

use crate::ids::{DocumentId, FileId};

fn redacted(f: &mut fmt::Formatter<'_>, name: &str, len: usize) -> fmt::Result {
    write!(f, "{name}(<{len} bytes redacted>)")
}

// ---------------------------------------------------------------------------
// Passport tickets
// ---------------------------------------------------------------------------

/// Ticket-granting ticket issued by 3DPassport for a batch service.
pub struct TicketGrantingTicket(String);

impl TicketGrantingTicket {
    /// Wrap the `access_token` returned by the batch ticket endpoint.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Bearer value, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TicketGrantingTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        redacted(f, "TicketGrantingTicket", self.0.len())
    }
}

/// Service ticket derived from a TGT; redeemed once against 3DSpace.
pub struct ServiceTicket(String);

impl ServiceTicket {
    /// Wrap the `access_token` returned by the CAS transient endpoint.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Bearer value, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        redacted(f, "ServiceTicket", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Download tokens
// ---------------------------------------------------------------------------

/// Anti-forgery token read from a document payload.
///
/// The token remembers the document it came from. Ticket issuance takes the
/// document from the token, so a token fetched for one document can never be
/// sent for another.
pub struct CsrfToken {
    document: DocumentId,
    value: String,
}

impl CsrfToken {
    /// Bind a token value to the document it was read from.
    ///
    /// An absent token is represented by an empty value.
    pub fn new(document: DocumentId, value: impl Into<String>) -> Self {
        Self {
            document,
            value: value.into(),
        }
    }

    /// The document this token authorizes.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// Header value for `ENO_CSRF_TOKEN`.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// `true` when the document payload carried no token.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfToken")
            .field("document", &self.document)
            .field("value", &format_args!("<{} bytes redacted>", self.value.len()))
            .finish()
    }
}

/// Short-lived URL that resolves to the bytes of exactly one file.
pub struct DownloadTicket {
    document: DocumentId,
    file: FileId,
    ticket_url: String,
}

impl DownloadTicket {
    /// Create a ticket scoped to one `(document, file)` pair.
    pub fn new(document: DocumentId, file: FileId, ticket_url: impl Into<String>) -> Self {
        Self {
            document,
            file,
            ticket_url: ticket_url.into(),
        }
    }

    /// Document the ticket was issued for.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// File the ticket was issued for.
    pub fn file(&self) -> &FileId {
        &self.file
    }

    /// Consume the ticket, yielding the URL to redeem.
    pub fn redeem(self) -> String {
        self.ticket_url
    }
}

impl fmt::Debug for DownloadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTicket")
            .field("document", &self.document)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tgt_debug_is_redacted() {
        let tgt = TicketGrantingTicket::new("TGT-secret-value");
        let dbg = format!("{tgt:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("16 bytes"));
        assert_eq!(tgt.expose(), "TGT-secret-value");
    }

    #[test]
    fn csrf_token_is_bound_to_document() {
        let doc = DocumentId::new("doc1").unwrap();
        let token = CsrfToken::new(doc.clone(), "abc");
        assert_eq!(token.document(), &doc);
        assert_eq!(token.expose(), "abc");
        assert!(!format!("{token:?}").contains("abc"));
    }

    #[test]
    fn empty_csrf_token() {
        let token = CsrfToken::new(DocumentId::new("doc1").unwrap(), "");
        assert!(token.is_empty());
    }

    #[test]
    fn download_ticket_redeems_url() {
        let ticket = DownloadTicket::new(
            DocumentId::new("doc1").unwrap(),
            FileId::new("file1").unwrap(),
            "https://cdn/obj",
        );
        assert_eq!(ticket.file().as_str(), "file1");
        assert!(!format!("{ticket:?}").contains("cdn"));
        assert_eq!(ticket.redeem(), "https://cdn/obj");
    }
}
