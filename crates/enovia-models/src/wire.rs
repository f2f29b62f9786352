//! JSON bodies exchanged with 3DPassport and the 3DSpace document modeler.
//!
//! Fields the protocol can live without are `Option`s so that a sparse
//! payload deserializes and the caller decides whether absence is fatal.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 3DPassport
// ---------------------------------------------------------------------------

/// Body returned by both the batch ticket and the CAS transient endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokenResponse {
    /// The issued ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl AccessTokenResponse {
    /// Convenience constructor used by servers.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    /// The token, if present and non-empty.
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// `csrf` object embedded in document payloads.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfField {
    /// Header name the server expects, usually `ENO_CSRF_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Token value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Body of `GET documents/{id}`. Only the CSRF token is modeled; the
/// document data itself is passed through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentResponse {
    /// Anti-forgery token for state-changing calls on this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf: Option<CsrfField>,
    /// Document data, opaque to this crate.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl DocumentResponse {
    /// The CSRF token value, or `""` when the payload carries none.
    pub fn csrf_value(&self) -> &str {
        self.csrf
            .as_ref()
            .and_then(|c| c.value.as_deref())
            .unwrap_or("")
    }
}

/// `dataelements` of a download ticket entry.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDataElements {
    /// URL that resolves to the file bytes.
    #[serde(rename = "ticketURL", default, skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
}

/// One entry of the `data` array returned by `PUT .../DownloadTicket`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketEntry {
    /// Ticket attributes.
    #[serde(default)]
    pub dataelements: TicketDataElements,
}

/// Body of `PUT documents/{doc}/files/{file}/DownloadTicket`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketResponse {
    /// Issued tickets; the first entry is the one to redeem.
    #[serde(default)]
    pub data: Vec<TicketEntry>,
}

impl TicketResponse {
    /// Build a single-entry response.
    pub fn single(ticket_url: impl Into<String>) -> Self {
        Self {
            data: vec![TicketEntry {
                dataelements: TicketDataElements {
                    ticket_url: Some(ticket_url.into()),
                },
            }],
        }
    }

    /// Ticket URL of the first entry, if any.
    pub fn into_first_url(self) -> Option<String> {
        self.data
            .into_iter()
            .next()
            .and_then(|e| e.dataelements.ticket_url)
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_missing_or_empty() {
        let missing: AccessTokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.into_token(), None);
        let empty: AccessTokenResponse =
            serde_json::from_str(r#"{"access_token": ""}"#).unwrap();
        assert_eq!(empty.into_token(), None);
        let ok: AccessTokenResponse =
            serde_json::from_str(r#"{"access_token": "T1", "x": 1}"#).unwrap();
        assert_eq!(ok.into_token().as_deref(), Some("T1"));
    }

    #[test]
    fn csrf_value_tolerates_absence() {
        let doc: DocumentResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(doc.csrf_value(), "");
        let doc: DocumentResponse = serde_json::from_str(r#"{"csrf": {}}"#).unwrap();
        assert_eq!(doc.csrf_value(), "");
        let doc: DocumentResponse = serde_json::from_str(
            r#"{"csrf": {"name": "ENO_CSRF_TOKEN", "value": "abc"}, "success": true}"#,
        )
        .unwrap();
        assert_eq!(doc.csrf_value(), "abc");
    }

    #[test]
    fn ticket_url_from_first_entry() {
        let body = r#"{"data": [
            {"dataelements": {"ticketURL": "https://cdn/obj", "fileName": "a.bin"}},
            {"dataelements": {"ticketURL": "https://cdn/other"}}
        ]}"#;
        let resp: TicketResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.into_first_url().as_deref(), Some("https://cdn/obj"));
    }

    #[test]
    fn ticket_url_absent() {
        let resp: TicketResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(resp.into_first_url(), None);
        let resp: TicketResponse =
            serde_json::from_str(r#"{"data": [{"dataelements": {}}]}"#).unwrap();
        assert_eq!(resp.into_first_url(), None);
    }

    #[test]
    fn ticket_response_serializes_ticket_url_key() {
        let json = serde_json::to_value(TicketResponse::single("u")).unwrap();
        assert_eq!(json["data"][0]["dataelements"]["ticketURL"], "u");
    }
}
