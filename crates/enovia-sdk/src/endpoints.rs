//! URL layout of a 3DEXPERIENCE platform.
//!
//! Every URL the client calls is built through [`Endpoints`], so the layout
//! is defined in exactly one place.
//!
//! ```text
//! {base}/3dpassport/api/v2/batch/ticket              ← TGT
//! {base}/3dpassport/api/login/cas/transient          ← ST
//! {base}/3dspace/                                    ← ?ticket=ST, session cookies
//! {base}/3dspace/resources/modeler/pno/person        ← preferred credentials
//! {base}/3dspace/resources/v1/modeler/documents/{doc}
//! {base}/3dspace/resources/v1/modeler/documents/{doc}/files/{file}/DownloadTicket
//! ```

use enovia_models::{DocumentId, FileId};

/// URL builder rooted at the platform base URL.
///
/// # Examples
///
/// ```
/// use enovia_sdk::Endpoints;
///
/// let endpoints = Endpoints::new("https://3dx.example.com/");
/// assert_eq!(endpoints.service_callback(), "https://3dx.example.com/3dspace/");
/// assert_eq!(
///     endpoints.batch_ticket(),
///     "https://3dx.example.com/3dpassport/api/v2/batch/ticket",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Root the layout at `base_url`; a trailing `/` is ignored.
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 3DPassport root.
    pub fn passport(&self) -> String {
        format!("{}/3dpassport", self.base)
    }

    /// 3DSpace root.
    pub fn space(&self) -> String {
        format!("{}/3dspace", self.base)
    }

    /// Service URL the passport tickets are issued for.
    pub fn service_callback(&self) -> String {
        format!("{}/", self.space())
    }

    /// Batch service ticket endpoint (TGT).
    pub fn batch_ticket(&self) -> String {
        format!("{}/api/v2/batch/ticket", self.passport())
    }

    /// CAS transient login endpoint (ST).
    pub fn cas_transient(&self) -> String {
        format!("{}/api/login/cas/transient", self.passport())
    }

    /// URL that redeems a service ticket into session cookies.
    pub fn session_bootstrap(&self) -> String {
        self.service_callback()
    }

    /// Current person resource.
    pub fn person(&self) -> String {
        format!("{}/resources/modeler/pno/person", self.space())
    }

    /// Document modeler collection.
    pub fn documents(&self) -> String {
        format!("{}/resources/v1/modeler/documents", self.space())
    }

    /// A single document.
    pub fn document(&self, document: &DocumentId) -> String {
        format!("{}/{document}", self.documents())
    }

    /// Download ticket sub-resource of a document file.
    pub fn download_ticket(&self, document: &DocumentId, file: &FileId) -> String {
        format!("{}/files/{file}/DownloadTicket", self.document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://example.test")
    }

    #[test]
    fn passport_urls() {
        let e = endpoints();
        assert_eq!(e.batch_ticket(), "https://example.test/3dpassport/api/v2/batch/ticket");
        assert_eq!(
            e.cas_transient(),
            "https://example.test/3dpassport/api/login/cas/transient"
        );
    }

    #[test]
    fn space_urls() {
        let e = endpoints();
        assert_eq!(e.session_bootstrap(), "https://example.test/3dspace/");
        assert_eq!(
            e.person(),
            "https://example.test/3dspace/resources/modeler/pno/person"
        );
    }

    #[test]
    fn document_urls() {
        let e = endpoints();
        let doc = DocumentId::new("doc1").unwrap();
        let file = FileId::new("file1").unwrap();
        assert_eq!(
            e.document(&doc),
            "https://example.test/3dspace/resources/v1/modeler/documents/doc1"
        );
        assert_eq!(
            e.download_ticket(&doc, &file),
            "https://example.test/3dspace/resources/v1/modeler/documents/doc1/files/file1/DownloadTicket"
        );
    }

    #[test]
    fn trailing_slash_ignored() {
        assert_eq!(Endpoints::new("https://example.test///"), endpoints());
    }
}
