//! Document and file identifiers.
//!
//! Both identifiers are interpolated into 3DSpace resource paths
//! (`documents/{doc}/files/{file}/DownloadTicket`), so construction rejects
//! anything that would change the shape of the URL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

fn validate_segment(kind: &'static str, value: &str) -> Result<(), ModelError> {
    let reject = |reason: &str| ModelError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(reject("must not be empty"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
    {
        return Err(reject(&format!("must not contain {c:?}")));
    }
    if value == "." || value == ".." {
        return Err(reject("must not be a relative path segment"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// Physical ID of a 3DSpace document.
///
/// # Examples
///
/// ```
/// use enovia_models::DocumentId;
///
/// let id = DocumentId::new("6A1F0C2D00004E20").unwrap();
/// assert_eq!(id.to_string(), "6A1F0C2D00004E20");
/// assert!(DocumentId::new("../admin").is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap a document identifier.
    pub fn new(id: &str) -> Result<Self, ModelError> {
        validate_segment("document id", id)?;
        Ok(Self(id.to_string()))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_segment("document id", &s)?;
        Ok(Self(s))
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// FileId
// ---------------------------------------------------------------------------

/// ID of a file attached to a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Validate and wrap a file identifier.
    pub fn new(id: &str) -> Result<Self, ModelError> {
        validate_segment("file id", id)?;
        Ok(Self(id.to_string()))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FileId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FileId {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_segment("file id", &s)?;
        Ok(Self(s))
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hex_physical_id() {
        let id = DocumentId::new("AB12CD34EF").unwrap();
        assert_eq!(id.as_str(), "AB12CD34EF");
    }

    #[test]
    fn rejects_empty() {
        let err = FileId::new("").unwrap_err();
        assert!(matches!(err, ModelError::InvalidIdentifier { kind: "file id", .. }));
    }

    #[test]
    fn rejects_path_and_query_characters() {
        for bad in ["a/b", "a?b", "a#b", "a b", "a%2Fb", "..", "."] {
            assert!(DocumentId::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn parses_from_str() {
        let id: FileId = "file1".parse().unwrap();
        assert_eq!(id.to_string(), "file1");
    }

    #[test]
    fn deserialize_validates() {
        let ok: DocumentId = serde_json::from_str("\"doc1\"").unwrap();
        assert_eq!(ok.as_str(), "doc1");
        assert!(serde_json::from_str::<DocumentId>("\"doc/1\"").is_err());
    }
}
