//! Security context of an authenticated 3DSpace session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A `{"name": ...}` reference as returned inside `preferredcredentials`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    /// Display name of the referenced object.
    #[serde(default)]
    pub name: String,
}

impl NamedRef {
    /// Convenience constructor.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// The current person's preferred role, organization and collaborative space.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PreferredCredentials {
    /// Preferred role (e.g. `VPLMProjectLeader`).
    pub role: NamedRef,
    /// Preferred organization.
    pub organization: NamedRef,
    /// Preferred collaborative space.
    pub collabspace: NamedRef,
}

/// Body of `GET /resources/modeler/pno/person?current=true&select=preferredcredentials`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonResponse {
    /// Preferred credentials of the authenticated identity.
    pub preferredcredentials: PreferredCredentials,
}

/// `{role}.{organization}.{collabspace}` value sent as the `SecurityContext`
/// header on every protected call.
///
/// # Examples
///
/// ```
/// use enovia_models::{NamedRef, PreferredCredentials, SecurityContext};
///
/// let creds = PreferredCredentials {
///     role: NamedRef::new("Eng"),
///     organization: NamedRef::new("ACME"),
///     collabspace: NamedRef::new("Space1"),
/// };
/// let ctx = SecurityContext::from_preferred(&creds).unwrap();
/// assert_eq!(ctx.as_str(), "Eng.ACME.Space1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityContext(String);

impl SecurityContext {
    /// Derive the context from the preferred credentials.
    ///
    /// Every component must be non-empty.
    pub fn from_preferred(creds: &PreferredCredentials) -> Result<Self, ModelError> {
        let parts = [
            ("preferredcredentials.role.name", &creds.role.name),
            ("preferredcredentials.organization.name", &creds.organization.name),
            ("preferredcredentials.collabspace.name", &creds.collabspace.name),
        ];
        for (field, value) in parts {
            if value.trim().is_empty() {
                return Err(ModelError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        Ok(Self(format!(
            "{}.{}.{}",
            creds.role.name, creds.organization.name, creds.collabspace.name
        )))
    }

    /// Return the header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(role: &str, org: &str, space: &str) -> PreferredCredentials {
        PreferredCredentials {
            role: NamedRef::new(role),
            organization: NamedRef::new(org),
            collabspace: NamedRef::new(space),
        }
    }

    #[test]
    fn joins_with_dots() {
        let ctx = SecurityContext::from_preferred(&creds("Eng", "ACME", "Space1")).unwrap();
        assert_eq!(ctx.to_string(), "Eng.ACME.Space1");
    }

    #[test]
    fn keeps_spaces_inside_names() {
        let creds = creds("VPLMProjectLeader", "Company Name", "Common Space");
        let ctx = SecurityContext::from_preferred(&creds).unwrap();
        assert_eq!(ctx.as_str(), "VPLMProjectLeader.Company Name.Common Space");
    }

    #[test]
    fn empty_component_is_rejected() {
        let err = SecurityContext::from_preferred(&creds("Eng", "", "Space1")).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingField {
                field: "preferredcredentials.organization.name".into()
            }
        );
    }

    #[test]
    fn person_response_parses_server_payload() {
        let body = serde_json::json!({
            "name": "alice",
            "preferredcredentials": {
                "role": {"name": "Eng", "pid": "x"},
                "organization": {"name": "ACME"},
                "collabspace": {"name": "Space1", "title": "Space 1"}
            }
        });
        let person: PersonResponse = serde_json::from_value(body).unwrap();
        assert_eq!(person.preferredcredentials.collabspace.name, "Space1");
    }
}
