//! Authenticated 3DSpace session.
//!
//! A [`SessionContext`] is only produced by a completed ticket exchange
//! ([`crate::exchange`]), so holding one proves the bootstrap ran to the end.
//! It is read-only afterwards and can be shared between concurrent downloads
//! behind an `Arc`.

use enovia_models::SecurityContext;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{IntoUrl, RequestBuilder};

use crate::endpoints::Endpoints;

/// Header carrying the `{role}.{organization}.{collabspace}` value.
pub const SECURITY_CONTEXT_HEADER: &str = "SecurityContext";

/// Cookie-bearing HTTP client plus the security context derived for it.
#[derive(Debug)]
pub struct SessionContext {
    http: reqwest::Client,
    endpoints: Endpoints,
    security_context: SecurityContext,
    protected_headers: HeaderMap,
}

impl SessionContext {
    /// Seal a session. Fails when the context cannot be sent as a header.
    pub(crate) fn new(
        http: reqwest::Client,
        endpoints: Endpoints,
        security_context: SecurityContext,
    ) -> Result<Self, reqwest::header::InvalidHeaderValue> {
        let mut protected_headers = HeaderMap::new();
        protected_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        protected_headers.insert(
            HeaderName::from_static("securitycontext"),
            HeaderValue::from_bytes(security_context.as_str().as_bytes())?,
        );

        Ok(Self {
            http,
            endpoints,
            security_context,
            protected_headers,
        })
    }

    /// The security context derived at bootstrap.
    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }

    /// URL layout of the platform this session belongs to.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `Accept: application/json` and `SecurityContext: <value>`.
    pub fn headers_for_protected_call(&self) -> HeaderMap {
        self.protected_headers.clone()
    }

    /// `GET` carrying the session cookies and protected-call headers.
    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.http.get(url).headers(self.headers_for_protected_call())
    }

    /// `PUT` carrying the session cookies and protected-call headers.
    pub fn put(&self, url: impl IntoUrl) -> RequestBuilder {
        self.http.put(url).headers(self.headers_for_protected_call())
    }
}

#[cfg(test)]
mod tests {
    use enovia_models::{NamedRef, PreferredCredentials};

    use super::*;

    fn context(role: &str, org: &str, space: &str) -> SecurityContext {
        SecurityContext::from_preferred(&PreferredCredentials {
            role: NamedRef::new(role),
            organization: NamedRef::new(org),
            collabspace: NamedRef::new(space),
        })
        .unwrap()
    }

    fn session(ctx: SecurityContext) -> SessionContext {
        SessionContext::new(
            reqwest::Client::new(),
            Endpoints::new("https://example.test"),
            ctx,
        )
        .unwrap()
    }

    #[test]
    fn protected_headers() {
        let session = session(context("Eng", "ACME", "Space1"));
        let headers = session.headers_for_protected_call();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[SECURITY_CONTEXT_HEADER], "Eng.ACME.Space1");
    }

    #[test]
    fn non_ascii_context_is_sent_as_bytes() {
        let session = session(context("Ingénieur", "Société", "Espace 1"));
        let headers = session.headers_for_protected_call();
        assert_eq!(
            headers[SECURITY_CONTEXT_HEADER].as_bytes(),
            "Ingénieur.Société.Espace 1".as_bytes()
        );
    }

    #[test]
    fn control_characters_are_rejected() {
        let result = SessionContext::new(
            reqwest::Client::new(),
            Endpoints::new("https://example.test"),
            context("Eng\n", "ACME", "Space1"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn request_builders_carry_headers() {
        let session = session(context("Eng", "ACME", "Space1"));
        let request = session
            .put(session.endpoints().documents())
            .build()
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(request.headers()[SECURITY_CONTEXT_HEADER], "Eng.ACME.Space1");
    }
}
