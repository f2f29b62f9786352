//! Shared state of the mock: configuration, live tickets and the request
//! journal.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Endpoint families served by the mock, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `GET /3dpassport/api/v2/batch/ticket`
    Tgt,
    /// `GET /3dpassport/api/login/cas/transient`
    ServiceTicket,
    /// `GET /3dspace/?ticket=`
    Session,
    /// `GET /3dspace/resources/modeler/pno/person`
    Person,
    /// `GET /3dspace/resources/v1/modeler/documents/{doc}`
    Document,
    /// `PUT /3dspace/resources/v1/modeler/documents/{doc}/files/{file}/DownloadTicket`
    TicketIssuance,
    /// `GET /fcs/{ticket}`, answered with a redirect.
    Redemption,
    /// `GET /fcs/objects/{ticket}`, the redirect target serving the bytes.
    Object,
}

/// One request as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Endpoint family.
    pub route: Route,
    /// Request path.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// `SecurityContext` header, if sent.
    pub security_context: Option<String>,
    /// `ENO_CSRF_TOKEN` header, if sent.
    pub csrf: Option<String>,
}

/// Static behaviour of the mock.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Accepted `DS-SERVICE-NAME`.
    pub service_name: String,
    /// Accepted `DS-SERVICE-SECRET`.
    pub service_secret: String,
    /// Accepted `identifier` on the batch ticket call.
    pub user: String,
    /// Preferred role name.
    pub role: String,
    /// Preferred organization name.
    pub organization: String,
    /// Preferred collaborative space name.
    pub collabspace: String,
    /// Fixed TGT value; random when `None`.
    pub tgt: Option<String>,
    /// Fixed ST value; random when `None`.
    pub service_ticket: Option<String>,
    /// Fixed CSRF value; random per document fetch when `None`.
    pub csrf: Option<String>,
    /// Omit the `csrf` object from document payloads.
    pub omit_csrf: bool,
    /// Abort file bodies halfway through, as a dropped connection would.
    pub truncate_objects: bool,
    /// Files served, keyed by `(document, file)`.
    pub files: HashMap<(String, String), Vec<u8>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            service_name: "svc".into(),
            service_secret: "sec".into(),
            user: "alice".into(),
            role: "Eng".into(),
            organization: "ACME".into(),
            collabspace: "Space1".into(),
            tgt: None,
            service_ticket: None,
            csrf: None,
            omit_csrf: false,
            truncate_objects: false,
            files: HashMap::new(),
        }
    }
}

impl MockConfig {
    /// Serve `bytes` for `(document, file)`.
    #[must_use]
    pub fn with_file(mut self, document: &str, file: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert((document.to_string(), file.to_string()), bytes.into());
        self
    }

    pub(crate) fn has_document(&self, document: &str) -> bool {
        self.files.keys().any(|(d, _)| d == document)
    }

    pub(crate) fn security_context(&self) -> String {
        format!("{}.{}.{}", self.role, self.organization, self.collabspace)
    }
}

/// Canned answer replacing the normal handling of a route.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fault {
    pub status: u16,
    /// JSON body; a generic error object when `None`.
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub config: MockConfig,
    pub tgts: HashSet<String>,
    pub service_tickets: HashSet<String>,
    pub sessions: HashSet<String>,
    /// CSRF value → document it was issued for.
    pub csrf_tokens: HashMap<String, String>,
    /// Download ticket → `(document, file)`.
    pub download_tickets: HashMap<String, (String, String)>,
    pub faults: HashMap<Route, Fault>,
    pub journal: Vec<Call>,
    /// Served over TLS; ticket URLs use `https`.
    pub tls: bool,
}

/// Handle to a running (or routable) mock. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Mock3dx {
    inner: Arc<Mutex<Inner>>,
}

impl Mock3dx {
    /// Create a mock with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                config,
                ..Inner::default()
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        // A handler that panicked mid-request leaves plain data behind.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Answer every request on `route` with `status` until cleared.
    pub fn fail(&self, route: Route, status: u16) {
        self.lock().faults.insert(route, Fault { status, body: None });
    }

    /// Answer every request on `route` with `status` and a JSON `body`
    /// until cleared.
    pub fn respond_with(&self, route: Route, status: u16, body: serde_json::Value) {
        self.lock().faults.insert(
            route,
            Fault {
                status,
                body: Some(body),
            },
        );
    }

    /// Remove an injected failure.
    pub fn clear_fault(&self, route: Route) {
        self.lock().faults.remove(&route);
    }

    /// Forget every session cookie, as if the server-side sessions timed out.
    pub fn expire_sessions(&self) {
        self.lock().sessions.clear();
    }

    /// Requests received so far, oldest first.
    pub fn journal(&self) -> Vec<Call> {
        self.lock().journal.clone()
    }

    /// Routes of the requests received so far, oldest first.
    pub fn routes(&self) -> Vec<Route> {
        self.lock().journal.iter().map(|c| c.route).collect()
    }

    /// Number of requests received on `route`.
    pub fn count(&self, route: Route) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.route == route)
            .count()
    }

    /// Number of live (not yet established or expired) sessions.
    pub fn live_sessions(&self) -> usize {
        self.lock().sessions.len()
    }
}
