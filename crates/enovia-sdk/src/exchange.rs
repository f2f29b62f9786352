//! 3DPassport ticket exchange.
//!
//! Turns batch-service credentials into an authenticated 3DSpace session in
//! four strictly sequential steps:
//!
//! 1. `GET 3dpassport/api/v2/batch/ticket` signed with the service name and
//!    secret → ticket-granting ticket.
//! 2. `GET 3dpassport/api/login/cas/transient?tgt=` → service ticket.
//! 3. `GET 3dspace/?ticket=` on a cookie-bearing client → session cookies.
//! 4. `GET 3dspace/resources/modeler/pno/person` → security context.
//!
//! The exchange is a typestate machine: each step consumes the previous
//! state, so steps cannot be skipped or replayed, and a ticket is moved into
//! the request that redeems it. Any failure ends the exchange with a single
//! [`EnoviaError::Auth`]; nothing is retried.

use std::time::Duration;

use enovia_models::{
    AccessTokenResponse, AuthStep, PersonResponse, SecurityContext, ServiceTicket,
    TicketGrantingTicket,
};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use tracing::{debug, info};

use crate::config::ClientOptions;
use crate::credentials::ServiceCredential;
use crate::endpoints::Endpoints;
use crate::error::{rejection, EnoviaError};
use crate::session::SessionContext;

/// Redirects followed on a single request (ticket URLs bounce through the
/// file collaboration server).
const MAX_REDIRECTS: usize = 10;

/// Build the HTTP client shared by the exchange and the resulting session.
///
/// The cookie store holds the session, and the TLS policy of the credential
/// applies to every request made through the client.
pub(crate) fn build_http_client(
    credential: &ServiceCredential,
    request_timeout: Option<Duration>,
) -> Result<reqwest::Client, EnoviaError> {
    let mut builder = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(!credential.tls_verify());
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| EnoviaError::Config(format!("failed to build HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Nothing obtained yet.
#[derive(Debug)]
pub struct Unauthenticated {
    credential: ServiceCredential,
}

/// Ticket-granting ticket obtained.
#[derive(Debug)]
pub struct HasTgt {
    tgt: TicketGrantingTicket,
}

/// Service ticket obtained.
#[derive(Debug)]
pub struct HasSt {
    st: ServiceTicket,
}

/// An in-progress ticket exchange in state `S`.
#[derive(Debug)]
pub struct TicketExchange<S> {
    http: reqwest::Client,
    endpoints: Endpoints,
    state: S,
}

impl<S> TicketExchange<S> {
    fn advance<T>(self, state: T) -> TicketExchange<T> {
        TicketExchange {
            http: self.http,
            endpoints: self.endpoints,
            state,
        }
    }
}

/// Read the `access_token` of a passport response.
async fn access_token(step: AuthStep, response: reqwest::Response) -> Result<String, EnoviaError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EnoviaError::auth(step, Some(status), rejection(status, &body)));
    }

    let body: AccessTokenResponse = response
        .json()
        .await
        .map_err(|e| EnoviaError::auth(step, Some(status), format!("unreadable response: {e}")))?;
    body.into_token()
        .ok_or_else(|| EnoviaError::auth(step, Some(status), "missing `access_token` in response"))
}

impl TicketExchange<Unauthenticated> {
    /// Start an exchange with default [`ClientOptions`].
    pub fn new(credential: &ServiceCredential) -> Result<Self, EnoviaError> {
        Self::with_options(credential, &ClientOptions::default())
    }

    /// Start an exchange; `options.request_timeout` applies to every request
    /// of the exchange and of the session it produces.
    pub fn with_options(
        credential: &ServiceCredential,
        options: &ClientOptions,
    ) -> Result<Self, EnoviaError> {
        Ok(Self {
            http: build_http_client(credential, options.request_timeout)?,
            endpoints: Endpoints::new(credential.base_url()),
            state: Unauthenticated {
                credential: credential.clone(),
            },
        })
    }

    /// Step 1: exchange the service credentials for a ticket-granting ticket.
    pub async fn request_tgt(self) -> Result<TicketExchange<HasTgt>, EnoviaError> {
        let step = AuthStep::TicketGrantingTicket;
        let credential = &self.state.credential;
        let service = self.endpoints.service_callback();

        debug!(
            service_name = credential.service_name(),
            user = credential.user_identifier(),
            "requesting ticket-granting ticket"
        );
        let response = self
            .http
            .get(self.endpoints.batch_ticket())
            .header("DS-SERVICE-NAME", credential.service_name())
            .header("DS-SERVICE-SECRET", credential.service_secret())
            .header(ACCEPT, "application/json")
            .query(&[
                ("identifier", credential.user_identifier()),
                ("service", service.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EnoviaError::auth(step, e.status(), e.to_string()))?;

        let tgt = TicketGrantingTicket::new(access_token(step, response).await?);
        debug!("ticket-granting ticket obtained");
        Ok(self.advance(HasTgt { tgt }))
    }
}

impl TicketExchange<HasTgt> {
    /// Step 2: trade the TGT for a service ticket. The TGT is dropped.
    pub async fn request_service_ticket(self) -> Result<TicketExchange<HasSt>, EnoviaError> {
        let step = AuthStep::ServiceTicket;
        let service = self.endpoints.service_callback();

        let response = self
            .http
            .get(self.endpoints.cas_transient())
            .header(ACCEPT, "application/json")
            .query(&[
                ("tgt", self.state.tgt.expose()),
                ("service", service.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EnoviaError::auth(step, e.status(), e.to_string()))?;

        let st = ServiceTicket::new(access_token(step, response).await?);
        debug!("service ticket obtained");
        Ok(self.advance(HasSt { st }))
    }
}

impl TicketExchange<HasSt> {
    /// Steps 3 and 4: redeem the service ticket for session cookies, then
    /// derive the security context of the authenticated identity.
    pub async fn establish_session(self) -> Result<SessionContext, EnoviaError> {
        let TicketExchange {
            http,
            endpoints,
            state: HasSt { st },
        } = self;

        let step = AuthStep::Session;
        let response = http
            .get(endpoints.session_bootstrap())
            .query(&[("ticket", st.expose())])
            .send()
            .await
            .map_err(|e| EnoviaError::auth(step, e.status(), e.to_string()))?;
        drop(st);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnoviaError::auth(step, Some(status), rejection(status, &body)));
        }
        debug!("session cookies established");

        let security_context = derive_security_context(&http, &endpoints).await?;
        info!(
            security_context = %security_context,
            "3DSpace session authenticated"
        );

        SessionContext::new(http, endpoints, security_context).map_err(|e| {
            EnoviaError::auth(
                AuthStep::SecurityContext,
                None,
                format!("security context is not a valid header value: {e}"),
            )
        })
    }
}

async fn derive_security_context(
    http: &reqwest::Client,
    endpoints: &Endpoints,
) -> Result<SecurityContext, EnoviaError> {
    let step = AuthStep::SecurityContext;
    let response = http
        .get(endpoints.person())
        .header(ACCEPT, "application/json")
        .query(&[("current", "true"), ("select", "preferredcredentials")])
        .send()
        .await
        .map_err(|e| EnoviaError::auth(step, e.status(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EnoviaError::auth(step, Some(status), rejection(status, &body)));
    }

    let person: PersonResponse = response.json().await.map_err(|e| {
        EnoviaError::auth(
            step,
            Some(status),
            format!("unreadable preferred credentials: {e}"),
        )
    })?;
    SecurityContext::from_preferred(&person.preferredcredentials)
        .map_err(|e| EnoviaError::auth(step, Some(status), e.to_string()))
}

/// Run the whole exchange with default options.
pub async fn authenticate(credential: &ServiceCredential) -> Result<SessionContext, EnoviaError> {
    authenticate_with(credential, &ClientOptions::default()).await
}

/// Run the whole exchange.
pub async fn authenticate_with(
    credential: &ServiceCredential,
    options: &ClientOptions,
) -> Result<SessionContext, EnoviaError> {
    info!(
        base_url = credential.base_url(),
        tls_verify = credential.tls_verify(),
        "authenticating batch service"
    );
    TicketExchange::with_options(credential, options)?
        .request_tgt()
        .await?
        .request_service_ticket()
        .await?
        .establish_session()
        .await
}
