//! Axum handlers emulating 3DPassport, 3DSpace and the file collaboration
//! server.
//!
//! Every ticket the mock hands out is single-use: the handler that accepts it
//! removes it from the live set.

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use enovia_models::{
    AccessTokenResponse, CsrfField, DocumentResponse, NamedRef, PersonResponse,
    PreferredCredentials, TicketResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::state::{Call, Inner, Mock3dx, Route};

/// Name of the session cookie set by `GET /3dspace/?ticket=`.
pub const SESSION_COOKIE: &str = "JSESSIONID";

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn fresh_token(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Journal the request and apply any injected fault for `route`.
fn begin(inner: &mut Inner, route: Route, uri: &Uri, headers: &HeaderMap) -> Option<Response> {
    debug!(?route, path = uri.path(), "mock request");
    inner.journal.push(Call {
        route,
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        security_context: header_str(headers, "SecurityContext"),
        csrf: header_str(headers, "ENO_CSRF_TOKEN"),
    });

    inner.faults.get(&route).map(|fault| {
        let status =
            StatusCode::from_u16(fault.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &fault.body {
            Some(body) => (status, Json(body.clone())).into_response(),
            None => reject(status, "injected failure"),
        }
    })
}

/// Session cookie and security context checks shared by protected routes.
fn authorize(inner: &Inner, headers: &HeaderMap, require_context: bool) -> Option<Response> {
    let live = session_cookie(headers).is_some_and(|id| inner.sessions.contains(&id));
    if !live {
        return Some(reject(StatusCode::UNAUTHORIZED, "no valid session"));
    }
    if require_context
        && header_str(headers, "SecurityContext").as_deref()
            != Some(inner.config.security_context().as_str())
    {
        return Some(reject(StatusCode::FORBIDDEN, "missing or wrong SecurityContext"));
    }
    None
}

// ---------------------------------------------------------------------------
// 3DPassport
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct BatchTicketQuery {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    service: Option<String>,
}

/// `GET /3dpassport/api/v2/batch/ticket`
pub(crate) async fn batch_ticket(
    State(mock): State<Mock3dx>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<BatchTicketQuery>,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Tgt, &uri, &headers) {
        return resp;
    }

    let name_ok = header_str(&headers, "DS-SERVICE-NAME").as_deref()
        == Some(inner.config.service_name.as_str());
    let secret_ok = header_str(&headers, "DS-SERVICE-SECRET").as_deref()
        == Some(inner.config.service_secret.as_str());
    if !(name_ok && secret_ok) {
        return reject(StatusCode::UNAUTHORIZED, "invalid batch service credentials");
    }
    if query.identifier.as_deref() != Some(inner.config.user.as_str()) {
        return reject(StatusCode::FORBIDDEN, "unknown identifier");
    }
    if query.service.as_deref().is_none_or(str::is_empty) {
        return reject(StatusCode::BAD_REQUEST, "missing service");
    }

    let tgt = inner
        .config
        .tgt
        .clone()
        .unwrap_or_else(|| fresh_token("TGT"));
    inner.tgts.insert(tgt.clone());
    Json(AccessTokenResponse::new(tgt)).into_response()
}

#[derive(Deserialize)]
pub(crate) struct TransientQuery {
    #[serde(default)]
    tgt: Option<String>,
    #[serde(default)]
    service: Option<String>,
}

/// `GET /3dpassport/api/login/cas/transient`
pub(crate) async fn cas_transient(
    State(mock): State<Mock3dx>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<TransientQuery>,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::ServiceTicket, &uri, &headers) {
        return resp;
    }

    let Some(tgt) = query.tgt else {
        return reject(StatusCode::BAD_REQUEST, "missing tgt");
    };
    if !inner.tgts.remove(&tgt) {
        return reject(StatusCode::UNAUTHORIZED, "unknown or used TGT");
    }
    if query.service.as_deref().is_none_or(str::is_empty) {
        return reject(StatusCode::BAD_REQUEST, "missing service");
    }

    let st = inner
        .config
        .service_ticket
        .clone()
        .unwrap_or_else(|| fresh_token("ST"));
    inner.service_tickets.insert(st.clone());
    Json(AccessTokenResponse::new(st)).into_response()
}

// ---------------------------------------------------------------------------
// 3DSpace
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct SessionQuery {
    #[serde(default)]
    ticket: Option<String>,
}

/// `GET /3dspace/?ticket=`
pub(crate) async fn establish_session(
    State(mock): State<Mock3dx>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Session, &uri, &headers) {
        return resp;
    }

    let redeemed = query
        .ticket
        .is_some_and(|st| inner.service_tickets.remove(&st));
    if !redeemed {
        return reject(StatusCode::UNAUTHORIZED, "unknown or used service ticket");
    }

    let session = uuid::Uuid::new_v4().simple().to_string();
    inner.sessions.insert(session.clone());
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly"),
        )],
        "OK",
    )
        .into_response()
}

/// `GET /3dspace/resources/modeler/pno/person?current=true&select=preferredcredentials`
pub(crate) async fn current_person(
    State(mock): State<Mock3dx>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Person, &uri, &headers) {
        return resp;
    }
    if let Some(resp) = authorize(&inner, &headers, false) {
        return resp;
    }

    let config = &inner.config;
    Json(PersonResponse {
        preferredcredentials: PreferredCredentials {
            role: NamedRef::new(&config.role),
            organization: NamedRef::new(&config.organization),
            collabspace: NamedRef::new(&config.collabspace),
        },
    })
    .into_response()
}

/// `GET /3dspace/resources/v1/modeler/documents/{doc_id}`
pub(crate) async fn get_document(
    State(mock): State<Mock3dx>,
    Path(doc_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Document, &uri, &headers) {
        return resp;
    }
    if let Some(resp) = authorize(&inner, &headers, true) {
        return resp;
    }
    if !inner.config.has_document(&doc_id) {
        return reject(StatusCode::NOT_FOUND, "document not found");
    }

    let data = json!([{ "id": doc_id, "type": "Document" }]);
    if inner.config.omit_csrf {
        return Json(DocumentResponse { csrf: None, data }).into_response();
    }

    let token = inner
        .config
        .csrf
        .clone()
        .unwrap_or_else(|| fresh_token("CSRF"));
    inner.csrf_tokens.insert(token.clone(), doc_id);
    Json(DocumentResponse {
        csrf: Some(CsrfField {
            name: Some("ENO_CSRF_TOKEN".into()),
            value: Some(token),
        }),
        data,
    })
    .into_response()
}

/// `PUT /3dspace/resources/v1/modeler/documents/{doc_id}/files/{file_id}/DownloadTicket`
pub(crate) async fn issue_download_ticket(
    State(mock): State<Mock3dx>,
    Path((doc_id, file_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::TicketIssuance, &uri, &headers) {
        return resp;
    }
    if let Some(resp) = authorize(&inner, &headers, true) {
        return resp;
    }

    let csrf_ok = header_str(&headers, "ENO_CSRF_TOKEN")
        .and_then(|token| inner.csrf_tokens.remove(&token))
        .is_some_and(|issued_for| issued_for == doc_id);
    if !csrf_ok {
        return reject(
            StatusCode::FORBIDDEN,
            "CSRF token missing or not issued for this document",
        );
    }

    let key = (doc_id, file_id);
    if !inner.config.files.contains_key(&key) {
        return reject(StatusCode::NOT_FOUND, "file not found");
    }

    let host = header_str(&headers, "host").unwrap_or_else(|| "127.0.0.1".into());
    let scheme = if inner.tls { "https" } else { "http" };
    let ticket = fresh_token("FCS");
    inner.download_tickets.insert(ticket.clone(), key);
    Json(TicketResponse::single(format!("{scheme}://{host}/fcs/{ticket}"))).into_response()
}

// ---------------------------------------------------------------------------
// File collaboration server
// ---------------------------------------------------------------------------

/// `GET /fcs/{ticket}`: 302 to the object URL.
pub(crate) async fn redeem_ticket(
    State(mock): State<Mock3dx>,
    Path(ticket): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Redemption, &uri, &headers) {
        return resp;
    }
    if !inner.download_tickets.contains_key(&ticket) {
        return reject(StatusCode::NOT_FOUND, "unknown or used download ticket");
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/fcs/objects/{ticket}"))],
    )
        .into_response()
}

/// `GET /fcs/objects/{ticket}`: serves the bytes once.
pub(crate) async fn fetch_object(
    State(mock): State<Mock3dx>,
    Path(ticket): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut inner = mock.lock();
    if let Some(resp) = begin(&mut inner, Route::Object, &uri, &headers) {
        return resp;
    }
    let Some(key) = inner.download_tickets.remove(&ticket) else {
        return reject(StatusCode::NOT_FOUND, "unknown or used download ticket");
    };
    let bytes = inner.config.files.get(&key).cloned().unwrap_or_default();
    let body = if inner.config.truncate_objects {
        let head = Bytes::copy_from_slice(&bytes[..bytes.len() / 2]);
        Body::from_stream(futures::stream::iter([
            Ok(head),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "object stream cut",
            )),
        ]))
    } else {
        Body::from(bytes)
    };
    ([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response()
}
