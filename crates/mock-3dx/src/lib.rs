//! Mock 3DEXPERIENCE platform.
//!
//! Emulates the subset of 3DPassport and 3DSpace used by the session client:
//!
//! ```text
//! GET  /3dpassport/api/v2/batch/ticket            → {"access_token": TGT}
//! GET  /3dpassport/api/login/cas/transient        → {"access_token": ST}
//! GET  /3dspace/?ticket=ST                        → Set-Cookie: JSESSIONID
//! GET  /3dspace/resources/modeler/pno/person      → preferredcredentials
//! GET  /3dspace/resources/v1/modeler/documents/{doc}
//! PUT  /3dspace/resources/v1/modeler/documents/{doc}/files/{file}/DownloadTicket
//! GET  /fcs/{ticket}                              → 302 /fcs/objects/{ticket}
//! GET  /fcs/objects/{ticket}                      → file bytes
//! ```
//!
//! Tests start it with [`spawn`] on an ephemeral port and inspect the
//! [`Mock3dx::journal`] afterwards. [`spawn_tls`] serves the same routes over
//! HTTPS with a freshly generated self-signed certificate.

mod handlers;
mod state;

use std::io;

use axum::routing::{get, put};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use handlers::SESSION_COOKIE;
pub use state::{Call, Mock3dx, MockConfig, Route};

/// Build the router for `mock`.
pub fn router(mock: Mock3dx) -> Router {
    Router::new()
        .route("/3dpassport/api/v2/batch/ticket", get(handlers::batch_ticket))
        .route("/3dpassport/api/login/cas/transient", get(handlers::cas_transient))
        .route("/3dspace/", get(handlers::establish_session))
        .route(
            "/3dspace/resources/modeler/pno/person",
            get(handlers::current_person),
        )
        .route(
            "/3dspace/resources/v1/modeler/documents/{doc_id}",
            get(handlers::get_document),
        )
        .route(
            "/3dspace/resources/v1/modeler/documents/{doc_id}/files/{file_id}/DownloadTicket",
            put(handlers::issue_download_ticket),
        )
        .route("/fcs/{ticket}", get(handlers::redeem_ticket))
        .route("/fcs/objects/{ticket}", get(handlers::fetch_object))
        .with_state(mock)
}

/// A mock served on a local port. The server stops when this is dropped.
pub struct RunningMock {
    /// Platform base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Handle for fault injection and journal inspection.
    pub mock: Mock3dx,
    task: JoinHandle<()>,
}

impl Drop for RunningMock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve a mock built from `config` on `127.0.0.1` with an ephemeral port.
pub async fn spawn(config: MockConfig) -> io::Result<RunningMock> {
    spawn_on("127.0.0.1:0", config).await
}

/// Serve a mock built from `config` on `addr`.
pub async fn spawn_on(addr: &str, config: MockConfig) -> io::Result<RunningMock> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let mock = Mock3dx::new(config);
    let app = router(mock.clone());

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "mock-3dx server stopped");
        }
    });

    Ok(RunningMock {
        base_url: format!("http://{local}"),
        mock,
        task,
    })
}

/// Serve a mock over HTTPS on `127.0.0.1` with an ephemeral port.
///
/// The certificate is self-signed for `localhost` and `127.0.0.1`, so a client
/// only gets through with certificate verification turned off.
pub async fn spawn_tls(config: MockConfig) -> io::Result<RunningMock> {
    let names = vec!["localhost".to_string(), "127.0.0.1".to_string()];
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(names).map_err(io::Error::other)?;
    let tls = RustlsConfig::from_pem(
        cert.pem().into_bytes(),
        key_pair.serialize_pem().into_bytes(),
    )
    .await?;

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let local = listener.local_addr()?;
    let mock = Mock3dx::new(config);
    mock.lock().tls = true;
    let app = router(mock.clone());

    let server = axum_server::from_tcp_rustls(listener, tls);
    let task = tokio::spawn(async move {
        if let Err(e) = server.serve(app.into_make_service()).await {
            tracing::error!(error = %e, "mock-3dx TLS server stopped");
        }
    });

    Ok(RunningMock {
        base_url: format!("https://{local}"),
        mock,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_binds_ephemeral_port() {
        let running = spawn(MockConfig::default()).await.expect("spawn mock");
        assert!(running.base_url.starts_with("http://127.0.0.1:"));
        assert!(!running.base_url.ends_with(":0"));
        assert!(running.mock.journal().is_empty());
    }

    #[test]
    fn config_with_file() {
        let config = MockConfig::default().with_file("doc1", "file1", vec![1, 2]);
        assert!(config.has_document("doc1"));
        assert!(!config.has_document("doc2"));
        assert_eq!(config.security_context(), "Eng.ACME.Space1");
    }

    #[test]
    fn fault_injection_is_recorded() {
        let mock = Mock3dx::new(MockConfig::default());
        mock.fail(Route::TicketIssuance, 403);
        assert_eq!(
            mock.lock().faults.get(&Route::TicketIssuance).map(|f| f.status),
            Some(403)
        );
        mock.clear_fault(Route::TicketIssuance);
        assert!(mock.lock().faults.is_empty());
    }

    #[tokio::test]
    async fn canned_response_replaces_handler() {
        let running = spawn(MockConfig::default()).await.expect("spawn mock");
        running
            .mock
            .respond_with(Route::Tgt, 200, serde_json::json!({ "token_type": "none" }));

        let body: serde_json::Value = reqwest::get(format!(
            "{}/3dpassport/api/v2/batch/ticket",
            running.base_url
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(body, serde_json::json!({ "token_type": "none" }));
        assert_eq!(running.mock.count(Route::Tgt), 1);
    }

    #[tokio::test]
    async fn ticket_redemption_answers_302() {
        let running = spawn(MockConfig::default()).await.expect("spawn mock");
        running
            .mock
            .lock()
            .download_tickets
            .insert("FCS-1".into(), ("doc1".into(), "file1".into()));
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let resp = client
            .get(format!("{}/fcs/FCS-1", running.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::FOUND);
        assert_eq!(resp.headers()["location"], "/fcs/objects/FCS-1");
    }

    #[tokio::test]
    async fn tls_mock_uses_https_urls() {
        let running = spawn_tls(MockConfig::default()).await.expect("spawn TLS mock");
        assert!(running.base_url.starts_with("https://127.0.0.1:"));
        assert!(running.mock.lock().tls);
    }
}
