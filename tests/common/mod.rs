//! Shared helpers for integration tests
//!
//! Spins up the real axum server on an ephemeral port, backed by scripted
//! engines, and hands tests a base URL plus handles to every engine the
//! factory produced.

use std::sync::{Arc, Mutex};

use fastgtp::server;
use fastgtp::session::SessionManager;
use fastgtp::transport::scripted::ScriptedTransport;
use fastgtp::transport::GtpTransport;

pub struct TestServer {
    pub base_url: String,
    pub manager: Arc<SessionManager>,
    engines: Arc<Mutex<Vec<Arc<ScriptedTransport>>>>,
}

impl TestServer {
    /// The engine created for the most recently opened session.
    pub fn latest_engine(&self) -> Arc<ScriptedTransport> {
        self.engines
            .lock()
            .expect("engine list lock")
            .last()
            .cloned()
            .expect("no session has been opened yet")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start a server whose sessions are backed by scripted engines.
///
/// `echo` selects echoing engines (reply `= <command>`) over plain ones
/// (reply `=` once their scripted queue runs dry).
pub async fn spawn_server(echo: bool) -> TestServer {
    let engines: Arc<Mutex<Vec<Arc<ScriptedTransport>>>> = Arc::new(Mutex::new(Vec::new()));

    let factory_engines = Arc::clone(&engines);
    let manager = Arc::new(SessionManager::new(move || {
        let engine = Arc::new(if echo {
            ScriptedTransport::echo()
        } else {
            ScriptedTransport::new()
        });
        factory_engines
            .lock()
            .expect("engine list lock")
            .push(Arc::clone(&engine));
        let transport: Arc<dyn GtpTransport> = engine;
        Ok(transport)
    }));

    let app = server::build_router(Arc::clone(&manager));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server task");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        manager,
        engines,
    }
}

/// Open a session over HTTP and return its ID.
pub async fn open_session(client: &reqwest::Client, server: &TestServer) -> String {
    let response = client
        .post(server.url("/open_session"))
        .send()
        .await
        .expect("open_session request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("open_session body");
    body["session_id"]
        .as_str()
        .expect("session_id field")
        .to_string()
}
